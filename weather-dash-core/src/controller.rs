use std::{collections::HashSet, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use crate::{
    Presenter, RecentSearches, Severity, WeatherError, WeatherReading, WeatherResult,
    client::{
        ClientMode, WeatherClient,
        live::{DEFAULT_REQUEST_TIMEOUT, LiveClient},
    },
    debounce::Debouncer,
    storage::{KeyValueStore, VISITED_KEY},
};

/// Quiet period before a query change turns into a suggestion lookup.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Shorter queries never reach the geocoding service.
pub const MIN_QUERY_CHARS: usize = 2;

pub const ERROR_TITLE: &str = "Unable to fetch weather data";

const WELCOME_MESSAGE: &str = "Welcome! Search for a city to get started.";
const DEMO_NOTICE: &str = "Demo Mode - Using sample data";

/// Lifecycle of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Loading,
    Success,
    Error,
}

/// Application context: wires user actions to the weather client, the
/// presenter and the recent-search history.
///
/// All mutation happens through `&mut self`, so the recent-search list has a
/// single writer.
pub struct SearchController {
    client: Arc<dyn WeatherClient>,
    presenter: Arc<dyn Presenter>,
    store: Box<dyn KeyValueStore>,
    recent: RecentSearches,
    debouncer: Debouncer,
    state: SearchState,
    displayed_city: Option<String>,
    favorites: HashSet<String>,
    request_timeout: Duration,
}

impl SearchController {
    pub fn new(
        client: Arc<dyn WeatherClient>,
        presenter: Arc<dyn Presenter>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let recent = RecentSearches::load(&*store);

        Self {
            client,
            presenter,
            store,
            recent,
            debouncer: Debouncer::new(DEBOUNCE_DELAY),
            state: SearchState::Idle,
            displayed_city: None,
            favorites: HashSet::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Timeout for live clients created by [`Self::set_credential`].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Renders initial state: recent searches, first-visit welcome, demo notice.
    pub fn start(&mut self) {
        info!(mode = %self.client.mode(), "weather dashboard started");

        self.presenter.display_recent_searches(self.recent.as_slice());

        if self.store.get(VISITED_KEY).is_none() {
            self.presenter.show_notification(WELCOME_MESSAGE, Severity::Info);
            if let Err(err) = self.store.set(VISITED_KEY, "true") {
                warn!("failed to record first visit: {err:#}");
            }
        }

        if self.client.mode() == ClientMode::Demo {
            self.presenter.show_notification(DEMO_NOTICE, Severity::Info);
        }

        self.presenter.focus_search();
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn mode(&self) -> ClientMode {
        self.client.mode()
    }

    pub fn recent_searches(&self) -> &[String] {
        self.recent.as_slice()
    }

    pub fn displayed_city(&self) -> Option<&str> {
        self.displayed_city.as_deref()
    }

    pub fn is_favorite(&self, city: &str) -> bool {
        self.favorites.contains(&city.to_lowercase())
    }

    /// Any finished submission returns to idle on the next user action.
    fn settle(&mut self) {
        if matches!(self.state, SearchState::Success | SearchState::Error) {
            self.state = SearchState::Idle;
        }
    }

    /// Handles an edit of the search box.
    ///
    /// Restarts the debounce window; the lookup runs after [`DEBOUNCE_DELAY`]
    /// of quiet, and only for queries of at least [`MIN_QUERY_CHARS`].
    pub fn on_query_changed(&mut self, query: &str) {
        self.settle();
        self.debouncer.cancel();

        let query = query.trim().to_string();
        if query.is_empty() {
            self.presenter.clear_suggestions();
            return;
        }

        let client = Arc::clone(&self.client);
        let presenter = Arc::clone(&self.presenter);

        self.debouncer.schedule(async move {
            if query.chars().count() < MIN_QUERY_CHARS {
                return;
            }

            debug!(%query, "fetching city suggestions");
            let cities = client.search_cities(&query).await;
            presenter.display_suggestions(&cities);
        });
    }

    /// Blur / click-outside: drop pending lookups and hide suggestions.
    pub fn dismiss_suggestions(&mut self) {
        self.debouncer.cancel();
        self.presenter.clear_suggestions();
    }

    /// Submits whatever the search box currently holds.
    pub async fn submit_current_input(&mut self) -> WeatherResult<WeatherReading> {
        let city = self.presenter.search_value();
        self.submit_search(&city).await
    }

    /// Fetches current weather and forecast for `city` and renders the result.
    ///
    /// Both lookups run concurrently and the pair succeeds or fails as a
    /// whole. When both fail the current-weather error is reported.
    pub async fn submit_search(&mut self, city: &str) -> WeatherResult<WeatherReading> {
        self.settle();

        let city = city.trim();
        if city.is_empty() {
            self.presenter.show_notification(&WeatherError::Validation.to_string(), Severity::Error);
            self.presenter.focus_search();
            return Err(WeatherError::Validation);
        }

        self.debouncer.cancel();
        self.presenter.clear_suggestions();
        self.state = SearchState::Loading;
        self.presenter.show_loading();

        let (current, forecast) =
            tokio::join!(self.client.current_weather(city), self.client.forecast(city));

        self.presenter.hide_loading();

        match current.and_then(|reading| forecast.map(|days| (reading, days))) {
            Ok((reading, days)) => {
                self.presenter.display_current_weather(&reading);
                self.presenter.display_forecast(&days);
                self.save_recent_search(&reading.city);
                self.presenter
                    .show_notification(&format!("Weather loaded for {}", reading.city), Severity::Success);

                self.displayed_city = Some(reading.city.clone());
                self.state = SearchState::Success;
                Ok(reading)
            }
            Err(err) => {
                error!(city, error = %err, "failed to fetch weather");
                self.presenter.show_error(ERROR_TITLE, &err.to_string());

                self.displayed_city = None;
                self.state = SearchState::Error;
                Err(err)
            }
        }
    }

    /// Picks an autocomplete entry: fill the search box and submit it.
    pub async fn select_suggestion(&mut self, city: &str) -> WeatherResult<WeatherReading> {
        self.presenter.set_search_value(city);
        self.presenter.clear_suggestions();
        self.submit_search(city).await
    }

    /// Re-runs a search from the recent-search list.
    pub async fn select_recent(&mut self, city: &str) -> WeatherResult<WeatherReading> {
        self.presenter.set_search_value(city);
        self.submit_search(city).await
    }

    /// Error-panel retry: clear the error and hand focus back to the input.
    pub fn retry(&mut self) {
        self.settle();
        self.presenter.hide_error();
        self.presenter.focus_search();
    }

    pub fn save_recent_search(&mut self, city: &str) {
        self.recent.insert(city);
        self.persist_recent();
        self.presenter.display_recent_searches(self.recent.as_slice());
    }

    pub fn remove_recent_search(&mut self, city: &str) {
        self.settle();
        self.recent.remove(city);
        self.persist_recent();
        self.presenter.display_recent_searches(self.recent.as_slice());
        self.presenter
            .show_notification(&format!("Removed \"{city}\" from recent searches"), Severity::Info);
    }

    fn persist_recent(&mut self) {
        if let Err(err) = self.recent.save(&mut *self.store) {
            warn!("failed to persist recent searches: {err:#}");
        }
    }

    /// Swaps in a live client using `api_key`; applies from the next lookup.
    pub fn set_credential(&mut self, api_key: &str) -> anyhow::Result<()> {
        let api_key = api_key.trim();
        anyhow::ensure!(!api_key.is_empty(), "API key must not be empty");

        let client = LiveClient::with_timeout(api_key.to_string(), self.request_timeout)?;
        self.replace_client(Arc::new(client));
        self.presenter.show_notification("API key configured successfully", Severity::Success);
        Ok(())
    }

    pub fn replace_client(&mut self, client: Arc<dyn WeatherClient>) {
        debug!(mode = %client.mode(), "weather client replaced");
        self.client = client;
    }

    /// Toggles the displayed city in the session favorites.
    ///
    /// Returns the new membership, or `None` when nothing is displayed.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        self.settle();
        let city = self.displayed_city.clone()?;
        let key = city.to_lowercase();

        if self.favorites.remove(&key) {
            self.presenter.show_notification(&format!("Removed {city} from favorites"), Severity::Info);
            Some(false)
        } else {
            self.favorites.insert(key);
            self.presenter.show_notification(&format!("Added {city} to favorites"), Severity::Success);
            Some(true)
        }
    }
}
