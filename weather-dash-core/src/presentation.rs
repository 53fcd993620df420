use crate::{CitySuggestion, ForecastDay, Severity, WeatherReading};

/// Rendering surface driven by [`SearchController`](crate::SearchController).
///
/// Implementations own every detail of how state is shown. Methods take
/// `&self` because debounced suggestion fetches render from a spawned task.
pub trait Presenter: Send + Sync {
    fn show_loading(&self);
    fn hide_loading(&self);

    fn display_current_weather(&self, reading: &WeatherReading);
    fn display_forecast(&self, days: &[ForecastDay]);

    fn display_suggestions(&self, cities: &[CitySuggestion]);
    fn clear_suggestions(&self);

    fn display_recent_searches(&self, cities: &[String]);

    fn show_error(&self, title: &str, message: &str);
    fn hide_error(&self);

    fn show_notification(&self, message: &str, severity: Severity);

    fn search_value(&self) -> String;
    fn set_search_value(&self, value: &str);
    fn focus_search(&self);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        ShowLoading,
        HideLoading,
        CurrentWeather(String),
        Forecast(usize),
        Suggestions(Vec<String>),
        ClearSuggestions,
        RecentSearches(Vec<String>),
        Error { title: String, message: String },
        HideError,
        Notification(String, Severity),
        SetSearchValue(String),
        FocusSearch,
    }

    /// Presenter that records every call for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        events: Mutex<Vec<Event>>,
        search_value: Mutex<String>,
    }

    impl RecordingPresenter {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn take_events(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        pub fn suggestion_batches(&self) -> Vec<Vec<String>> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Suggestions(names) => Some(names),
                    _ => None,
                })
                .collect()
        }

        pub fn notifications(&self) -> Vec<(String, Severity)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Notification(msg, severity) => Some((msg, severity)),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_loading(&self) {
            self.push(Event::ShowLoading);
        }

        fn hide_loading(&self) {
            self.push(Event::HideLoading);
        }

        fn display_current_weather(&self, reading: &WeatherReading) {
            self.push(Event::CurrentWeather(reading.city.clone()));
        }

        fn display_forecast(&self, days: &[ForecastDay]) {
            self.push(Event::Forecast(days.len()));
        }

        fn display_suggestions(&self, cities: &[CitySuggestion]) {
            self.push(Event::Suggestions(cities.iter().map(|c| c.name.clone()).collect()));
        }

        fn clear_suggestions(&self) {
            self.push(Event::ClearSuggestions);
        }

        fn display_recent_searches(&self, cities: &[String]) {
            self.push(Event::RecentSearches(cities.to_vec()));
        }

        fn show_error(&self, title: &str, message: &str) {
            self.push(Event::Error { title: title.to_string(), message: message.to_string() });
        }

        fn hide_error(&self) {
            self.push(Event::HideError);
        }

        fn show_notification(&self, message: &str, severity: Severity) {
            self.push(Event::Notification(message.to_string(), severity));
        }

        fn search_value(&self) -> String {
            self.search_value.lock().unwrap().clone()
        }

        fn set_search_value(&self, value: &str) {
            *self.search_value.lock().unwrap() = value.to_string();
            self.push(Event::SetSearchValue(value.to_string()));
        }

        fn focus_search(&self) {
            self.push(Event::FocusSearch);
        }
    }
}
