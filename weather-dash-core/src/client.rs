use crate::{
    Config, CitySuggestion, ForecastDay, WeatherReading, WeatherResult,
    client::{demo::DemoClient, live::LiveClient},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod demo;
pub mod live;

/// Forecast lookups collapse to at most this many calendar days.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Geocoding lookups return at most this many suggestions.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientMode {
    Live,
    Demo,
}

impl ClientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::Live => "live",
            ClientMode::Demo => "demo",
        }
    }
}

impl std::fmt::Display for ClientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of weather data. Live and demo implementations are interchangeable.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    fn mode(&self) -> ClientMode;

    async fn current_weather(&self, city: &str) -> WeatherResult<WeatherReading>;

    async fn forecast(&self, city: &str) -> WeatherResult<Vec<ForecastDay>>;

    /// Best effort: any failure yields an empty list.
    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion>;
}

/// Construct a client from config: live when an API key is present, demo otherwise.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherClient>> {
    let client: Arc<dyn WeatherClient> = match config.api_key() {
        Some(key) => Arc::new(LiveClient::with_timeout(key.to_owned(), config.request_timeout())?),
        None => Arc::new(DemoClient::with_latency(config.demo_latency())),
    };

    Ok(client)
}
