use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    CitySuggestion, ForecastDay, WeatherError, WeatherReading, WeatherResult,
    model::round_degrees,
};

use super::{ClientMode, MAX_FORECAST_DAYS, MAX_SUGGESTIONS, WeatherClient};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Base URLs of the OpenWeatherMap data and geocoding APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub data_url: String,
    pub geo_url: String,
}

impl Endpoints {
    /// Both APIs rooted at `base`, e.g. a local mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            data_url: format!("{base}/data/2.5"),
            geo_url: format!("{base}/geo/1.0"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_base("https://api.openweathermap.org")
    }
}

/// Client for the OpenWeatherMap HTTP API.
#[derive(Clone)]
pub struct LiveClient {
    api_key: String,
    endpoints: Endpoints,
    timeout: Duration,
    http: Client,
}

impl std::fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClient")
            .field("api_key", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LiveClient {
    pub fn with_timeout(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_options(api_key, Endpoints::default(), timeout)
    }

    pub fn with_options(
        api_key: String,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, endpoints, timeout, http })
    }

    /// Issues a GET and returns the status with the raw body.
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> WeatherResult<(StatusCode, String)> {
        debug!(url, "sending weather service request");

        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            debug!(url, status = status.as_u16(), body = %truncate_body(&body), "weather service returned an error");
        }

        Ok((status, body))
    }

    async fn fetch_cities(&self, query: &str) -> WeatherResult<Vec<CitySuggestion>> {
        let url = format!("{}/direct", self.endpoints.geo_url);
        let limit = MAX_SUGGESTIONS.to_string();

        let (status, body) = self.fetch(&url, &[("q", query), ("limit", limit.as_str())]).await?;

        if !status.is_success() {
            return Err(WeatherError::Service { context: "city suggestions", status: status.as_u16() });
        }

        let parsed: Vec<OwGeoEntry> = serde_json::from_str(&body).map_err(WeatherError::Decode)?;

        Ok(parsed
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|city| CitySuggestion {
                name: city.name,
                country: city.country,
                state: city.state.unwrap_or_default(),
                latitude: city.lat,
                longitude: city.lon,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    /// Metres.
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift from UTC in seconds.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

impl From<OwCurrentResponse> for WeatherReading {
    fn from(raw: OwCurrentResponse) -> Self {
        let (description, icon_id) = condition(&raw.weather);

        WeatherReading {
            city: raw.name,
            country: raw.sys.country,
            temperature_c: round_degrees(raw.main.temp),
            feels_like_c: round_degrees(raw.main.feels_like),
            description,
            icon_id,
            humidity_pct: raw.main.humidity,
            wind_speed_mps: raw.wind.speed,
            pressure_hpa: raw.main.pressure,
            visibility_km: raw.visibility.unwrap_or(0.0) / 1000.0,
            uv_index: None,
        }
    }
}

/// Keeps the first sample of each calendar date (in `offset`), oldest first,
/// until `MAX_FORECAST_DAYS` dates are collected.
fn collapse_daily(entries: &[OwForecastEntry], offset: FixedOffset) -> Vec<ForecastDay> {
    let mut ordered: Vec<&OwForecastEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.dt);

    let mut days: Vec<ForecastDay> = Vec::with_capacity(MAX_FORECAST_DAYS);

    for entry in ordered {
        let Some(at) = DateTime::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let date = at.with_timezone(&offset).date_naive();

        if days.iter().any(|d| d.date == date) {
            continue;
        }

        let (description, icon_id) = condition(&entry.weather);
        days.push(ForecastDay {
            date,
            temperature_c: round_degrees(entry.main.temp),
            description,
            icon_id,
            humidity_pct: entry.main.humidity,
            wind_speed_mps: entry.wind.speed,
        });

        if days.len() == MAX_FORECAST_DAYS {
            break;
        }
    }

    days
}

fn utc_offset(city: Option<&OwCity>) -> FixedOffset {
    city.and_then(|c| c.timezone)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

#[async_trait]
impl WeatherClient for LiveClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Live
    }

    async fn current_weather(&self, city: &str) -> WeatherResult<WeatherReading> {
        let url = format!("{}/weather", self.endpoints.data_url);

        let (status, body) = self.fetch(&url, &[("q", city), ("units", "metric")]).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(WeatherError::Unauthorized);
        }
        if !status.is_success() {
            return Err(WeatherError::Service { context: "weather data", status: status.as_u16() });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(WeatherError::Decode)?;

        Ok(parsed.into())
    }

    async fn forecast(&self, city: &str) -> WeatherResult<Vec<ForecastDay>> {
        let url = format!("{}/forecast", self.endpoints.data_url);

        let (status, body) = self.fetch(&url, &[("q", city), ("units", "metric")]).await?;

        if !status.is_success() {
            return Err(WeatherError::Service { context: "forecast data", status: status.as_u16() });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(WeatherError::Decode)?;

        Ok(collapse_daily(&parsed.list, utc_offset(parsed.city.as_ref())))
    }

    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion> {
        match self.fetch_cities(query).await {
            Ok(cities) => cities,
            Err(err) => {
                warn!(query, error = %err, "city suggestion lookup failed");
                Vec::new()
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn client_for(server: &MockServer) -> LiveClient {
        LiveClient::with_options(
            "TEST_KEY".to_string(),
            Endpoints::with_base(&server.uri()),
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    fn sample(dt: i64, temp: f64, description: &str) -> serde_json::Value {
        json!({
            "dt": dt,
            "main": { "temp": temp, "feels_like": temp - 1.0, "humidity": 70, "pressure": 1010 },
            "weather": [{ "description": description, "icon": "04d" }],
            "wind": { "speed": 3.2 }
        })
    }

    #[tokio::test]
    async fn current_weather_normalizes_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "london"))
            .and(query_param("appid", "TEST_KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "London",
                "sys": { "country": "GB" },
                "main": { "temp": 14.6, "feels_like": 13.4, "humidity": 81, "pressure": 1012 },
                "weather": [{ "description": "light rain", "icon": "10d" }],
                "wind": { "speed": 4.12 },
                "visibility": 9000
            })))
            .mount(&server)
            .await;

        let reading = client_for(&server).current_weather("london").await.expect("should succeed");

        assert_eq!(reading.city, "London");
        assert_eq!(reading.country, "GB");
        assert_eq!(reading.temperature_c, 15);
        assert_eq!(reading.feels_like_c, 13);
        assert_eq!(reading.description, "light rain");
        assert_eq!(reading.icon_url(), "https://openweathermap.org/img/wn/10d@2x.png");
        assert_eq!(reading.humidity_pct, 81);
        assert_eq!(reading.pressure_hpa, 1012);
        assert!((reading.visibility_km - 9.0).abs() < f64::EPSILON);
        assert_eq!(reading.uv_index, None);
    }

    #[tokio::test]
    async fn current_weather_maps_status_codes() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .and(query_param("q", "Nowhere"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"cod":"404"}"#))
            .mount(&server)
            .await;
        Mock::given(path("/data/2.5/weather"))
            .and(query_param("q", "Locked"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/data/2.5/weather"))
            .and(query_param("q", "Broken"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let err = client.current_weather("Nowhere").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound));

        let err = client.current_weather("Locked").await.unwrap_err();
        assert!(matches!(err, WeatherError::Unauthorized));

        let err = client.current_weather("Broken").await.unwrap_err();
        assert_eq!(err.to_string(), "Error fetching weather data (502)");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).current_weather("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let client = LiveClient::with_options(
            "TEST_KEY".to_string(),
            Endpoints::with_base("http://127.0.0.1:1"),
            Duration::from_secs(1),
        )
        .expect("client should build");

        let err = client.current_weather("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
        assert_eq!(err.to_string(), "Please check your internet connection and try again.");

        let err = client.forecast("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
    }

    #[tokio::test]
    async fn forecast_collapses_to_one_sample_per_day() {
        // 2024-03-01T00:00:00Z
        let day0 = 1_709_251_200;
        let list: Vec<_> = (0..40).map(|i| sample(day0 + i * 3 * 3600, 10.0 + i as f64 * 0.1, "clouds")).collect();

        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "city": { "name": "London", "timezone": 0 }, "list": list })),
            )
            .mount(&server)
            .await;

        let days = client_for(&server).forecast("London").await.expect("should succeed");

        assert_eq!(days.len(), 5);
        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(dates[4], NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        // First sample of the second day is index 8: 10.0 + 0.8
        assert_eq!(days[1].temperature_c, 11);
    }

    #[tokio::test]
    async fn forecast_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).forecast("Nowhere").await.unwrap_err();
        assert_eq!(err.to_string(), "Error fetching forecast data (404)");
    }

    #[tokio::test]
    async fn search_cities_caps_results_and_fills_missing_state() {
        let cities: Vec<_> = (0..7)
            .map(|i| json!({ "name": format!("Springfield {i}"), "country": "US", "lat": 39.8, "lon": -89.6 }))
            .collect();

        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .and(query_param("q", "Spring"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(cities)))
            .mount(&server)
            .await;

        let found = client_for(&server).search_cities("Spring").await;

        assert_eq!(found.len(), 5);
        assert_eq!(found[0].name, "Springfield 0");
        assert!(found[0].state.is_empty());
    }

    #[tokio::test]
    async fn search_cities_swallows_service_errors() {
        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(client_for(&server).search_cities("Lon").await.is_empty());
    }

    #[tokio::test]
    async fn search_cities_swallows_transport_failures() {
        let client = LiveClient::with_options(
            "TEST_KEY".to_string(),
            Endpoints::with_base("http://127.0.0.1:1"),
            Duration::from_secs(1),
        )
        .expect("client should build");

        assert!(client.search_cities("Lon").await.is_empty());
    }

    #[test]
    fn collapse_uses_city_offset_for_dates() {
        // 2024-03-01T22:00:00Z is already 2024-03-02 at UTC+3
        let entries: Vec<OwForecastEntry> =
            serde_json::from_value(json!([sample(1_709_330_400, 5.0, "clear")])).unwrap();

        let utc = collapse_daily(&entries, FixedOffset::east_opt(0).unwrap());
        let plus3 = collapse_daily(&entries, FixedOffset::east_opt(3 * 3600).unwrap());

        assert_eq!(utc[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(plus3[0].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn collapse_orders_unsorted_samples() {
        let entries: Vec<OwForecastEntry> = serde_json::from_value(json!([
            sample(1_709_424_000, 7.0, "rain"),
            sample(1_709_251_200, 5.0, "clear"),
            sample(1_709_337_600, 6.0, "clouds"),
        ]))
        .unwrap();

        let days = collapse_daily(&entries, FixedOffset::east_opt(0).unwrap());
        let descriptions: Vec<_> = days.iter().map(|d| d.description.as_str()).collect();
        assert_eq!(descriptions, ["clear", "clouds", "rain"]);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
