use async_trait::async_trait;
use chrono::{Days, Local};
use std::time::Duration;
use tokio::time::sleep;

use crate::{CitySuggestion, ForecastDay, WeatherReading, WeatherResult};

use super::{ClientMode, MAX_FORECAST_DAYS, MAX_SUGGESTIONS, WeatherClient};

pub const DEFAULT_DEMO_LATENCY: Duration = Duration::from_millis(500);
pub const SUGGESTION_LATENCY: Duration = Duration::from_millis(300);

const DEMO_CITIES: [(&str, &str, &str, f64, f64); 8] = [
    ("London", "GB", "", 51.5074, -0.1278),
    ("New York", "US", "NY", 40.7128, -74.0060),
    ("Tokyo", "JP", "", 35.6762, 139.6503),
    ("Paris", "FR", "", 48.8566, 2.3522),
    ("Sydney", "AU", "", -33.8688, 151.2093),
    ("Dubai", "AE", "", 25.2048, 55.2708),
    ("Singapore", "SG", "", 1.3521, 103.8198),
    ("Colombo", "LK", "", 6.9271, 79.8612),
];

const CONDITIONS: [(&str, &str); 4] =
    [("sunny", "01d"), ("partly cloudy", "02d"), ("cloudy", "03d"), ("rainy", "10d")];

/// Offline client returning synthetic data after a simulated delay.
#[derive(Debug, Clone)]
pub struct DemoClient {
    latency: Duration,
}

impl DemoClient {
    pub fn new() -> Self {
        Self::with_latency(DEFAULT_DEMO_LATENCY)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for DemoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable per-city, per-day variation so repeated demo lookups agree.
fn spread(city: &str, day: u64) -> u64 {
    city.to_lowercase()
        .bytes()
        .fold(day.wrapping_mul(2_654_435_761), |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

#[async_trait]
impl WeatherClient for DemoClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Demo
    }

    async fn current_weather(&self, city: &str) -> WeatherResult<WeatherReading> {
        sleep(self.latency).await;

        Ok(WeatherReading {
            city: city.trim().to_string(),
            country: "DEMO".to_string(),
            temperature_c: 22,
            feels_like_c: 20,
            description: "partly cloudy".to_string(),
            icon_id: "02d".to_string(),
            humidity_pct: 65,
            wind_speed_mps: 3.5,
            pressure_hpa: 1013,
            visibility_km: 10.0,
            uv_index: Some(5),
        })
    }

    async fn forecast(&self, city: &str) -> WeatherResult<Vec<ForecastDay>> {
        sleep(self.latency).await;

        let today = Local::now().date_naive();

        Ok((1..=MAX_FORECAST_DAYS as u64)
            .filter_map(|offset| {
                let date = today.checked_add_days(Days::new(offset))?;
                let seed = spread(city, offset);
                let (description, icon) = CONDITIONS[(seed % 4) as usize];

                Some(ForecastDay {
                    date,
                    temperature_c: 18 + (seed % 11) as i32,
                    description: description.to_string(),
                    icon_id: icon.to_string(),
                    humidity_pct: 50 + (seed % 31) as u8,
                    wind_speed_mps: (seed % 50) as f64 / 10.0,
                })
            })
            .collect())
    }

    async fn search_cities(&self, query: &str) -> Vec<CitySuggestion> {
        sleep(SUGGESTION_LATENCY).await;

        let needle = query.trim().to_lowercase();

        DEMO_CITIES
            .iter()
            .filter(|(name, ..)| name.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .map(|&(name, country, state, latitude, longitude)| CitySuggestion {
                name: name.to_string(),
                country: country.to_string(),
                state: state.to_string(),
                latitude,
                longitude,
            })
            .collect()
    }
}
