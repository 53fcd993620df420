use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const ICON_URL: &str = "https://openweathermap.org/img/wn";

/// Image URL for a provider icon id such as `"02d"`.
pub fn icon_url(icon_id: &str) -> String {
    format!("{ICON_URL}/{icon_id}@2x.png")
}

/// Rounds half-up to the nearest whole degree (`-2.5` becomes `-2`).
pub(crate) fn round_degrees(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Current conditions for one city, normalized from a provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    pub country: String,
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub description: String,
    pub icon_id: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub pressure_hpa: u32,
    pub visibility_km: f64,
    pub uv_index: Option<u8>,
}

impl WeatherReading {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon_id)
    }
}

/// One day of the five-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub description: String,
    pub icon_id: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

impl ForecastDay {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon_id)
    }
}

/// Autocomplete entry returned by a geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    /// Empty when the provider reports no state/region.
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CitySuggestion {
    /// "Name, State, Country", or "Name, Country" when there is no state.
    pub fn display_name(&self) -> String {
        if self.state.is_empty() {
            format!("{}, {}", self.name, self.country)
        } else {
            format!("{}, {}, {}", self.name, self.state, self.country)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_url_uses_fixed_template() {
        assert_eq!(icon_url("10d"), "https://openweathermap.org/img/wn/10d@2x.png");
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_degrees(14.5), 15);
        assert_eq!(round_degrees(14.49), 14);
        assert_eq!(round_degrees(-2.5), -2);
        assert_eq!(round_degrees(-2.51), -3);
    }

    #[test]
    fn suggestion_display_name_skips_empty_state() {
        let mut city = CitySuggestion {
            name: "Portland".into(),
            country: "US".into(),
            state: "Oregon".into(),
            latitude: 45.5,
            longitude: -122.6,
        };
        assert_eq!(city.display_name(), "Portland, Oregon, US");

        city.state.clear();
        assert_eq!(city.display_name(), "Portland, US");
    }
}
