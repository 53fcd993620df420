//! Plain-text rendering of dashboard state.

use chrono::Local;
use std::{
    io::Write,
    sync::{Mutex, MutexGuard, PoisonError},
};
use weather_dash_core::{CitySuggestion, ForecastDay, Presenter, Severity, WeatherReading};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn format_reading(reading: &WeatherReading) -> String {
    let uv = reading.uv_index.map_or_else(|| "N/A".to_string(), |uv| uv.to_string());

    format!(
        "{city}, {country}\n\
         {date}\n  \
         {temp}°C  {description}\n  \
         Feels like {feels}°C | Humidity {humidity}% | Wind {wind} m/s | UV {uv}\n  \
         Pressure {pressure} hPa | Visibility {visibility} km\n  \
         Icon: {icon}",
        city = reading.city,
        country = reading.country,
        date = Local::now().format("%A, %B %-d, %Y"),
        temp = reading.temperature_c,
        description = reading.description,
        feels = reading.feels_like_c,
        humidity = reading.humidity_pct,
        wind = reading.wind_speed_mps,
        pressure = reading.pressure_hpa,
        visibility = reading.visibility_km,
        icon = reading.icon_url(),
    )
}

pub fn format_forecast(days: &[ForecastDay]) -> String {
    let mut out = String::from("Forecast");
    for day in days {
        out.push_str(&format!(
            "\n  {}  {:>3}°C  {}",
            day.date.format("%a, %b %-d"),
            day.temperature_c,
            day.description
        ));
    }
    out
}

pub fn format_suggestions(cities: &[CitySuggestion]) -> String {
    if cities.is_empty() {
        return "No matching cities".to_string();
    }

    cities
        .iter()
        .enumerate()
        .map(|(i, city)| format!("  {}. {}", i + 1, city.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_recent(cities: &[String]) -> String {
    if cities.is_empty() {
        return "Recent: (none)".to_string();
    }

    let items: Vec<_> = cities.iter().enumerate().map(|(i, c)| format!("{}. {c}", i + 1)).collect();
    format!("Recent: {}", items.join("  "))
}

/// Presenter writing to stdout. Keeps the last suggestions and recent list so
/// the interactive session can select entries by number.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    search_value: Mutex<String>,
    suggestions: Mutex<Vec<CitySuggestion>>,
    recent: Mutex<Vec<String>>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based, as printed.
    pub fn suggestion(&self, number: usize) -> Option<CitySuggestion> {
        lock(&self.suggestions).get(number.checked_sub(1)?).cloned()
    }

    /// 1-based, as printed.
    pub fn recent(&self, number: usize) -> Option<String> {
        lock(&self.recent).get(number.checked_sub(1)?).cloned()
    }
}

impl Presenter for TerminalPresenter {
    fn show_loading(&self) {
        println!("Loading...");
    }

    fn hide_loading(&self) {}

    fn display_current_weather(&self, reading: &WeatherReading) {
        println!("\n{}", format_reading(reading));
    }

    fn display_forecast(&self, days: &[ForecastDay]) {
        println!("\n{}\n", format_forecast(days));
    }

    fn display_suggestions(&self, cities: &[CitySuggestion]) {
        *lock(&self.suggestions) = cities.to_vec();
        println!("{}", format_suggestions(cities));
    }

    fn clear_suggestions(&self) {
        lock(&self.suggestions).clear();
    }

    fn display_recent_searches(&self, cities: &[String]) {
        *lock(&self.recent) = cities.to_vec();
        println!("{}", format_recent(cities));
    }

    fn show_error(&self, title: &str, message: &str) {
        println!("\n!! {title}\n   {message}\n   (:retry to dismiss)\n");
    }

    fn hide_error(&self) {}

    fn show_notification(&self, message: &str, severity: Severity) {
        println!("[{severity}] {message}");
    }

    fn search_value(&self) -> String {
        lock(&self.search_value).trim().to_string()
    }

    fn set_search_value(&self, value: &str) {
        *lock(&self.search_value) = value.to_string();
    }

    fn focus_search(&self) {
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}
