use thiserror::Error;

/// Failures surfaced by weather lookups and search submission.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Please enter a city name")]
    Validation,

    #[error("City not found. Please check the spelling and try again.")]
    NotFound,

    #[error("Invalid API key. Please check your configuration.")]
    Unauthorized,

    #[error("Error fetching {context} ({status})")]
    Service { context: &'static str, status: u16 },

    #[error("Please check your internet connection and try again.")]
    Network(#[source] reqwest::Error),

    #[error("Unexpected response from the weather service.")]
    Decode(#[source] serde_json::Error),
}

pub type WeatherResult<T> = Result<T, WeatherError>;
