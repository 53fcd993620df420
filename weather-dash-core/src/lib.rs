//! Core library for the `weather-dash` dashboard.
//!
//! This crate defines:
//! - Weather clients (live OpenWeatherMap and offline demo) behind one trait
//! - The search controller: debounced suggestions, submissions, recent searches
//! - Configuration, key-value storage and shared domain models
//!
//! Rendering is left to a [`Presenter`] implementation supplied by the binary.

pub mod client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod model;
pub mod presentation;
pub mod recent;
pub mod storage;

pub use client::{ClientMode, WeatherClient, client_from_config};
pub use config::Config;
pub use controller::{SearchController, SearchState};
pub use error::{WeatherError, WeatherResult};
pub use model::{CitySuggestion, ForecastDay, Severity, WeatherReading};
pub use presentation::Presenter;
pub use recent::RecentSearches;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
