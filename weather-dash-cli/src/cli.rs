use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{process::ExitCode, sync::Arc};
use weather_dash_core::{Config, FileStore, Presenter, SearchController, client_from_config};

use crate::{session, view::TerminalPresenter};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// OpenWeatherMap API key; overrides the configured one.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Use synthetic demo data even when an API key is available.
    #[arg(long, global = true)]
    pub demo: bool,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an OpenWeatherMap API key; without one the dashboard runs in demo mode.
    Configure {
        /// Key to store; prompted for when absent.
        #[arg(long)]
        key: Option<String>,
    },

    /// Show current weather and the five-day forecast for a city.
    Show {
        /// City name, e.g. "London" or "New York".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// List cities matching a partial name.
    Suggest {
        query: String,
    },

    /// List recent searches, or remove one.
    Recent {
        #[command(subcommand)]
        action: Option<RecentAction>,
    },

    /// Interactive session (default).
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum RecentAction {
    /// Remove a city from the recent searches.
    Remove { city: String },
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let mut config = Config::load()?;

        if let Some(key) = self.api_key {
            config.set_api_key(key);
        }
        if self.demo {
            config.api_key = None;
        }

        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure { key } => {
                configure(key)?;
            }
            Command::Show { city } => {
                let (mut controller, _) = build_controller(&config)?;
                if controller.submit_search(&city.join(" ")).await.is_err() {
                    return Ok(ExitCode::FAILURE);
                }
            }
            Command::Suggest { query } => {
                let client = client_from_config(&config)?;
                let presenter = TerminalPresenter::new();
                presenter.display_suggestions(&client.search_cities(query.trim()).await);
            }
            Command::Recent { action } => {
                let (mut controller, presenter) = build_controller(&config)?;
                match action {
                    Some(RecentAction::Remove { city }) => controller.remove_recent_search(&city),
                    None => presenter.display_recent_searches(controller.recent_searches()),
                }
            }
            Command::Interactive => {
                let (mut controller, presenter) = build_controller(&config)?;
                session::run(&mut controller, &presenter).await?;
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn build_controller(config: &Config) -> Result<(SearchController, Arc<TerminalPresenter>)> {
    let client = client_from_config(config)?;
    let store = FileStore::open_default()?;
    let presenter = Arc::new(TerminalPresenter::new());

    let controller =
        SearchController::new(client, Arc::clone(&presenter) as Arc<dyn Presenter>, Box::new(store))
            .with_request_timeout(config.request_timeout());

    Ok((controller, presenter))
}

fn configure(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeatherMap API key:")
            .without_confirmation()
            .with_help_message("Get a free key at https://openweathermap.org/api")
            .prompt()
            .context("Failed to read API key")?,
    };

    // Start from the file, not from flag/env overrides.
    let mut config = Config::load()?;
    config.set_api_key(key);
    anyhow::ensure!(config.api_key().is_some(), "API key must not be empty");
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_joins_multi_word_city() {
        let cli = Cli::try_parse_from(["weather-dash", "show", "New", "York"]).unwrap();
        match cli.command {
            Some(Command::Show { city }) => assert_eq!(city.join(" "), "New York"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["weather-dash", "--demo"]).unwrap();
        assert!(cli.demo);
        assert!(cli.command.is_none());
    }

    #[test]
    fn recent_remove_takes_city() {
        let cli = Cli::try_parse_from(["weather-dash", "recent", "remove", "Paris"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Recent { action: Some(RecentAction::Remove { ref city }) }) if city == "Paris"
        ));
    }
}
