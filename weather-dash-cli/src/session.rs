//! Line-driven interactive dashboard.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use weather_dash_core::{Presenter, SearchController, WeatherReading, WeatherResult};

use crate::view::TerminalPresenter;

const HELP: &str = "\
Type a city name and press Enter to search. An empty line searches the current input.
  :q <text>     type into the search box (suggestions appear after a short pause)
  :pick <n>     search the n-th suggestion
  :recent <n>   search the n-th recent city
  :rm <city>    remove a city from recent searches
  :retry        dismiss the error panel
  :fav          toggle the displayed city as favorite
  :key <KEY>    switch to live data with an OpenWeatherMap API key
  :help         show this help
  :quit         exit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Submit(String),
    SubmitCurrent,
    Query(String),
    Pick(usize),
    Recent(usize),
    Remove(String),
    Retry,
    Favorite,
    Key(String),
    Help,
    Quit,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::SubmitCurrent;
        }

        let Some(command) = line.strip_prefix(':') else {
            return Input::Submit(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        let number = || arg.parse::<usize>().ok();

        match name {
            "q" => Input::Query(arg.to_string()),
            "pick" => number().map_or_else(|| Input::Unknown(line.to_string()), Input::Pick),
            "recent" => number().map_or_else(|| Input::Unknown(line.to_string()), Input::Recent),
            "rm" if !arg.is_empty() => Input::Remove(arg.to_string()),
            "retry" => Input::Retry,
            "fav" => Input::Favorite,
            "key" if !arg.is_empty() => Input::Key(arg.to_string()),
            "help" | "h" => Input::Help,
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

pub async fn run(controller: &mut SearchController, presenter: &TerminalPresenter) -> Result<()> {
    println!("{HELP}\n");
    controller.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        match Input::parse(&line) {
            Input::Submit(city) => {
                presenter.set_search_value(&city);
                log_failure(controller.submit_current_input().await);
            }
            Input::SubmitCurrent => {
                log_failure(controller.submit_current_input().await);
            }
            Input::Query(text) => {
                presenter.set_search_value(&text);
                controller.on_query_changed(&text);
            }
            Input::Pick(n) => match presenter.suggestion(n) {
                Some(city) => {
                    log_failure(controller.select_suggestion(&city.name).await);
                }
                None => println!("No suggestion #{n}"),
            },
            Input::Recent(n) => match presenter.recent(n) {
                Some(city) => {
                    log_failure(controller.select_recent(&city).await);
                }
                None => println!("No recent search #{n}"),
            },
            Input::Remove(city) => controller.remove_recent_search(&city),
            Input::Retry => controller.retry(),
            Input::Favorite => {
                if controller.toggle_favorite().is_none() {
                    println!("Search for a city first");
                }
            }
            Input::Key(key) => {
                if let Err(err) = controller.set_credential(&key) {
                    println!("Could not use API key: {err:#}");
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(text) => {
                debug!(%text, "unrecognized input");
                println!("Unknown command: {text} (:help lists commands)");
            }
        }

        presenter.focus_search();
    }

    Ok(())
}

/// The presenter has already rendered the outcome; failures only go to the log.
/// Returns whether the search failed.
fn log_failure(outcome: WeatherResult<WeatherReading>) -> bool {
    match outcome {
        Ok(_) => false,
        Err(err) => {
            debug!(error = %err, "search did not complete");
            true
        }
    }
}
