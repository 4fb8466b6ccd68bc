use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Select, Text};
use serde_json::json;
use std::fmt;

use weathernow_core::{Config, Phase, SessionController, session_from_config};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathernow", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API endpoint, request timeout and startup location.
    Configure,

    /// Show current weather and forecast for a city.
    Show {
        /// City name.
        city: String,

        /// Print state and derived view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show weather for the configured or detected location.
    Here {
        #[arg(long)]
        json: bool,
    },

    /// List recent searches, most recent first.
    History,

    /// Interactive dashboard: locate, then search or pick from history.
    Dashboard,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => {
                let mut session = load_session()?;
                session.search_for(&city).await;
                print_session(&session, json)
            }
            Command::Here { json } => {
                let mut session = load_session()?;
                if session.start().await == Phase::Idle {
                    println!("No location available.");
                    println!(
                        "Hint: run `weathernow configure` to set coordinates or enable IP lookup."
                    );
                    return Ok(());
                }
                print_session(&session, json)
            }
            Command::History => {
                let mut session = load_session()?;
                let history = session.history();
                if history.is_empty() {
                    println!("No searches yet.");
                }
                for (idx, city) in history.iter().enumerate() {
                    println!("{:>2}. {city}", idx + 1);
                }
                Ok(())
            }
            Command::Dashboard => dashboard().await,
        }
    }
}

fn load_session() -> anyhow::Result<SessionController> {
    let config = Config::load()?;
    session_from_config(&config).context("Failed to set up weather session")
}

fn print_session(session: &SessionController, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let out = json!({ "state": session.state(), "view": session.view() });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render::render(session.state(), &session.view()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationSource {
    Fixed,
    IpLookup,
    Off,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationSource::Fixed => "Fixed coordinates",
            LocationSource::IpLookup => "Detect from IP address",
            LocationSource::Off => "No startup location",
        })
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    config.api_base = Text::new("Weather API base URL:").with_default(&config.api_base).prompt()?;
    config.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .prompt()?;

    let source = Select::new(
        "Startup location:",
        vec![LocationSource::Fixed, LocationSource::IpLookup, LocationSource::Off],
    )
    .prompt()?;

    config.clear_location();
    match source {
        LocationSource::Fixed => {
            let lat = CustomType::<f64>::new("Latitude:").prompt()?;
            let lon = CustomType::<f64>::new("Longitude:").prompt()?;
            config.set_fixed_location(lat, lon);
        }
        LocationSource::IpLookup => config.location.ip_lookup = true,
        LocationSource::Off => {}
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuChoice {
    Search,
    Recent(String),
    Quit,
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuChoice::Search => f.write_str("Search a city…"),
            MenuChoice::Recent(city) => write!(f, "↺ {city}"),
            MenuChoice::Quit => f.write_str("Quit"),
        }
    }
}

async fn dashboard() -> anyhow::Result<()> {
    let mut session = load_session()?;

    if session.start().await != Phase::Idle {
        print!("{}", render::render(session.state(), &session.view()));
    }

    loop {
        let mut choices = vec![MenuChoice::Search];
        choices.extend(session.history().into_iter().map(MenuChoice::Recent));
        choices.push(MenuChoice::Quit);

        let choice = match Select::new("What next?", choices).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match choice {
            MenuChoice::Search => {
                let prompt = Text::new("City:").with_initial_value(&session.state().query);
                let query = match prompt.prompt() {
                    Ok(query) => query,
                    Err(InquireError::OperationCanceled) => continue,
                    Err(InquireError::OperationInterrupted) => break,
                    Err(e) => return Err(e.into()),
                };
                session.set_query(query);
                session.search().await;
            }
            MenuChoice::Recent(city) => {
                session.search_for(&city).await;
            }
            MenuChoice::Quit => break,
        }

        print!("{}", render::render(session.state(), &session.view()));
    }

    Ok(())
}
