use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, Coordinate, DailyPresenter, ForecastError, ForecastSnapshot, HourlyPresenter,
    Orchestrator, location::StaticLocation, provider_from_config,
};

use crate::{
    host::{IconLog, PromptPermission, StderrNotifier},
    render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Current, hourly and daily forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and the fallback location.
    Configure,

    /// Fetch and show the forecast.
    Show {
        /// Device latitude; without it the fallback location is used.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Device longitude.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Behave as if location permission was refused.
        #[arg(long, conflicts_with = "ask_permission")]
        deny_location: bool,

        /// Ask for location permission before using --lat/--lon.
        #[arg(long)]
        ask_permission: bool,

        /// Print the icon URL next to each row.
        #[arg(long)]
        icons: bool,
    },

    /// Print where the config file lives.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                lat,
                lon,
                deny_location,
                ask_permission,
                icons,
            } => {
                let device = lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon));
                let permission = PromptPermission {
                    denied: deny_location,
                    interactive: ask_permission,
                };
                show(device, permission, icons).await
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("API key prompt aborted")?;
    if !api_key.trim().is_empty() {
        cfg.api_key = Some(api_key.trim().to_string());
    }

    let change_fallback = inquire::Confirm::new(&format!(
        "Fallback location is {}. Change it?",
        cfg.fallback
    ))
    .with_default(false)
    .prompt()
    .context("Fallback prompt aborted")?;

    if change_fallback {
        let latitude = inquire::CustomType::<f64>::new("Latitude:")
            .with_validator(|v: &f64| {
                Ok(if (-90.0..=90.0).contains(v) {
                    inquire::validator::Validation::Valid
                } else {
                    inquire::validator::Validation::Invalid("must be within -90..=90".into())
                })
            })
            .prompt()
            .context("Latitude prompt aborted")?;
        let longitude = inquire::CustomType::<f64>::new("Longitude:")
            .with_validator(|v: &f64| {
                Ok(if (-180.0..=180.0).contains(v) {
                    inquire::validator::Validation::Valid
                } else {
                    inquire::validator::Validation::Invalid("must be within -180..=180".into())
                })
            })
            .prompt()
            .context("Longitude prompt aborted")?;
        cfg.fallback = Coordinate::new(latitude, longitude);
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    device: Option<Coordinate>,
    permission: PromptPermission,
    show_icons: bool,
) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let provider = provider_from_config(&cfg)?;

    let mut orchestrator = Orchestrator::new(
        Box::new(permission),
        Box::new(StaticLocation(device)),
        provider,
        Arc::new(StderrNotifier),
    )
    .with_fallback(cfg.fallback);

    let icon_urls = cfg.icon_urls();
    let loader = IconLog::shared();
    let mut hourly = HourlyPresenter::hourly(orchestrator.subscribe(), icon_urls.clone(), loader.clone());
    let mut daily = DailyPresenter::daily(orchestrator.subscribe(), icon_urls.clone(), loader.clone());

    // Failures are not fatal: the notifier has already told the user, and
    // whatever was rendered before (nothing, on a first run) stays on screen.
    let outcome = orchestrator.run().await;
    let snapshot = settle(outcome, orchestrator.snapshot());

    hourly.refresh();
    daily.refresh();

    render::print_header(&snapshot, &icon_urls, loader.as_ref());
    render::print_list("Hourly", &hourly, show_icons);
    render::print_list("Daily", &daily, show_icons);

    Ok(())
}

/// The snapshot to render after a cycle: the new one, or on failure the one
/// that was already showing.
fn settle(
    outcome: Result<Arc<ForecastSnapshot>, ForecastError>,
    showing: Arc<ForecastSnapshot>,
) -> Arc<ForecastSnapshot> {
    match outcome {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::debug!(error = %err, "Forecast cycle failed");
            showing
        }
    }
}
