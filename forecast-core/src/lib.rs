//! Core library for the `forecast` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather forecast provider and payload parser
//! - Location/permission collaborator traits
//! - The fetch orchestrator and the hourly/daily list presenters
//!
//! It is used by `forecast-cli`, but any host that can supply the
//! collaborator traits (a GUI shell, a widget daemon) can drive it.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod presenter;
pub mod provider;

pub use config::Config;
pub use error::{ForecastError, MalformedReason};
pub use location::{FALLBACK_COORDINATE, LocationService, PermissionGate, PermissionStatus};
pub use model::{Coordinate, CurrentConditions, DailyPoint, ForecastSnapshot, HourlyPoint};
pub use orchestrator::{FailureKind, FetchState, Notifier, Orchestrator};
pub use parser::{parse_forecast, parse_forecast_on};
pub use presenter::{DailyPresenter, HourlyPresenter, IconLoader, IconUrls, RenderedRow};
pub use provider::{ForecastProvider, provider_from_config};
