use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Config, error::ForecastError, model::Coordinate, provider::openweather::OpenWeatherProvider};

pub mod openweather;

/// Source of raw forecast payloads.
///
/// Implementations issue exactly one request per call and hand back the
/// response body untouched; turning it into records is the parser's job.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, at: Coordinate) -> Result<String, ForecastError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.resolved_api_key()?;

    let provider = OpenWeatherProvider::builder(api_key)
        .forecast_url(config.forecast_url.clone())
        .timeout(config.request_timeout())
        .build()?;

    Ok(Box::new(provider))
}
