use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::{error::ForecastError, model::Coordinate};

use super::ForecastProvider;

pub const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    forecast_url: Url,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherProviderBuilder {
    api_key: String,
    forecast_url: String,
    timeout: Duration,
}

impl OpenWeatherProviderBuilder {
    pub fn forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        let forecast_url = Url::parse(&self.forecast_url)
            .map_err(|e| anyhow::anyhow!("Invalid forecast URL '{}': {e}", self.forecast_url))?;

        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            forecast_url,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherProviderBuilder {
        OpenWeatherProviderBuilder {
            api_key: api_key.into(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::builder(api_key).build()
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(&self, at: Coordinate) -> Result<String, ForecastError> {
        tracing::debug!(url = %self.forecast_url, coordinate = %at, "Requesting forecast");

        let res = self
            .http
            .get(self.forecast_url.clone())
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ForecastError::TransportFailure(format!(
                "OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
