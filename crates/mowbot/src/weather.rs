//! Weather lookups for outdoor sites.
//!
//! The engine only depends on the [`WeatherProvider`] trait; the bundled
//! [`OpenWeatherClient`] talks to the OpenWeatherMap current-weather API
//! and memoizes responses in a TTL cache so repeated job views don't
//! hammer the upstream.

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use serde::Deserialize;
use thiserror::Error;

/// Area keywords that mark a job as outdoor work worth a forecast.
const OUTDOOR_KEYWORDS: &[&str] = &["garden", "outdoor", "yard", "field", "grounds", "exterior"];

/// Returns true when the area description matches the outdoor heuristic.
pub fn is_outdoor_area(area: &str) -> bool {
    let area = area.to_lowercase();
    OUTDOOR_KEYWORDS.iter().any(|kw| area.contains(kw))
}

/// A condensed current-conditions forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub summary: String,
    pub temperature_c: f64,
    pub wind_mps: f64,
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(String),

    #[error("weather response malformed: {0}")]
    Malformed(String),
}

/// Boundary to whatever service supplies forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError>;

    /// Drops any cached forecast for the location so the next lookup is
    /// fresh. Default is a no-op for providers without a cache.
    fn invalidate(&self, _location: &str) {}
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    weather: Vec<OwmCondition>,
    main: OwmMain,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// OpenWeatherMap-backed provider with a TTL cache per location.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    cache: Cache<String, Forecast>,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, cache_ttl: Duration) -> Self {
        Self::with_base_url(api_key, cache_ttl, "https://api.openweathermap.org".to_string())
    }

    /// Overridable base URL, used by tests to point at a local server.
    pub fn with_base_url(api_key: String, cache_ttl: Duration, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            cache: Cache::builder()
                .max_capacity(256)
                .time_to_live(cache_ttl)
                .build(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError> {
        if let Some(hit) = self.cache.get(location) {
            return Ok(hit);
        }

        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let body: OwmResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))?;

        let summary = body
            .weather
            .first()
            .map(|c| c.description.clone())
            .ok_or_else(|| WeatherError::Malformed("empty conditions list".to_string()))?;

        let forecast = Forecast {
            summary,
            temperature_c: body.main.temp,
            wind_mps: body.wind.speed,
        };
        self.cache.insert(location.to_string(), forecast.clone());
        Ok(forecast)
    }

    fn invalidate(&self, location: &str) {
        self.cache.invalidate(location);
    }
}
