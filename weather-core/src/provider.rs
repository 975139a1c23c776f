use crate::{Config, WeatherError, WeatherRecord, WeatherRequest, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherRecord, WeatherError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenWeatherProvider::new(config.api_key.clone()).with_base_url(&config.base_url))
}
