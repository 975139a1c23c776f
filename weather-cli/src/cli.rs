use std::io::Write;

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::Parser;
use tracing::debug;
use weather_core::{
    Config, ConfigError, WeatherProvider, WeatherRequest, model::DEFAULT_CITY, provider_from_config,
};

use crate::display;

/// Printed after the missing-key error so users know how to fix it.
const MISSING_KEY_HELP: &str = "Add it to the .env file in the project directory:\n  \
     WEATHER_API_KEY=your_api_key_here\n\
     Get a free key at https://openweathermap.org/api";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Show current weather for a city")]
pub struct Cli {
    /// City name, e.g. "Paris" or "New York".
    #[arg(default_value = DEFAULT_CITY)]
    pub city: String,

    /// Anything after the city is ignored, so `weather New York` looks up "New".
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    _rest: Vec<String>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::from_env().map_err(|err| match err {
            err @ ConfigError::MissingCredential => anyhow!("{err}.\n{MISSING_KEY_HELP}"),
            other => other.into(),
        })?;
        debug!(?config, "resolved configuration");

        let provider = provider_from_config(&config);
        self.show(provider.as_ref(), &mut std::io::stdout().lock()).await
    }

    async fn show(&self, provider: &dyn WeatherProvider, out: &mut impl Write) -> Result<()> {
        let request = WeatherRequest::new(self.city.as_str());
        let record = provider.get_weather(&request).await?;

        out.write_all(display::render(&record, Local::now()).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
