use serde::{Deserialize, Serialize};

/// City used when the caller does not name one.
pub const DEFAULT_CITY: &str = "London";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub city: String,
}

impl WeatherRequest {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

impl Default for WeatherRequest {
    fn default() -> Self {
        Self::new(DEFAULT_CITY)
    }
}

/// Current conditions for one city, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub condition: String,
    pub wind_speed_mps: f64,
}
