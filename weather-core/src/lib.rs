//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - `.env` loading and configuration resolution
//! - Abstraction over the weather provider
//! - Shared domain models (requests, records) and error types
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, ConfigError, EnvStore};
pub use error::WeatherError;
pub use model::{WeatherRecord, WeatherRequest};
pub use provider::{WeatherProvider, provider_from_config};
