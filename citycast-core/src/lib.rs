//! Core library for the `citycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The two-step city → coordinates → forecast lookup against OpenWeatherMap
//! - Shared domain models (coordinates, forecast payload)
//!
//! It is used by `citycast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;

pub use config::Config;
pub use error::{LookupError, ProviderError};
pub use lookup::WeatherLookup;
pub use model::{Coordinates, Forecast, ForecastEntry};
