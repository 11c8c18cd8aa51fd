use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair produced by the geocoding step.
///
/// Ephemeral: it exists only to parameterize the forecast request that
/// follows within the same lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The provider's forecast payload, kept verbatim.
///
/// OpenWeatherMap owns the schema; callers that want the exact data get it
/// untouched via [`Forecast::as_value`] or [`Forecast::into_inner`]. The
/// accessors below are a lenient read-only view for display and skip anything
/// that does not match the expected shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Forecast(serde_json::Value);

impl Forecast {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Name the provider reports for the forecast location, if present.
    pub fn city_name(&self) -> Option<&str> {
        self.0.get("city")?.get("name")?.as_str()
    }

    /// Entries of the forecast time series that carry a timestamp and a
    /// temperature. Malformed entries are dropped, not errored on.
    pub fn entries(&self) -> Vec<ForecastEntry> {
        let Some(list) = self.0.get("list").and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        list.iter().filter_map(entry_from_value).collect()
    }
}

/// One slot of the forecast time series, as shown by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub description: String,
}

fn entry_from_value(value: &serde_json::Value) -> Option<ForecastEntry> {
    let time = unix_to_utc(value.get("dt")?.as_i64()?)?;
    let temperature_c = value.get("main")?.get("temp")?.as_f64()?;

    let description = value
        .get("weather")
        .and_then(|w| w.get(0))
        .and_then(|w| w.get("description"))
        .and_then(|d| d.as_str())
        .unwrap_or("Unknown")
        .to_string();

    Some(ForecastEntry {
        time,
        temperature_c,
        description,
    })
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
