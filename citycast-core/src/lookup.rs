use std::time::Duration;

use log::error;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::error::{LookupError, ProviderError};
use crate::model::{Coordinates, Forecast};

const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

const GEOCODING: &str = "OpenWeather geocoding";
const FORECAST: &str = "OpenWeather forecast";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Two-step forecast lookup: resolve a city name to coordinates, then fetch
/// the 5-day forecast for them.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    api_key: String,
    http: Client,
    geocoding_url: String,
    forecast_url: String,
}

/// Single geocoding match; only the coordinates are used downstream.
#[derive(Debug, Deserialize)]
struct GeoMatch {
    lat: f64,
    lon: f64,
}

impl WeatherLookup {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        Self::with_base_urls(api_key, GEOCODING_URL.to_string(), FORECAST_URL.to_string())
    }

    fn with_base_urls(
        api_key: String,
        geocoding_url: String,
        forecast_url: String,
    ) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            api_key,
            http,
            geocoding_url,
            forecast_url,
        })
    }

    /// Fetch the forecast for `city`.
    ///
    /// Issues at most two requests: geocoding first, then the forecast for
    /// the first match. Zero matches fail with [`LookupError::NotFound`]
    /// before any forecast request is made. Ranking among several matches
    /// belongs to the provider; the first result wins and is not guaranteed
    /// stable between calls.
    ///
    /// Any failure is logged once and returned unchanged.
    pub async fn fetch_forecast(&self, city: &str) -> Result<Forecast, LookupError> {
        let result = self.lookup(city).await;

        if let Err(err) = &result {
            error!("Weather lookup for '{city}' failed: {err}");
        }

        result
    }

    async fn lookup(&self, city: &str) -> Result<Forecast, LookupError> {
        let matches = self.geocode(city).await?;

        let Some(hit) = matches.into_iter().next() else {
            return Err(LookupError::NotFound(city.to_string()));
        };

        let point = Coordinates {
            latitude: hit.lat,
            longitude: hit.lon,
        };

        Ok(self.forecast(point).await?)
    }

    async fn geocode(&self, city: &str) -> Result<Vec<GeoMatch>, ProviderError> {
        let res = self
            .http
            .get(&self.geocoding_url)
            .query(&[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                endpoint: GEOCODING,
                source: e,
            })?;

        let body = success_body(res, GEOCODING).await?;

        serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
            endpoint: GEOCODING,
            source: e,
        })
    }

    async fn forecast(&self, point: Coordinates) -> Result<Forecast, ProviderError> {
        let res = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                endpoint: FORECAST,
                source: e,
            })?;

        let body = success_body(res, FORECAST).await?;

        serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
            endpoint: FORECAST,
            source: e,
        })
    }
}

async fn success_body(res: Response, endpoint: &'static str) -> Result<String, ProviderError> {
    let status = res.status();

    let body = res.text().await.map_err(|e| ProviderError::Request {
        endpoint,
        source: e,
    })?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            endpoint,
            status,
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_against(server: &MockServer) -> WeatherLookup {
        WeatherLookup::with_base_urls(
            "test-key".to_string(),
            format!("{}/geo/1.0/direct", server.uri()),
            format!("{}/data/2.5/forecast", server.uri()),
        )
        .expect("client should build")
    }

    fn paris_matches() -> serde_json::Value {
        json!([{ "name": "Paris", "lat": 48.8566, "lon": 2.3522, "country": "FR" }])
    }

    fn forecast_payload() -> serde_json::Value {
        json!({
            "cod": "200",
            "city": { "name": "Paris", "country": "FR" },
            "list": [
                {
                    "dt": 1754384400,
                    "main": { "temp": 21.3, "feels_like": 21.0, "humidity": 60 },
                    "weather": [{ "description": "scattered clouds" }]
                }
            ]
        })
    }

    #[tokio::test]
    async fn forecast_uses_coordinates_of_the_geocode_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Paris"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_matches()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = lookup_against(&server)
            .fetch_forecast("Paris")
            .await
            .expect("lookup should succeed");

        // The payload must come back exactly as the provider sent it.
        assert_eq!(forecast.as_value(), &forecast_payload());
    }

    #[tokio::test]
    async fn unknown_city_fails_without_a_forecast_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let err = lookup_against(&server)
            .fetch_forecast("Nonexistentville")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "City not found: Nonexistentville");
    }

    #[tokio::test]
    async fn geocoding_failure_skips_the_forecast_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let err = lookup_against(&server).fetch_forecast("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Provider(ProviderError::Status { endpoint, status, .. })
                if endpoint == GEOCODING && status.as_u16() == 500
        ));
    }

    #[tokio::test]
    async fn forecast_failure_after_a_successful_geocode_is_a_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_matches()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "cod": 401, "message": "Invalid API key" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = lookup_against(&server).fetch_forecast("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Provider(ProviderError::Status { endpoint, status, .. })
                if endpoint == FORECAST && status.as_u16() == 401
        ));
    }

    #[tokio::test]
    async fn malformed_geocoding_payload_is_a_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let err = lookup_against(&server).fetch_forecast("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Provider(ProviderError::Parse { endpoint, .. }) if endpoint == GEOCODING
        ));
    }

    #[tokio::test]
    async fn first_of_several_matches_wins() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "London", "lat": 51.5074, "lon": -0.1278, "country": "GB" },
                { "name": "London", "lat": 42.9836, "lon": -81.2497, "country": "CA" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "51.5074"))
            .and(query_param("lon", "-0.1278"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let result = lookup_against(&server).fetch_forecast("London").await;
        assert!(result.is_ok());
    }
}
