use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::DEFAULT_BASE_URL,
    error::WeatherError,
    model::{WeatherRecord, WeatherRequest},
};

use super::WeatherProvider;

const UNITS: &str = "metric";
const LANG: &str = "en";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        debug!(city, base_url = %self.base_url, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
                ("lang", LANG),
            ])
            .send()
            .await
            .map_err(WeatherError::network)?;

        let status = res.status();
        let body = res.bytes().await.map_err(WeatherError::network)?;
        debug!(%status, bytes = body.len(), "received current weather response");

        interpret_current(city, status, &body)
    }
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Turn a raw current-weather response into a record or a classified error.
///
/// The body is decoded whatever the status, since OpenWeather puts `cod` and
/// `message` into its error payloads. A body that fails to decode on a non-200
/// response falls back to the status line.
fn interpret_current(city: &str, status: StatusCode, body: &[u8]) -> Result<WeatherRecord, WeatherError> {
    let parsed: OwCurrentResponse = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(err) if status != StatusCode::OK => {
            debug!(%status, error = %err, "error response body is not JSON");
            return Err(WeatherError::UnexpectedStatus(status));
        }
        Err(err) => return Err(WeatherError::Parse(err)),
    };

    if status != StatusCode::OK {
        debug!(%status, cod = ?parsed.cod, "OpenWeather reported an error");
        return Err(match parsed.message() {
            Some(message) => WeatherError::Provider(message.to_string()),
            None => WeatherError::UnexpectedStatus(status),
        });
    }

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::EmptyResult(city.to_string()))?;

    Ok(WeatherRecord {
        city: parsed.name,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        condition: condition.description,
        wind_speed_mps: parsed.wind.speed,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: f64,
}

/// `cod` is a number on success and usually a string on errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    cod: Option<OwCode>,
    message: Option<serde_json::Value>,
}

impl OwCurrentResponse {
    /// Non-empty textual `message`, if any.
    fn message(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|message| !message.is_empty())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherRecord, WeatherError> {
        self.fetch_current(&request.city).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london_payload() -> serde_json::Value {
        json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [
                { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" },
                { "id": 701, "main": "Mist", "description": "mist", "icon": "50d" }
            ],
            "main": { "temp": 21.5, "feels_like": 20.9, "pressure": 1015, "humidity": 40 },
            "wind": { "speed": 3.2, "deg": 250 },
            "dt": 1760790000,
            "name": "London",
            "cod": 200
        })
    }

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("test-key".to_string()).with_base_url(&server.uri())
    }

    async fn mount(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sends_city_key_units_and_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "New York"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        provider
            .get_weather(&WeatherRequest::new("New York"))
            .await
            .expect("request should match mock");
    }

    #[tokio::test]
    async fn success_uses_first_condition_and_metric_fields() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_json(london_payload())).await;

        let record = provider_for(&server)
            .get_weather(&WeatherRequest::default())
            .await
            .expect("weather record");

        assert_eq!(
            record,
            WeatherRecord {
                city: "London".to_string(),
                temperature_c: 21.5,
                feels_like_c: 20.9,
                humidity_pct: 40,
                condition: "clear sky".to_string(),
                wind_speed_mps: 3.2,
            }
        );
    }

    #[tokio::test]
    async fn empty_condition_list_names_the_city() {
        let server = MockServer::start().await;
        let mut payload = london_payload();
        payload["weather"] = json!([]);
        mount(&server, ResponseTemplate::new(200).set_body_json(payload)).await;

        let err = provider_for(&server)
            .get_weather(&WeatherRequest::new("Atlantis"))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::EmptyResult(ref city) if city == "Atlantis"));
        assert!(err.to_string().contains("Atlantis"));
    }

    #[tokio::test]
    async fn provider_message_is_used_verbatim() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
        )
        .await;

        let err = provider_for(&server)
            .get_weather(&WeatherRequest::new("Nowhere"))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Provider(ref msg) if msg == "city not found"));
        assert_eq!(err.to_string(), "API error: city not found");
    }

    #[tokio::test]
    async fn empty_message_falls_back_to_status_text() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(401).set_body_json(json!({ "cod": 401, "message": "" })),
        )
        .await;

        let err = provider_for(&server)
            .get_weather(&WeatherRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::UnexpectedStatus(StatusCode::UNAUTHORIZED)));
        assert_eq!(err.to_string(), "API returned unexpected status: 401 Unauthorized");
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status_text() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
        )
        .await;

        let err = provider_for(&server)
            .get_weather(&WeatherRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::UnexpectedStatus(StatusCode::BAD_GATEWAY)));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parse_error() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = provider_for(&server)
            .get_weather(&WeatherRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse API response"));
    }

    #[tokio::test]
    async fn network_failure_does_not_leak_api_key() {
        // Nothing listens on port 1.
        let provider = OpenWeatherProvider::new("leaky-key".to_string()).with_base_url("http://127.0.0.1:1");

        let err = provider.get_weather(&WeatherRequest::default()).await.unwrap_err();

        assert!(matches!(err, WeatherError::Network(_)));
        assert!(err.to_string().starts_with("network error"));
        assert!(!format!("{err:?}").contains("leaky-key"));
    }

    #[test]
    fn code_accepts_number_or_string() {
        let numeric: OwCurrentResponse = serde_json::from_str(r#"{"cod": 200}"#).unwrap();
        let textual: OwCurrentResponse = serde_json::from_str(r#"{"cod": "404"}"#).unwrap();

        assert!(matches!(numeric.cod, Some(OwCode::Number(_))));
        assert_eq!(textual.cod, Some(OwCode::Text("404".to_string())));
    }

    #[test]
    fn non_string_message_is_ignored() {
        let err = interpret_current("London", StatusCode::NOT_FOUND, br#"{"cod": "404", "message": 0}"#)
            .unwrap_err();

        assert!(matches!(err, WeatherError::UnexpectedStatus(StatusCode::NOT_FOUND)));
    }
}
