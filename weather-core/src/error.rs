use reqwest::StatusCode;
use thiserror::Error;

/// Failure while fetching current weather.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The request never produced a complete response (DNS, connect, body read).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A 200 response whose body is not the expected JSON.
    #[error("failed to parse API response: {0}")]
    Parse(#[source] serde_json::Error),

    /// The provider rejected the request and said why.
    #[error("API error: {0}")]
    Provider(String),

    /// Non-200 response without a usable message.
    #[error("API returned unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("API returned no weather data for {0:?}")]
    EmptyResult(String),
}

impl WeatherError {
    /// Wrap a transport error, dropping the request URL so the `appid` query never reaches output.
    pub(crate) fn network(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}
