//! HTTP client for the relay's `POST /ask` endpoint.

use std::time::Duration;

use futures_util::Stream;

use omaha_core::stream::consume;
use omaha_types::chat::AskRequest;
use omaha_types::error::ConsumeError;
use omaha_types::event::RelayEvent;

/// Default relay endpoint used by the CLI clients.
pub const DEFAULT_ASK_URL: &str = "http://127.0.0.1:3000/ask";

/// Client that posts questions to a relay and decodes the streamed answer.
#[derive(Debug, Clone)]
pub struct AskClient {
    http: reqwest::Client,
    url: String,
}

impl AskClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ConsumeError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| ConsumeError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one question and return its event stream.
    ///
    /// A non-success status is returned as [`ConsumeError::Status`] carrying
    /// the relay's JSON `message` (or `error`) when present.
    pub async fn ask(
        &self,
        request: &AskRequest,
    ) -> Result<impl Stream<Item = Result<RelayEvent, ConsumeError>> + Send + use<>, ConsumeError>
    {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|err| ConsumeError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsumeError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        tracing::debug!(url = %self.url, status = status.as_u16(), "Relay stream opened");
        Ok(consume(response.bytes_stream()))
    }
}

/// Pull a human-readable message out of a JSON error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|v| v.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
