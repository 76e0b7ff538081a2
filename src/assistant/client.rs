//! HTTP client for the messages API

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::AssistantError;
use super::models::{CreateMessageRequest, MessageResponse, StreamEvent};
use super::streaming;

/// Authenticated client for the assistant backend
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: Client,
    api_key: String,
}

impl AssistantClient {
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &'static str = "2023-06-01";
    /// Answers are short; a slow backend is treated as a failure
    const TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: impl Into<String>) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self { client, api_key: api_key.into() })
    }

    /// Stream an answer through `tx`. Cancelling the token stops the stream.
    pub async fn send_streaming(
        &self,
        request: CreateMessageRequest,
        tx: mpsc::Sender<StreamEvent>,
        cancel_token: CancellationToken,
    ) -> Result<(), AssistantError> {
        let response = self.post(&request).await?;
        streaming::process_stream(response, tx, cancel_token).await
    }

    /// Send a request and wait for the whole answer
    pub async fn send_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<MessageResponse, AssistantError> {
        let request = request.without_streaming();
        let response = self.post(&request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post(&self, request: &CreateMessageRequest) -> Result<Response, AssistantError> {
        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        check_status(response).await
    }
}

/// Map non-success statuses to errors
async fn check_status(response: Response) -> Result<Response, AssistantError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_seconds = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(AssistantError::RateLimited { retry_after_seconds });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(AssistantError::Api { status: 401, message: "Invalid API key".to_string() });
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AssistantError::Api { status: status.as_u16(), message });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_keeps_key() {
        let client = AssistantClient::new("sk-ant-test-key").unwrap();
        assert_eq!(client.api_key, "sk-ant-test-key");
    }
}
