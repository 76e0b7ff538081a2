//! Server-sent events decoding for streamed answers

use futures_util::StreamExt;
use reqwest::Response;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::AssistantError;
use super::models::StreamEvent;

/// Incremental SSE decoder.
///
/// Network chunks can split lines anywhere, so incomplete lines are kept
/// until the rest arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    event_type: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completes
    pub fn push(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end();

            if let Some(event_type) = line.strip_prefix("event:") {
                self.event_type = event_type.trim().to_string();
            } else if let Some(data) = line.strip_prefix("data:") {
                if let Some(event) = parse_event(&self.event_type, data.trim()) {
                    events.push(event);
                }
            }
        }

        events
    }
}

/// Forward a streaming response to `tx` until it ends or is cancelled
pub async fn process_stream(
    response: Response,
    tx: mpsc::Sender<StreamEvent>,
    cancel_token: CancellationToken,
) -> Result<(), AssistantError> {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                return Err(AssistantError::Cancelled);
            }

            chunk = stream.next() => {
                let Some(chunk) = chunk else { break };
                for event in decoder.push(&String::from_utf8_lossy(&chunk?)) {
                    // Receiver gone means nobody is reading the answer
                    if tx.send(event).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_event(event_type: &str, data: &str) -> Option<StreamEvent> {
    match event_type {
        "message_start" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let id = parsed["message"]["id"].as_str()?.to_string();
            Some(StreamEvent::Started { id })
        }
        "content_block_delta" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let text = parsed["delta"]["text"].as_str()?.to_string();
            Some(StreamEvent::Delta { text })
        }
        "message_delta" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let reason = parsed["delta"]["stop_reason"].as_str()?.to_string();
            Some(StreamEvent::StopReason(reason))
        }
        "message_stop" => Some(StreamEvent::Finished),
        "error" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let message =
                parsed["error"]["message"].as_str().unwrap_or("Unknown error").to_string();
            Some(StreamEvent::Error { message })
        }
        "ping" | "content_block_start" | "content_block_stop" => None,
        _ => {
            tracing::debug!("Unknown SSE event type: {}", event_type);
            None
        }
    }
}
