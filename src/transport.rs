use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::config::Config;
use crate::message::ChatMessage;
use crate::prompts::{CONNECTIVITY_FALLBACK, EMPTY_REPLY_FALLBACK};

/// Errors raised by the HTTP seam. Callers in the widget fold these into
/// silence or a fallback message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend answered {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend url '{0}'")]
    Url(String),
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

/// Body returned by `POST /api/chat`. Fields are read one by one; a field
/// that is missing or not a string is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub response: Option<String>,
    pub session_id: Option<String>,
}

impl ChatReply {
    pub fn from_value(body: &serde_json::Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        Self {
            response: text("response"),
            session_id: text("session_id"),
        }
    }
}

/// Body returned by `GET /api/chat/history/{id}`. Records are kept raw so one
/// bad record does not discard the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Option<Vec<serde_json::Value>>,
}

/// Body returned by `GET /api/health`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Result of a send: always a displayable assistant message, plus the session
/// id the backend reported, if any.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: ChatMessage,
    pub session_id: Option<String>,
}

impl SendOutcome {
    pub fn connectivity_failure() -> Self {
        Self {
            message: ChatMessage::error(CONNECTIVITY_FALLBACK),
            session_id: None,
        }
    }
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct ChatTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ChatTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one visitor message. Never fails: every error path resolves to
    /// the connectivity apology.
    pub async fn send(&self, text: &str, session_id: Option<&str>) -> SendOutcome {
        let request = ChatRequest {
            message: text.to_string(),
            session_id: session_id.map(str::to_string),
        };

        match self.post_chat(&request).await {
            Ok(reply) => {
                let content = reply
                    .response
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());
                SendOutcome {
                    message: ChatMessage::assistant(content),
                    session_id: reply.session_id.filter(|id| !id.is_empty()),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                SendOutcome::connectivity_failure()
            }
        }
    }

    /// `POST /api/chat`
    pub async fn post_chat(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let url = self.endpoint(&["api", "chat"])?;
        tracing::debug!(%url, session_id = ?request.session_id, "posting chat message");

        let response = self.client.post(url).json(request).send().await?;
        let body: serde_json::Value = Self::decode(response).await?;
        Ok(ChatReply::from_value(&body))
    }

    /// `GET /api/chat/history/{session_id}`
    pub async fn fetch_history(&self, session_id: &str) -> Result<HistoryResponse, TransportError> {
        let url = self.endpoint(&["api", "chat", "history", session_id])?;
        tracing::debug!(%url, "fetching chat history");

        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    /// `GET /api/health`
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.endpoint(&["api", "health"])?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| TransportError::Url(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
