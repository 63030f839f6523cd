//! One provider call for one recipient.
//!
//! Sends `GET <base>/<token>.send?text=<title>&desp=<text>` and classifies
//! the result into a [`DispatchOutcome`]. Nothing here returns an error or
//! retries: every failure becomes an outcome value the caller can log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use relay_common::config::RelayConfig;
use relay_common::error::RelayError;

/// Classification of a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success,
    /// The provider answered but refused the message.
    ProviderRejected { code: i64, message: String },
    /// Non-200 HTTP status.
    TransportFailure { status: u16, reason: String },
    /// HTTP 200 without a usable reply body.
    NoResponse,
    /// The request could not be completed (connect error, timeout, ...).
    Exception(String),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Success => write!(f, "success"),
            DispatchOutcome::ProviderRejected { code, message } => {
                write!(f, "provider rejected (errcode {code}): {message}")
            }
            DispatchOutcome::TransportFailure { status, reason } => {
                write!(f, "http status {status}: {reason}")
            }
            DispatchOutcome::NoResponse => write!(f, "no usable response"),
            DispatchOutcome::Exception(detail) => write!(f, "request failed: {detail}"),
        }
    }
}

/// Outbound notification transport for a single recipient.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Deliver `title` / `text` to the recipient identified by `token`.
    async fn send(&self, token: &str, title: &str, text: &str) -> DispatchOutcome;
}

/// Reply body of the `.send` endpoint.
#[derive(Debug, Deserialize)]
struct ProviderReply {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// IYUU HTTP client.
pub struct IyuuClient {
    client: Client,
    base_url: String,
}

impl IyuuClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Self::new(config.provider_base_url.clone(), config.http_timeout)
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/{}.send", self.base_url, token)
    }

    async fn request(&self, token: &str, title: &str, text: &str) -> DispatchOutcome {
        let response = match self
            .client
            .get(self.endpoint(token))
            .query(&[("text", title), ("desp", text)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DispatchOutcome::Exception(e.to_string()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return DispatchOutcome::TransportFailure {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            };
        }

        match response.json::<ProviderReply>().await {
            Ok(reply) if reply.errcode == 0 => DispatchOutcome::Success,
            Ok(reply) => DispatchOutcome::ProviderRejected {
                code: reply.errcode,
                message: reply.errmsg,
            },
            Err(e) if e.is_decode() => {
                tracing::debug!(error = %e, "Provider reply is not a valid send result");
                DispatchOutcome::NoResponse
            }
            Err(e) => DispatchOutcome::Exception(e.to_string()),
        }
    }
}

#[async_trait]
impl NotificationClient for IyuuClient {
    async fn send(&self, token: &str, title: &str, text: &str) -> DispatchOutcome {
        let outcome = self.request(token, title, text).await;
        let token = mask_token(token);

        match &outcome {
            DispatchOutcome::Success => {
                tracing::info!(token = %token, "IYUU message sent");
            }
            DispatchOutcome::Exception(detail) => {
                tracing::error!(token = %token, error = %detail, "IYUU request failed");
            }
            other => {
                tracing::warn!(token = %token, outcome = %other, "IYUU message not delivered");
            }
        }

        outcome
    }
}

/// Shorten a token for logging: first four characters followed by `***`.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("IYUU12345ABCDEF"), "IYUU***");
        assert_eq!(mask_token("ab"), "ab***");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = IyuuClient::new("https://iyuu.cn/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint("IYUU1"), "https://iyuu.cn/IYUU1.send");
    }

    #[test]
    fn test_outcome_display() {
        let outcome = DispatchOutcome::ProviderRejected {
            code: 404,
            message: "token invalid".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "provider rejected (errcode 404): token invalid"
        );
        assert!(!outcome.is_success());
        assert!(DispatchOutcome::Success.is_success());
    }
}
