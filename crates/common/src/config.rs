use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::types::NotificationType;

/// Default minimum spacing between send cycles (6 minutes).
///
/// The provider allows roughly 20 messages per hour per account, shared by all
/// tokens configured here.
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 360;

/// Default pause between two recipients of the same message.
pub const DEFAULT_RECIPIENT_DELAY_SECS: u64 = 5;

/// Default request timeout for the provider call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://iyuu.cn";

/// Settings as saved by the host's configuration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub enabled: bool,
    /// Comma-separated recipient tokens, e.g. `IYUU123,IYUU456`.
    #[serde(default)]
    pub tokens: String,
    /// Names of enabled notification types. Empty enables all of them.
    #[serde(default)]
    pub msgtypes: Vec<String>,
}

/// Resolved relay configuration, immutable for the worker's lifetime.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub enabled: bool,

    /// Recipient tokens in configured order, blanks removed.
    pub tokens: Vec<String>,

    /// Enabled notification types (empty = all enabled)
    pub enabled_types: HashSet<NotificationType>,

    /// Minimum spacing between consecutive send cycles (default: 360s)
    pub send_interval: Duration,

    /// Pause after each recipient send (default: 5s)
    pub recipient_delay: Duration,

    /// Provider endpoint root, without trailing slash
    pub provider_base_url: String,

    /// Timeout for a single provider request (default: 20s)
    pub http_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tokens: Vec::new(),
            enabled_types: HashSet::new(),
            send_interval: Duration::from_secs(DEFAULT_SEND_INTERVAL_SECS),
            recipient_delay: Duration::from_secs(DEFAULT_RECIPIENT_DELAY_SECS),
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl RelayConfig {
    /// Build a configuration from host form settings, keeping default timings.
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, RelayError> {
        Ok(Self {
            enabled: settings.enabled,
            tokens: parse_tokens(&settings.tokens),
            enabled_types: parse_msgtypes(&settings.msgtypes)?,
            ..Self::default()
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let msgtypes: Vec<String> = std::env::var("RELAY_MSGTYPES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            enabled: std::env::var("RELAY_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RELAY_ENABLED must be true or false"))?,
            tokens: parse_tokens(&std::env::var("IYUU_TOKENS").unwrap_or_default()),
            enabled_types: parse_msgtypes(&msgtypes)?,
            send_interval: Duration::from_secs(
                std::env::var("RELAY_SEND_INTERVAL_SECS")
                    .unwrap_or_else(|_| DEFAULT_SEND_INTERVAL_SECS.to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("RELAY_SEND_INTERVAL_SECS must be a valid u64"))?,
            ),
            recipient_delay: Duration::from_secs(
                std::env::var("RELAY_RECIPIENT_DELAY_SECS")
                    .unwrap_or_else(|_| DEFAULT_RECIPIENT_DELAY_SECS.to_string())
                    .parse()
                    .map_err(|_| {
                        anyhow::anyhow!("RELAY_RECIPIENT_DELAY_SECS must be a valid u64")
                    })?,
            ),
            provider_base_url: std::env::var("IYUU_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            http_timeout: Duration::from_secs(
                std::env::var("RELAY_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("RELAY_HTTP_TIMEOUT_SECS must be a valid u64"))?,
            ),
        })
    }

    /// True when the relay is enabled and has at least one recipient.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.tokens.is_empty()
    }

    /// Whether messages of `msg_type` may be delivered.
    ///
    /// Untyped messages and an empty enabled set always pass.
    pub fn allows(&self, msg_type: Option<NotificationType>) -> bool {
        match msg_type {
            Some(t) if !self.enabled_types.is_empty() => self.enabled_types.contains(&t),
            _ => true,
        }
    }
}

/// Split a comma-separated token list, dropping blank segments.
pub fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_msgtypes(names: &[String]) -> Result<HashSet<NotificationType>, RelayError> {
    names.iter().map(|n| n.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens_skips_blank_segments() {
        assert_eq!(parse_tokens("A,,B"), vec!["A", "B"]);
        assert_eq!(parse_tokens(" IYUU1 , ,IYUU2,"), vec!["IYUU1", "IYUU2"]);
        assert!(parse_tokens("").is_empty());
    }

    #[test]
    fn test_from_settings_defaults() {
        let config = RelayConfig::from_settings(&RelaySettings::default()).unwrap();
        assert!(!config.enabled);
        assert!(!config.is_active());
        assert_eq!(config.send_interval, Duration::from_secs(360));
        assert_eq!(config.recipient_delay, Duration::from_secs(5));
        assert_eq!(config.provider_base_url, "https://iyuu.cn");
    }

    #[test]
    fn test_is_active_requires_tokens() {
        let settings = RelaySettings {
            enabled: true,
            tokens: ",,".to_string(),
            msgtypes: vec![],
        };
        let config = RelayConfig::from_settings(&settings).unwrap();
        assert!(!config.is_active());

        let settings = RelaySettings {
            tokens: "IYUU1".to_string(),
            ..settings
        };
        assert!(RelayConfig::from_settings(&settings).unwrap().is_active());
    }

    #[test]
    fn test_unknown_msgtype_rejected() {
        let settings = RelaySettings {
            enabled: true,
            tokens: "IYUU1".to_string(),
            msgtypes: vec!["Download".to_string(), "Bogus".to_string()],
        };
        assert!(matches!(
            RelayConfig::from_settings(&settings),
            Err(RelayError::Config(_))
        ));
    }

    #[test]
    fn test_allows_type_filter() {
        let mut config = RelayConfig::default();
        assert!(config.allows(Some(NotificationType::Download)));
        assert!(config.allows(None));

        config.enabled_types.insert(NotificationType::Organize);
        assert!(config.allows(Some(NotificationType::Organize)));
        assert!(!config.allows(Some(NotificationType::Download)));
        assert!(config.allows(None));
    }

    #[test]
    fn test_settings_deserialize_with_missing_fields() {
        let settings: RelaySettings =
            serde_json::from_value(serde_json::json!({ "enabled": true })).unwrap();
        assert!(settings.enabled);
        assert!(settings.tokens.is_empty());
        assert!(settings.msgtypes.is_empty());
    }
}
