use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Categories of notifications emitted by the host application.
///
/// The variant name (see [`NotificationType::name`]) is the identifier used in
/// the `msgtypes` setting; the label is what the host shows to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    Download,
    Organize,
    Subscribe,
    SiteMessage,
    MediaServer,
    Manual,
    Plugin,
    Other,
}

impl NotificationType {
    /// Every variant, in display order.
    pub const ALL: [NotificationType; 8] = [
        NotificationType::Download,
        NotificationType::Organize,
        NotificationType::Subscribe,
        NotificationType::SiteMessage,
        NotificationType::MediaServer,
        NotificationType::Manual,
        NotificationType::Plugin,
        NotificationType::Other,
    ];

    /// Identifier used in configuration (`msgtypes`).
    pub fn name(&self) -> &'static str {
        match self {
            NotificationType::Download => "Download",
            NotificationType::Organize => "Organize",
            NotificationType::Subscribe => "Subscribe",
            NotificationType::SiteMessage => "SiteMessage",
            NotificationType::MediaServer => "MediaServer",
            NotificationType::Manual => "Manual",
            NotificationType::Plugin => "Plugin",
            NotificationType::Other => "Other",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::Download => "Resource download",
            NotificationType::Organize => "Library organize",
            NotificationType::Subscribe => "Subscription",
            NotificationType::SiteMessage => "Site message",
            NotificationType::MediaServer => "Media server",
            NotificationType::Manual => "Manual handling",
            NotificationType::Plugin => "Plugin",
            NotificationType::Other => "Other",
        }
    }

    /// `(label, name)` pairs for building a message-type selector.
    pub fn options() -> Vec<(&'static str, &'static str)> {
        Self::ALL.iter().map(|t| (t.label(), t.name())).collect()
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| RelayError::Config(format!("unknown notification type: {s}")))
    }
}

/// A notification event handed over by the host, queued for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Explicit delivery channel. Channel-routed messages are not handled here.
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "type")]
    pub msg_type: Option<NotificationType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    /// True when at least one of title or text is non-empty.
    pub fn has_content(&self) -> bool {
        !is_blank(&self.title) || !is_blank(&self.text)
    }

    /// True when the message names an explicit channel and must bypass this relay.
    pub fn is_channel_routed(&self) -> bool {
        !is_blank(&self.channel)
    }

    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}
