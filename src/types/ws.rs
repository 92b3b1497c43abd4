use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user account updates.
pub const USER_CHANNEL: &str = "user";
/// Mid prices for every coin.
pub const ALL_MIDS_CHANNEL: &str = "allMids";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionMethod {
    Subscribe,
    Unsubscribe,
}

/// Channel selector inside a subscription frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "type")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Outgoing subscribe/unsubscribe frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub method: SubscriptionMethod,
    pub subscription: Subscription,
}

impl SubscriptionRequest {
    pub fn subscribe(channel: &str, user: Option<&str>) -> Self {
        Self::new(SubscriptionMethod::Subscribe, channel, user)
    }

    pub fn unsubscribe(channel: &str, user: Option<&str>) -> Self {
        Self::new(SubscriptionMethod::Unsubscribe, channel, user)
    }

    fn new(method: SubscriptionMethod, channel: &str, user: Option<&str>) -> Self {
        Self {
            method,
            subscription: Subscription {
                channel: channel.to_string(),
                user: user.map(str::to_string),
            },
        }
    }
}

/// Incoming frame. The payload is routed by channel name and left opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundMessage {
    pub fn is_channel(&self, channel: &str) -> bool {
        self.channel == channel
    }
}

/// Realtime connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No address supplied, no socket
    Idle,
    Connecting,
    Connected,
    /// Waiting out the fixed delay before the next attempt
    ReconnectPending,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::ReconnectPending => "reconnect_pending",
        };
        f.write_str(name)
    }
}
