//! Log stream types.

use serde::Deserialize;

/// Source tag carried by staging-phase log lines.
pub const STAGING_SOURCE: &str = "STG";

/// One line from an application's log stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogMessage {
    /// Emitting component, e.g. `STG`, `APP`, `RTR`.
    #[serde(rename = "source_type")]
    pub source: String,
    pub message: String,
}

impl LogMessage {
    #[must_use]
    pub fn new(source: &str, message: &str) -> Self {
        Self {
            source: source.to_owned(),
            message: message.to_owned(),
        }
    }

    /// Whether the line was produced while staging.
    #[must_use]
    pub fn is_staging(&self) -> bool {
        self.source == STAGING_SOURCE
    }
}

/// Connection state of a log subscription, owned by the task tailing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    NotConnected,
    Connected,
    /// The subscription was closed on request.
    Closed,
    /// The connection deadline passed before the transport connected.
    GaveUp,
}
