//! Status reporting.
//!
//! Workflows talk to the user only through a [`StatusReporter`]. What a
//! reporter does with a message (render, log, collect) is its own business.

use std::time::Duration;

/// How long success messages stay visible in interactive front ends.
pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_secs(8);

/// Where a message belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Wallet,
    Register,
    Send,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Wallet => "wallet",
            Channel::Register => "register",
            Channel::Send => "send",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Loading,
    Success,
    Error,
}

impl Severity {
    /// Delay after which a message of this severity should disappear, if any.
    pub fn auto_dismiss(&self) -> Option<Duration> {
        match self {
            Severity::Success => Some(SUCCESS_DISMISS_AFTER),
            Severity::Loading | Severity::Error => None,
        }
    }
}

/// Receives user-facing status updates.
pub trait StatusReporter: Send + Sync {
    fn report(&self, channel: Channel, severity: Severity, message: &str);
}

/// Reporter that turns every update into a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, channel: Channel, severity: Severity, message: &str) {
        match severity {
            Severity::Loading => tracing::info!(channel = %channel, "{message}"),
            Severity::Success => tracing::info!(channel = %channel, success = true, "{message}"),
            Severity::Error => tracing::error!(channel = %channel, "{message}"),
        }
    }
}
