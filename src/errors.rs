//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration or secret loading failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// `PagerDuty` Events API failure.
    PagerDuty(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::PagerDuty(msg) => write!(f, "pagerduty: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}
