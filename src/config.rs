//! Secret and settings loading.
//!
//! Secrets are resolved from mounted files first (the Kubernetes
//! convention: one file per secret under the secrets directory), falling
//! back to environment variables of the same name for local development.

use std::env;
use std::fs;
use std::path::Path;

use crate::{AppError, Result};

/// Default mount point for secret files in a cluster deployment.
pub const DEFAULT_SECRETS_DIR: &str = "/etc/secrets";

/// Runtime configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slack bot user token (`xoxb-…`), required.
    pub slack_bot_token: String,
    /// Slack app-level token for Socket Mode (`xapp-…`), required.
    pub slack_app_token: String,
    /// `PagerDuty` Events API v2 routing key. Absence is not a startup
    /// error; the incident client fails closed per call instead.
    pub pagerduty_integration_key: Option<String>,
    /// Verbose logging flag.
    pub debug: bool,
    /// Raw allow-list entries from `ALLOWED_CHANNELS` (comma-separated
    /// channel IDs or names). An unset variable yields a single empty
    /// entry, which the resolver treats as "no restriction".
    pub allowed_channels: Vec<String>,
}

impl Config {
    /// Load configuration from a secrets directory, falling back to the
    /// environment per secret.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if either Slack token is missing.
    pub fn load_from(secrets_dir: &Path) -> Result<Self> {
        let slack_bot_token = read_secret(secrets_dir, "SLACK_BOT_TOKEN")
            .ok_or_else(|| AppError::Config("SLACK_BOT_TOKEN must be provided".into()))?;
        let slack_app_token = read_secret(secrets_dir, "SLACK_APP_TOKEN")
            .ok_or_else(|| AppError::Config("SLACK_APP_TOKEN must be provided".into()))?;
        let pagerduty_integration_key = read_secret(secrets_dir, "PAGERDUTY_INTEGRATION_KEY");

        Ok(Self {
            slack_bot_token,
            slack_app_token,
            pagerduty_integration_key,
            debug: debug_flag(),
            allowed_channels: allowed_channels_from_env(),
        })
    }
}

/// Whether the `DEBUG` environment variable requests verbose logging.
#[must_use]
pub fn debug_flag() -> bool {
    env::var("DEBUG").is_ok_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Split the `ALLOWED_CHANNELS` environment variable on commas.
///
/// An unset or empty variable produces a single empty entry, which the
/// allow-list resolver interprets as "all channels allowed".
#[must_use]
pub fn allowed_channels_from_env() -> Vec<String> {
    env::var("ALLOWED_CHANNELS")
        .unwrap_or_default()
        .split(',')
        .map(str::to_owned)
        .collect()
}

/// Resolve a secret by name: mounted file first, then environment.
///
/// File contents are trimmed of surrounding whitespace (mounted secrets
/// commonly carry a trailing newline).
fn read_secret(secrets_dir: &Path, name: &str) -> Option<String> {
    let path = secrets_dir.join(name);
    if path.exists() {
        if let Ok(contents) = fs::read_to_string(&path) {
            return Some(contents.trim().to_owned()).filter(|s| !s.is_empty());
        }
    }
    env::var(name).ok().filter(|s| !s.is_empty())
}
