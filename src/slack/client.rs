//! Slack Socket Mode service and shared bot state.

use std::sync::Arc;

use regex::Regex;
use slack_morphism::prelude::{
    SlackApiChatPostEphemeralRequest, SlackApiConversationsListRequest, SlackApiToken,
    SlackApiTokenType, SlackApiTokenValue, SlackApiUsersInfoRequest, SlackBlock, SlackChannelId,
    SlackClient, SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector,
    SlackClientSession, SlackClientSocketModeConfig, SlackClientSocketModeListener,
    SlackMessageContent, SlackSocketModeListenerCallbacks, SlackUserId,
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::pagerduty::PagerDutyClient;
use crate::slack::channels::{AllowedChannels, ChannelDirectory, ChannelEntry};
use crate::slack::{commands, events};
use crate::{AppError, Result};

/// Case-insensitive trigger words that start the confirmation flow.
const KEYWORD_PATTERN: &str = "(?i)(alert|trigger|escalate|page)";

/// Compile the trigger-word matcher.
///
/// # Errors
///
/// Returns `AppError::Config` if the pattern fails to compile.
pub fn keyword_matcher() -> Result<Regex> {
    Regex::new(KEYWORD_PATTERN)
        .map_err(|err| AppError::Config(format!("invalid keyword pattern: {err}")))
}

/// Shared state handed to every Socket Mode callback.
///
/// Read-only after startup; handlers never mutate it.
pub struct BotState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Resolved channel allow-list.
    pub allowed: AllowedChannels,
    /// Incident client.
    pub pagerduty: PagerDutyClient,
    /// Slack API helper used by handlers for directory lookups and
    /// ephemeral posts.
    pub slack: Arc<SlackService>,
    /// HTTP client for posting to interaction `response_url`s.
    pub http: reqwest::Client,
    /// Compiled keyword matcher.
    pub keywords: Regex,
}

impl BotState {
    /// Assemble the shared state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keyword pattern fails to compile.
    pub fn new(
        config: Arc<Config>,
        allowed: AllowedChannels,
        slack: Arc<SlackService>,
    ) -> Result<Self> {
        let keywords = keyword_matcher()?;
        let pagerduty = PagerDutyClient::new(config.pagerduty_integration_key.clone());
        Ok(Self {
            config,
            allowed,
            pagerduty,
            slack,
            http: reqwest::Client::new(),
            keywords,
        })
    }
}

/// Slack client wrapper owning the bot token.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
}

impl SlackService {
    /// Create the HTTPS client and wrap the bot token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn new(bot_token: &str) -> Result<Self> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(bot_token.to_owned()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        Ok(Self { client, bot_token })
    }

    fn session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Post an ephemeral message (visible only to `user`) into `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the Slack API call fails.
    pub async fn post_ephemeral(
        &self,
        channel: SlackChannelId,
        user: SlackUserId,
        text: &str,
        blocks: Vec<SlackBlock>,
    ) -> Result<()> {
        let content = SlackMessageContent::new()
            .with_text(text.to_owned())
            .with_blocks(blocks);
        let request = SlackApiChatPostEphemeralRequest::new(channel, user, content);
        self.session()
            .chat_post_ephemeral(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to post ephemeral: {err}")))?;
        Ok(())
    }

    /// Resolve a user's display name via `users.info`.
    ///
    /// Falls back through real name, then handle, then `"Unknown"` for
    /// missing fields; a failed lookup yields `"Unknown User"`. Never
    /// returns an error.
    pub async fn user_display_name(&self, user_id: &SlackUserId) -> String {
        let request = SlackApiUsersInfoRequest::new(user_id.clone());
        match self.session().users_info(&request).await {
            Ok(response) => response
                .user
                .profile
                .as_ref()
                .and_then(|profile| profile.real_name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| response.user.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_owned()),
            Err(err) => {
                error!(%err, user = %user_id, "error getting user info");
                "Unknown User".to_owned()
            }
        }
    }

    /// Start the Socket Mode listener with `state` injected into every
    /// callback.
    ///
    /// The listener's error handler logs and keeps the process alive; no
    /// transport error escapes to crash the bot.
    #[must_use]
    pub fn start_socket_mode(&self, app_token: &str, state: Arc<BotState>) -> JoinHandle<()> {
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(app_token.to_owned()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(state),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_command_events(commands::handle_command)
            .with_interaction_events(events::handle_interaction)
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }
}

impl ChannelDirectory for SlackService {
    async fn list_channels(&self) -> Result<Vec<ChannelEntry>> {
        let request = SlackApiConversationsListRequest::new();
        let response = self
            .session()
            .conversations_list(&request)
            .await
            .map_err(|err| AppError::Slack(format!("conversations.list failed: {err}")))?;
        Ok(response
            .channels
            .into_iter()
            .map(|channel| ChannelEntry {
                id: channel.id.to_string(),
                name: channel.name,
            })
            .collect())
    }
}

/// Post a plain reply to an interaction or command `response_url`.
///
/// Failures are logged and swallowed: by this point the interaction has
/// already been acknowledged, and there is no retry policy.
pub async fn respond(http: &reqwest::Client, response_url: &str, text: &str) {
    let body = serde_json::json!({
        "text": text,
        "response_type": "ephemeral",
    });
    match http.post(response_url).json(&body).send().await {
        Ok(response) if response.status().is_success() => {}
        Ok(response) => {
            warn!(status = %response.status(), "response_url post rejected");
        }
        Err(err) => {
            error!(%err, "failed to post to response_url");
        }
    }
}
