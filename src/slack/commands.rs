//! `/escalate` slash command handler.
//!
//! The explicit command path deliberately skips the confirmation prompt:
//! supplying text triggers the incident immediately, while an empty
//! invocation gets a usage hint. The acknowledgement always goes back
//! within Slack's deadline; the user lookup and incident call continue in
//! a background task that reports through the command's `response_url`.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector, SlackCommandEvent,
    SlackCommandEventResponse, SlackMessageContent, SlackMessageResponseType,
};
use tracing::{info, warn};

use crate::slack::blocks;
use crate::slack::client::{respond, BotState};

/// Command string registered with the Slack app.
pub const ESCALATE_COMMAND: &str = "/escalate";

fn ephemeral(text: impl Into<String>) -> SlackCommandEventResponse {
    SlackCommandEventResponse {
        content: SlackMessageContent::new().with_text(text.into()),
        response_type: Some(SlackMessageResponseType::Ephemeral),
    }
}

fn silent_ack() -> SlackCommandEventResponse {
    SlackCommandEventResponse {
        content: SlackMessageContent::new(),
        response_type: Some(SlackMessageResponseType::Ephemeral),
    }
}

/// Handle incoming slash commands routed via Socket Mode.
///
/// The returned response is the platform acknowledgement, so it must
/// never wait on outbound HTTP. Refusals and the usage hint are pure
/// checks answered inline; the user lookup and incident call run in a
/// spawned task and report through the command's `response_url`. A
/// refusal from a disallowed channel still counts as a successful
/// invocation.
///
/// # Errors
///
/// Never fails; every outcome is reported as an ephemeral reply.
pub async fn handle_command(
    event: SlackCommandEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::AnyStdResult<SlackCommandEventResponse> {
    info!(command = ?event.command, user = ?event.user_id, "received slash command");

    let app: Option<Arc<BotState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<BotState>>().cloned()
    };
    let Some(app) = app else {
        warn!("bot state not available; cannot process command");
        return Ok(ephemeral(blocks::TRIGGER_FAILED_MESSAGE));
    };

    if event.command.0 != ESCALATE_COMMAND {
        warn!(command = ?event.command, "unknown slash command");
        return Ok(ephemeral(blocks::USAGE_MESSAGE));
    }

    if !app.allowed.is_allowed(&event.channel_id.0) {
        return Ok(ephemeral(blocks::CHANNEL_REFUSAL_MESSAGE));
    }

    if event.text.as_deref().unwrap_or_default().is_empty() {
        return Ok(ephemeral(blocks::USAGE_MESSAGE));
    }

    tokio::spawn(escalate_and_report(app, event));
    Ok(silent_ack())
}

/// Resolve the acting user, trigger the incident, and report the outcome
/// through the command's `response_url`.
async fn escalate_and_report(app: Arc<BotState>, event: SlackCommandEvent) {
    let text = event.text.unwrap_or_default();
    let user_name = app.slack.user_display_name(&event.user_id).await;
    let user_info = serde_json::json!({
        "name": user_name,
        "id": event.user_id.to_string(),
        "channel": event.channel_id.to_string(),
    });

    let reply = match app.pagerduty.trigger_incident(&text, &user_info, None).await {
        Some(incident) => blocks::alert_triggered_message(&user_name, &incident.id, &text),
        None => blocks::TRIGGER_FAILED_MESSAGE.to_owned(),
    };

    respond(&app.http, event.response_url.0.as_str(), &reply).await;
}
