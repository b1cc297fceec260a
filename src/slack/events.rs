//! Inbound message and interaction handling.
//!
//! Free-text messages matching a trigger keyword get an ephemeral
//! confirmation prompt; button presses on that prompt either trigger the
//! incident or cancel. Flow state is entirely round-tripped through the
//! Slack payload (button value plus input state), never held in memory.

use std::sync::Arc;

use regex::Regex;
use slack_morphism::prelude::{
    SlackActionId, SlackBlockId, SlackChannelId, SlackClient, SlackClientEventsUserState,
    SlackClientHyperHttpsConnector, SlackEventCallbackBody, SlackInteractionBlockActionsEvent,
    SlackInteractionEvent, SlackMessageEvent, SlackPushEventCallback, SlackUserId,
};
use tracing::{info, warn};

use crate::slack::blocks;
use crate::slack::channels::AllowedChannels;
use crate::slack::client::{respond, BotState};

async fn bot_state(state: &SlackClientEventsUserState) -> Option<Arc<BotState>> {
    let guard = state.read().await;
    guard.get_user_state::<Arc<BotState>>().cloned()
}

/// Handle push events delivered via Socket Mode.
///
/// Only plain user messages are considered; everything else is ignored.
/// The message is processed on a spawned task so the callback returns
/// (acknowledging the envelope) without waiting on the prompt post.
///
/// # Errors
///
/// Never fails; all per-event problems are logged and swallowed.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    match event.event {
        SlackEventCallbackBody::Message(message) => {
            let Some(app) = bot_state(&state).await else {
                warn!("bot state not available; dropping message event");
                return Ok(());
            };
            tokio::spawn(async move {
                handle_message(message, &app).await;
            });
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Decide whether an inbound message should receive the confirmation
/// prompt, and where to send it.
///
/// Returns the originating channel, the user to address the ephemeral
/// prompt to, and the message text to carry on the trigger button.
/// `None` reproduces the silent-drop policy: bot chatter, edits and
/// deletes, non-keyword text, a missing channel or user, and disallowed
/// channels all produce no user-visible reply and no incident call.
#[must_use]
pub fn confirmation_target(
    message: &SlackMessageEvent,
    keywords: &Regex,
    allowed: &AllowedChannels,
) -> Option<(SlackChannelId, SlackUserId, String)> {
    if message.subtype.is_some() || message.sender.bot_id.is_some() {
        return None;
    }

    let text = message
        .content
        .as_ref()
        .and_then(|content| content.text.clone())
        .unwrap_or_default();
    if !keywords.is_match(&text) {
        return None;
    }

    info!("alert keyword matched in message");

    let Some(channel_id) = message.origin.channel.clone() else {
        warn!("channel ID is missing, cannot proceed");
        return None;
    };
    // Without a user there is no ephemeral target; drop silently rather
    // than falling back to a channel-visible reply.
    let Some(user_id) = message.sender.user.clone() else {
        warn!("user ID is missing, cannot post ephemeral message");
        return None;
    };

    if !allowed.is_allowed(&channel_id.0) {
        info!(channel = %channel_id, "ignoring message from non-allowed channel");
        return None;
    }

    Some((channel_id, user_id, text))
}

/// Start the confirmation flow for a keyword-matching message.
async fn handle_message(message: SlackMessageEvent, app: &Arc<BotState>) {
    let Some((channel_id, user_id, text)) =
        confirmation_target(&message, &app.keywords, &app.allowed)
    else {
        return;
    };

    let prompt = blocks::confirmation_prompt(&text);
    if let Err(err) = app
        .slack
        .post_ephemeral(
            channel_id.clone(),
            user_id.clone(),
            blocks::CONFIRM_PROMPT_TEXT,
            prompt,
        )
        .await
    {
        tracing::error!(%err, channel = %channel_id, user = %user_id, "error sending ephemeral");
    }
}

/// Handle interactive payloads (button presses) delivered via Socket Mode.
///
/// Recognised actions are dispatched onto spawned tasks, so this callback
/// returns (acknowledging the envelope) without waiting on the user
/// lookup, the incident call, or the `response_url` post.
///
/// # Errors
///
/// Never fails; all per-action problems are logged and swallowed.
pub async fn handle_interaction(
    event: SlackInteractionEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackInteractionEvent::BlockActions(block_event) = event else {
        info!("unhandled interaction event type");
        return Ok(());
    };

    let Some(app) = bot_state(&state).await else {
        warn!("bot state not available; dropping interaction");
        return Ok(());
    };

    let action_ids: Vec<String> = block_event
        .actions
        .as_ref()
        .map(|actions| {
            actions
                .iter()
                .map(|action| action.action_id.to_string())
                .collect()
        })
        .unwrap_or_default();

    for action_id in action_ids {
        match action_id.as_str() {
            blocks::ACTION_TRIGGER_ALERT => {
                let event = block_event.clone();
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    handle_trigger_action(&event, &app).await;
                });
            }
            blocks::ACTION_CANCEL_ALERT => {
                let event = block_event.clone();
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    handle_cancel_action(&event, &app).await;
                });
            }
            _ => warn!(action_id, "unknown action_id"),
        }
    }
    Ok(())
}

/// Trigger the incident from a confirmation prompt.
///
/// Reads the submitted summary (defaulting when left empty), resolves the
/// acting user's display name, calls the incident client, and reports the
/// outcome through the interaction's `response_url`. No idempotence key
/// ties the call back to the prompt, so a double-delivered action opens
/// two incidents.
async fn handle_trigger_action(event: &SlackInteractionBlockActionsEvent, app: &Arc<BotState>) {
    let user_id = event.user.as_ref().map(|user| user.id.clone());
    let channel_id = event.channel.as_ref().map(|channel| channel.id.to_string());

    let summary = event
        .state
        .as_ref()
        .and_then(|state| {
            state
                .values
                .get(&SlackBlockId(blocks::BLOCK_ALERT_DETAILS.to_owned()))
        })
        .and_then(|block| block.get(&SlackActionId(blocks::ACTION_ALERT_SUMMARY.to_owned())))
        .and_then(|field| field.value.clone())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| blocks::DEFAULT_SUMMARY.to_owned());

    let user_name = match user_id {
        Some(ref id) => app.slack.user_display_name(id).await,
        None => "Unknown User".to_owned(),
    };

    let user_info = serde_json::json!({
        "name": user_name,
        "id": user_id.as_ref().map(ToString::to_string),
        "channel": channel_id,
    });

    let incident = app.pagerduty.trigger_incident(&summary, &user_info, None).await;

    let reply = incident.map_or_else(
        || blocks::TRIGGER_FAILED_MESSAGE.to_owned(),
        |incident| blocks::alert_triggered_message(&user_name, &incident.id, &summary),
    );

    if let Some(ref url) = event.response_url {
        respond(&app.http, url.0.as_str(), &reply).await;
    } else {
        warn!("trigger action without response_url; dropping reply");
    }
}

/// Acknowledge a cancel press; no incident call is made.
async fn handle_cancel_action(event: &SlackInteractionBlockActionsEvent, app: &Arc<BotState>) {
    if let Some(ref url) = event.response_url {
        respond(&app.http, url.0.as_str(), blocks::CANCELED_MESSAGE).await;
    }
}
