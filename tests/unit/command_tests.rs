//! Unit tests for the `/escalate` command handler.
//!
//! Events are deserialised from their wire shape and dispatched through
//! the real handler, with shared state injected the same way the Socket
//! Mode listener environment does it. No routing key is configured, so a
//! reply other than the expected refusal or usage hint would expose an
//! unwanted trip into the incident path.

use std::sync::Arc;

use pager_relay::config::Config;
use pager_relay::slack::blocks;
use pager_relay::slack::channels::AllowedChannels;
use pager_relay::slack::client::{BotState, SlackService};
use pager_relay::slack::commands;
use serde_json::json;
use slack_morphism::prelude::{
    SlackClient, SlackClientEventsListenerEnvironment, SlackClientEventsUserState,
    SlackClientHyperHttpsConnector, SlackCommandEvent,
};

fn test_config() -> Config {
    Config {
        slack_bot_token: "xoxb-test".into(),
        slack_app_token: "xapp-test".into(),
        pagerduty_integration_key: None,
        debug: false,
        allowed_channels: vec!["C111".into()],
    }
}

fn slack_client() -> Arc<SlackClient<SlackClientHyperHttpsConnector>> {
    let connector = SlackClientHyperHttpsConnector::new().expect("https connector");
    Arc::new(SlackClient::new(connector))
}

fn bot_state(allowed: AllowedChannels) -> Arc<BotState> {
    let slack = Arc::new(SlackService::new("xoxb-test").expect("slack service"));
    Arc::new(BotState::new(Arc::new(test_config()), allowed, slack).expect("bot state"))
}

fn user_state(app: &Arc<BotState>) -> SlackClientEventsUserState {
    let env = SlackClientEventsListenerEnvironment::new(slack_client())
        .with_user_state(Arc::clone(app));
    env.user_state.clone()
}

fn command_event(command: &str, channel: &str, text: &str) -> SlackCommandEvent {
    serde_json::from_value(json!({
        "team_id": "T123",
        "team_domain": "example",
        "channel_id": channel,
        "channel_name": "incidents",
        "user_id": "U123",
        "user_name": "tester",
        "command": command,
        "text": text,
        "api_app_id": "A123",
        "response_url": "https://hooks.slack.com/commands/T123/456/abc",
        "trigger_id": "123.456.abc"
    }))
    .expect("command event deserialises")
}

#[tokio::test]
async fn disallowed_channel_gets_refusal_without_triggering() {
    let app = bot_state(AllowedChannels::from_ids(["C111"]));
    let event = command_event("/escalate", "C999", "database is down");

    let response = commands::handle_command(event, slack_client(), user_state(&app))
        .await
        .expect("handler never fails");

    assert_eq!(
        response.content.text.as_deref(),
        Some(blocks::CHANNEL_REFUSAL_MESSAGE)
    );
}

#[tokio::test]
async fn empty_text_gets_usage_hint_without_triggering() {
    let app = bot_state(AllowedChannels::from_ids(["C111"]));
    let event = command_event("/escalate", "C111", "");

    let response = commands::handle_command(event, slack_client(), user_state(&app))
        .await
        .expect("handler never fails");

    assert_eq!(
        response.content.text.as_deref(),
        Some(blocks::USAGE_MESSAGE)
    );
}

#[tokio::test]
async fn unknown_command_gets_usage_hint() {
    let app = bot_state(AllowedChannels::from_ids(["C111"]));
    let event = command_event("/deploy", "C111", "anything");

    let response = commands::handle_command(event, slack_client(), user_state(&app))
        .await
        .expect("handler never fails");

    assert_eq!(
        response.content.text.as_deref(),
        Some(blocks::USAGE_MESSAGE)
    );
}

/// A well-formed invocation must be acknowledged with an empty body right
/// away; the lookup and trigger continue in the background and report
/// through the `response_url`.
#[tokio::test]
async fn valid_invocation_acks_with_empty_body() {
    let app = bot_state(AllowedChannels::from_ids(["C111"]));
    let event = command_event("/escalate", "C111", "database is down");

    let response = commands::handle_command(event, slack_client(), user_state(&app))
        .await
        .expect("handler never fails");

    assert_eq!(response.content.text, None);
}
