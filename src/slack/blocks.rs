//! Slack Block Kit builders and fixed reply strings.
//!
//! The confirmation flow carries all of its state inside these blocks:
//! the original message text rides on the trigger button's value and the
//! revised summary comes back through the input block's submitted state.

use slack_morphism::prelude::{
    SlackActionBlockElement, SlackActionId, SlackActionsBlock, SlackBlock, SlackBlockButtonElement,
    SlackBlockButtonStyle, SlackBlockId, SlackBlockPlainTextInputElement, SlackBlockPlainTextOnly,
    SlackBlockText,
    SlackInputBlock, SlackInputBlockElement, SlackSectionBlock,
};

/// Action ID of the confirmation button that triggers the incident.
pub const ACTION_TRIGGER_ALERT: &str = "trigger_alert";
/// Action ID of the confirmation button that cancels the request.
pub const ACTION_CANCEL_ALERT: &str = "cancel_alert";
/// Block ID of the input block carrying the revised summary.
pub const BLOCK_ALERT_DETAILS: &str = "alert_details";
/// Action ID of the plain-text input element inside the details block.
pub const ACTION_ALERT_SUMMARY: &str = "alert_summary";

/// Summary used when the confirmation input was left empty.
pub const DEFAULT_SUMMARY: &str = "No details provided";

/// Reply when the incident client yields no result.
pub const TRIGGER_FAILED_MESSAGE: &str =
    "Failed to trigger PagerDuty alert. Please try again later.";
/// Reply to `/escalate` from a channel outside the allow-list.
pub const CHANNEL_REFUSAL_MESSAGE: &str = "Sorry, this command is not available in this channel.";
/// Reply to `/escalate` invoked without any text.
pub const USAGE_MESSAGE: &str =
    "Please provide details with the command, e.g., `/escalate Database is down`";
/// Reply after the cancel button is pressed.
pub const CANCELED_MESSAGE: &str = "Alert canceled.";

/// Short text shown alongside the confirmation blocks.
pub const CONFIRM_PROMPT_TEXT: &str = "Do you want to trigger a PagerDuty alert?";

/// Build a plain markdown section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Build the ephemeral confirmation prompt.
///
/// Contains a section explaining the consequence, a multiline input for
/// revising the summary, and Trigger/Cancel buttons. The original message
/// text is embedded as the trigger button's value so no state has to be
/// kept in process memory.
#[must_use]
pub fn confirmation_prompt(original_text: &str) -> Vec<SlackBlock> {
    let section = text_section(
        "Do you want to trigger a PagerDuty alert? This will page the on-call team.",
    );

    let input_element =
        SlackBlockPlainTextInputElement::new(SlackActionId(ACTION_ALERT_SUMMARY.to_owned()))
            .with_multiline(true)
            .with_placeholder(SlackBlockPlainTextOnly::from("Describe the issue..."));
    let input: SlackBlock = SlackInputBlock::new(
        SlackBlockPlainTextOnly::from("Issue details"),
        SlackInputBlockElement::PlainTextInput(input_element),
    )
    .with_block_id(SlackBlockId(BLOCK_ALERT_DETAILS.to_owned()))
    .into();

    let trigger_button = SlackBlockButtonElement::new(
        ACTION_TRIGGER_ALERT.into(),
        SlackBlockPlainTextOnly::from("Trigger Alert"),
    )
    .with_style(SlackBlockButtonStyle::Danger)
    .with_value(original_text.to_owned());
    let cancel_button = SlackBlockButtonElement::new(
        ACTION_CANCEL_ALERT.into(),
        SlackBlockPlainTextOnly::from("Cancel"),
    )
    .with_value("cancel".to_owned());
    let actions = SlackBlock::Actions(
        SlackActionsBlock::new(vec![
            SlackActionBlockElement::Button(trigger_button),
            SlackActionBlockElement::Button(cancel_button),
        ])
        .with_block_id(SlackBlockId("alert_actions".to_owned())),
    );

    vec![section, input, actions]
}

/// Format the reply posted after a successful trigger.
#[must_use]
pub fn alert_triggered_message(user_name: &str, incident_id: &str, summary: &str) -> String {
    format!(
        "\u{1f6a8} PagerDuty alert triggered by {user_name}.\n\
         Incident ID: {incident_id}\n\
         Summary: {summary}"
    )
}
