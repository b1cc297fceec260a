//! Unit tests for channel allow-list resolution and membership.

use pager_relay::slack::channels::{AllowedChannels, ChannelDirectory, ChannelEntry};
use pager_relay::{AppError, Result};

/// Directory returning a fixed listing.
struct StaticDirectory {
    channels: Vec<ChannelEntry>,
}

impl ChannelDirectory for StaticDirectory {
    async fn list_channels(&self) -> Result<Vec<ChannelEntry>> {
        Ok(self.channels.clone())
    }
}

/// Directory whose lookups always fail with a transport error.
struct FailingDirectory;

impl ChannelDirectory for FailingDirectory {
    async fn list_channels(&self) -> Result<Vec<ChannelEntry>> {
        Err(AppError::Slack("connection reset".into()))
    }
}

fn entry(id: &str, name: &str) -> ChannelEntry {
    ChannelEntry {
        id: id.to_owned(),
        name: Some(name.to_owned()),
    }
}

#[tokio::test]
async fn empty_config_allows_every_channel() {
    let directory = StaticDirectory { channels: vec![] };
    let allowed = AllowedChannels::resolve(&[], &directory).await;

    assert!(allowed.is_empty());
    assert!(allowed.is_allowed("C000"));
    assert!(allowed.is_allowed("CANY"));
}

/// Splitting an unset `ALLOWED_CHANNELS` yields one empty string; that
/// shape must also mean "no restriction".
#[tokio::test]
async fn single_empty_entry_allows_every_channel() {
    let directory = StaticDirectory { channels: vec![] };
    let allowed = AllowedChannels::resolve(&[String::new()], &directory).await;

    assert!(allowed.is_empty());
    assert!(allowed.is_allowed("C123"));
}

#[tokio::test]
async fn id_entries_bypass_the_directory() {
    // FailingDirectory proves no lookup happens for C-prefixed entries.
    let allowed =
        AllowedChannels::resolve(&["C123".to_owned(), "C456".to_owned()], &FailingDirectory).await;

    assert_eq!(allowed.len(), 2);
    assert!(allowed.is_allowed("C123"));
    assert!(allowed.is_allowed("C456"));
    assert!(!allowed.is_allowed("C789"));
}

#[tokio::test]
async fn names_resolve_to_first_exact_match() {
    let directory = StaticDirectory {
        channels: vec![
            entry("C111", "general"),
            entry("C222", "incidents"),
            entry("C333", "incidents"),
        ],
    };
    let allowed = AllowedChannels::resolve(&["incidents".to_owned()], &directory).await;

    assert!(allowed.is_allowed("C222"), "first match in listing order wins");
    assert!(!allowed.is_allowed("C333"));
}

#[tokio::test]
async fn name_matching_is_case_sensitive() {
    let directory = StaticDirectory {
        channels: vec![entry("C111", "Incidents")],
    };
    let allowed = AllowedChannels::resolve(&["incidents".to_owned()], &directory).await;

    assert!(allowed.is_empty(), "case-mismatched name must not resolve");
}

#[tokio::test]
async fn unresolved_names_are_dropped_without_failing() {
    let directory = StaticDirectory {
        channels: vec![entry("C111", "general")],
    };
    let allowed = AllowedChannels::resolve(
        &["no-such-channel".to_owned(), "C999".to_owned()],
        &directory,
    )
    .await;

    assert_eq!(allowed.len(), 1);
    assert!(allowed.is_allowed("C999"));
}

/// A lookup failure is contained to its entry; later entries still resolve.
#[tokio::test]
async fn lookup_errors_do_not_abort_remaining_entries() {
    let allowed = AllowedChannels::resolve(
        &["broken-name".to_owned(), "C123".to_owned()],
        &FailingDirectory,
    )
    .await;

    assert_eq!(allowed.len(), 1);
    assert!(allowed.is_allowed("C123"));
    assert!(!allowed.is_allowed("CBROKEN"));
}

#[tokio::test]
async fn empty_entries_among_others_are_skipped() {
    let directory = StaticDirectory { channels: vec![] };
    let allowed = AllowedChannels::resolve(
        &["C123".to_owned(), String::new(), "C456".to_owned()],
        &directory,
    )
    .await;

    assert_eq!(allowed.len(), 2);
    assert!(!allowed.is_allowed(""));
}

#[test]
fn membership_is_exact_for_non_empty_sets() {
    let allowed = AllowedChannels::from_ids(["C1", "C2"]);

    assert!(allowed.is_allowed("C1"));
    assert!(allowed.is_allowed("C2"));
    assert!(!allowed.is_allowed("C3"));
    assert!(!allowed.is_allowed("c1"));
}
