//! Channel allow-list resolution and membership checks.
//!
//! The configured allow-list may mix canonical channel IDs with
//! human-readable names. Names are resolved once at startup through a
//! directory lookup; the resulting ID set is immutable afterwards.

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::Result;

/// One entry from a channel directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Canonical channel ID.
    pub id: String,
    /// Channel name, when the directory reports one.
    pub name: Option<String>,
}

/// Directory lookup seam so resolution is testable without a live
/// Slack session.
pub trait ChannelDirectory {
    /// List the channels visible to the bot.
    fn list_channels(&self) -> impl std::future::Future<Output = Result<Vec<ChannelEntry>>> + Send;
}

/// Immutable set of allowed channel IDs, built once at startup.
///
/// An empty set means "no restriction, all channels allowed" — this is an
/// explicit invariant, not an accident of the empty set.
#[derive(Debug, Clone, Default)]
pub struct AllowedChannels {
    ids: HashSet<String>,
}

impl AllowedChannels {
    /// Build an allow-list directly from canonical IDs (used by tests).
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve configured entries into a set of canonical channel IDs.
    ///
    /// - An empty list, or a list holding exactly one empty string (the
    ///   shape produced by splitting an unset variable), yields the empty
    ///   allow-all set.
    /// - Entries with the canonical `C` prefix are added verbatim.
    /// - Other entries are looked up by exact, case-sensitive name; the
    ///   first match in directory order wins. Unresolved names are warned
    ///   about and dropped.
    /// - A directory failure is logged per entry and never aborts
    ///   resolution of the remaining entries.
    pub async fn resolve(entries: &[String], directory: &impl ChannelDirectory) -> Self {
        if entries.is_empty() || (entries.len() == 1 && entries[0].is_empty()) {
            info!("No channel restrictions configured");
            return Self::default();
        }

        info!(?entries, "resolving allowed channels");
        let mut ids = HashSet::new();

        for entry in entries {
            if entry.starts_with('C') {
                ids.insert(entry.clone());
                continue;
            }
            if entry.is_empty() {
                continue;
            }

            match directory.list_channels().await {
                Ok(channels) => {
                    let matched = channels
                        .into_iter()
                        .find(|channel| channel.name.as_deref() == Some(entry.as_str()));
                    if let Some(channel) = matched {
                        info!(name = %entry, id = %channel.id, "resolved channel name");
                        ids.insert(channel.id);
                    } else {
                        warn!(name = %entry, "could not find channel with name");
                    }
                }
                Err(err) => {
                    error!(name = %entry, %err, "error looking up channel");
                }
            }
        }

        info!(?ids, "allowed channel IDs");
        Self { ids }
    }

    /// Whether a channel may originate alert requests.
    ///
    /// True iff the set is empty (no restriction) or the ID is a member.
    #[must_use]
    pub fn is_allowed(&self, channel_id: &str) -> bool {
        self.ids.is_empty() || self.ids.contains(channel_id)
    }

    /// Number of resolved channel IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the allow-list imposes no restriction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
