//! Slack bridge layer modules.

pub mod blocks;
pub mod channels;
pub mod client;
pub mod commands;
pub mod events;
