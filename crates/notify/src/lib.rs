//! Forum-event notifier for Telegram channels.
//!
//! Turns an arbitrary-length, possibly markup-laden forum post into a bounded
//! sequence of Bot API `sendMessage` calls: sanitize → chunk → dispatch in
//! order, with a fixed pause between chunks and an optional append-only log of
//! per-chunk outcomes. Delivery is best-effort: nothing in this crate ever
//! propagates an error back to the event that triggered the notification.

pub mod api;
pub mod chunk;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod notifier;
pub mod sanitize;

pub use {
    api::BotApi,
    chunk::{MessageSegment, chunk},
    config::{LogConfig, NotifierConfig},
    dispatch::Dispatcher,
    log::{DispatchLog, DispatchOutcome, FileDispatchLog, SendResult},
    notifier::{ChannelBinding, ForumNotifier, ForumPost, NotificationKind},
    sanitize::FormattingMode,
};
