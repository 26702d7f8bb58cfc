use tracing::info;

use crate::{
    chunk::chunk,
    dispatch::Dispatcher,
    log::DispatchOutcome,
    sanitize::FormattingMode,
};

/// Which forum event triggered the notification. Both kinds dispatch
/// identically; the kind only shows up in logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    DiscussionCreated,
    PostCreated,
}

impl NotificationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::DiscussionCreated => "discussion_created",
            Self::PostCreated => "post_created",
        }
    }
}

/// The triggering forum record, already fetched by the host.
#[derive(Debug, Clone)]
pub struct ForumPost {
    pub subject: String,
    pub message: String,
}

impl ForumPost {
    /// Message body sent to the channel: subject, newline, message.
    #[must_use]
    pub fn compose(&self) -> String {
        format!("{}\n{}", self.subject, self.message)
    }
}

/// An already-resolved destination: the host maps its own course/forum
/// configuration to a channel id and formatting mode before calling in.
#[derive(Debug, Clone)]
pub struct ChannelBinding {
    pub channel_id: String,
    pub mode: FormattingMode,
}

/// Ties the pipeline together: compose → sanitize/chunk → dispatch.
pub struct ForumNotifier {
    dispatcher: Dispatcher,
}

impl ForumNotifier {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Notify `binding`'s channel about `post`. Best-effort: returns the
    /// per-segment outcomes and never an error.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        binding: &ChannelBinding,
        post: &ForumPost,
    ) -> Vec<DispatchOutcome> {
        let text = post.compose();
        let segments = chunk(&text, binding.mode);
        info!(
            event = kind.as_str(),
            chat_id = %binding.channel_id,
            text_len = text.chars().count(),
            segment_count = segments.len(),
            "forum notification"
        );
        self.dispatcher
            .dispatch(&binding.channel_id, &segments, binding.mode)
            .await
    }
}
