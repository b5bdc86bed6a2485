//! Transient user-visible notices.

use std::time::Duration;
use tokio::time::Instant;

/// How long a notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    posted_at: Instant,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Holds at most one notice. Posting replaces whatever is shown, and a
/// notice dismisses itself once its TTL has elapsed.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_NOTICE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.post(NoticeKind::Success, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.post(NoticeKind::Error, text.into());
    }

    fn post(&mut self, kind: NoticeKind, text: String) {
        self.current = Some(Notice {
            kind,
            text,
            posted_at: Instant::now(),
        });
    }

    /// The visible notice, if one was posted less than the TTL ago.
    pub fn current(&self) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|notice| notice.posted_at.elapsed() < self.ttl)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
