use crate::domain::types::Verdict;

/// Opaque id for one timeline cell, minted by the page adapter. The adapter
/// tags the live DOM node with it so block automation can find the cell again
/// after the timeline has been scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Pending,
    Analyzing,
    Safe,
    Hate,
    Blocked,
    Error,
}

impl ReplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyStatus::Pending => "pending",
            ReplyStatus::Analyzing => "analyzing",
            ReplyStatus::Safe => "safe",
            ReplyStatus::Hate => "hate",
            ReplyStatus::Blocked => "blocked",
            ReplyStatus::Error => "error",
        }
    }

    /// Statuses that no longer change: the record has been through the
    /// classifier (and the blocker, where it applied).
    pub fn is_final(&self) -> bool {
        !matches!(self, ReplyStatus::Pending | ReplyStatus::Analyzing)
    }
}

#[derive(Debug, Clone)]
pub struct ReplyRecord {
    pub cell: CellHandle,
    pub username: String,
    pub text: String,
    pub status: ReplyStatus,
    pub verdict: Option<Verdict>,
}

impl ReplyRecord {
    pub fn new(cell: CellHandle, username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            cell,
            username: username.into(),
            text: text.into(),
            status: ReplyStatus::Pending,
            verdict: None,
        }
    }
}
