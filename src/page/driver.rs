use anyhow::Result;
use async_trait::async_trait;

use crate::domain::CellHandle;

/// One timeline cell as the page currently shows it. `author`/`text` are
/// `None` when the cell has no tweet, no text node, or no profile link; the
/// harvester decides what to skip.
#[derive(Debug, Clone)]
pub struct ReplyCandidate {
    pub cell: CellHandle,
    pub author: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub index: usize,
    pub label: String,
}

/// Everything the scan needs from the conversation page. The orchestrator,
/// harvester and blocker only ever talk to this trait; the CDP adapter is
/// the single implementation that touches a real browser.
///
/// Errors mean the page itself is gone or unreachable. During collection
/// they end the scan; inside the block sequence the caller absorbs them.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// All cells in page order, index 0 being the conversation's own post.
    async fn reply_candidates(&self) -> Result<Vec<ReplyCandidate>>;

    async fn reply_count(&self) -> Result<usize>;

    /// Bring the last cell into view so the host page loads the next chunk.
    async fn scroll_to_last(&self) -> Result<()>;

    /// Open the context menu on a cell's tweet. `false` when the cell or its
    /// menu trigger is no longer in the DOM.
    async fn open_author_menu(&self, cell: CellHandle) -> Result<bool>;

    async fn menu_entries(&self) -> Result<Vec<MenuEntry>>;

    async fn activate_menu_entry(&self, index: usize) -> Result<bool>;

    /// Close an open context menu without selecting anything.
    async fn dismiss_menu(&self) -> Result<()>;

    /// Press the confirmation sheet's confirm control, if it is showing.
    async fn confirm_block(&self) -> Result<bool>;
}
