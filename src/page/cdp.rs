use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::CellHandle;

use super::driver::{MenuEntry, PageDriver, ReplyCandidate};

const TIMELINE_POLL: Duration = Duration::from_millis(250);

/// Timeline adapter over a live conversation tab. All DOM access goes
/// through `Runtime.evaluate` with small synchronous snippets keyed on the
/// host page's `data-testid` attributes; cells are tagged with a
/// `data-hb-cell` attribute on first sight so later automation can find
/// them after scrolling.
pub struct CdpTimeline {
    page: Page,
}

// Returns every cell in page order. Tagging happens here so a handle stays
// valid for as long as the node itself survives.
const HARVEST_JS: &str = r#"
(() => {
  const cells = Array.from(document.querySelectorAll('[data-testid="cellInnerDiv"]'));
  if (!window.__hbCellSeq) { window.__hbCellSeq = 0; }
  return cells.map((cell) => {
    if (!cell.hasAttribute('data-hb-cell')) {
      window.__hbCellSeq += 1;
      cell.setAttribute('data-hb-cell', String(window.__hbCellSeq));
    }
    const id = Number(cell.getAttribute('data-hb-cell'));
    const tweet = cell.querySelector('[data-testid="tweet"]');
    if (!tweet) { return { cell: id, author: null, text: null }; }
    const textEl = tweet.querySelector('[data-testid="tweetText"]');
    const link = tweet.querySelector('[data-testid="User-Name"] a[href^="/"]');
    const author = link ? ((link.getAttribute('href') || '').replace('/', '') || 'unknown') : null;
    const text = textEl ? (textEl.textContent || '') : null;
    return { cell: id, author: author, text: text };
  });
})()
"#;

const REPLY_COUNT_JS: &str =
    r#"document.querySelectorAll('[data-testid="cellInnerDiv"]').length"#;

const SCROLL_TO_LAST_JS: &str = r#"
(() => {
  const cells = document.querySelectorAll('[data-testid="cellInnerDiv"]');
  if (cells.length === 0) { return false; }
  cells[cells.length - 1].scrollIntoView({ behavior: 'smooth', block: 'end' });
  return true;
})()
"#;

const MENU_ENTRIES_JS: &str = r#"
(() => Array.from(document.querySelectorAll('[role="menuitem"]'))
  .map((item, index) => ({ index: index, label: item.textContent || '' })))()
"#;

const DISMISS_MENU_JS: &str = r#"
(() => { document.body.click(); return true; })()
"#;

const CONFIRM_BLOCK_JS: &str = r#"
(() => {
  const confirm = document.querySelector('[data-testid="confirmationSheetConfirm"]');
  if (!confirm) { return false; }
  confirm.click();
  return true;
})()
"#;

const TIMELINE_READY_JS: &str = r#"
(() => {
  if (document.readyState !== 'complete') { return false; }
  if (document.querySelector('[data-testid="primaryColumn"]')) { return true; }
  return document.querySelectorAll('[data-testid="cellInnerDiv"]').length > 0;
})()
"#;

#[derive(Debug, Deserialize)]
struct CandidateRow {
    cell: u64,
    author: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MenuEntryRow {
    index: usize,
    label: String,
}

impl CdpTimeline {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Poll until the conversation column has rendered. The host app draws
    /// its shell first and streams the timeline in afterwards, so document
    /// readiness alone is not enough.
    pub async fn wait_for_timeline(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let ready: bool = self.eval(TIMELINE_READY_JS).await.unwrap_or(false);
            if ready {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(anyhow!(
                    "conversation timeline did not appear within {:?}",
                    timeout
                ));
            }
            tokio::time::sleep(TIMELINE_POLL).await;
        }
    }

    async fn eval<T: DeserializeOwned>(&self, js: impl Into<String>) -> Result<T> {
        let result = self
            .page
            .evaluate(js.into())
            .await
            .map_err(|e| anyhow!("page evaluation failed: {e}"))?;
        result
            .into_value::<T>()
            .map_err(|e| anyhow!("unexpected evaluation result: {e}"))
    }
}

#[async_trait]
impl PageDriver for CdpTimeline {
    async fn reply_candidates(&self) -> Result<Vec<ReplyCandidate>> {
        let rows: Vec<CandidateRow> = self.eval(HARVEST_JS).await?;
        Ok(rows
            .into_iter()
            .map(|row| ReplyCandidate {
                cell: CellHandle(row.cell),
                author: row.author,
                text: row.text,
            })
            .collect())
    }

    async fn reply_count(&self) -> Result<usize> {
        self.eval(REPLY_COUNT_JS).await
    }

    async fn scroll_to_last(&self) -> Result<()> {
        let scrolled: bool = self.eval(SCROLL_TO_LAST_JS).await?;
        if !scrolled {
            tracing::debug!(target: "browser", "nothing to scroll, timeline is empty");
        }
        Ok(())
    }

    async fn open_author_menu(&self, cell: CellHandle) -> Result<bool> {
        let js = format!(
            r#"(() => {{
  const cell = document.querySelector('[data-hb-cell="{id}"]');
  if (!cell) {{ return false; }}
  const tweet = cell.querySelector('[data-testid="tweet"]') || cell;
  const caret = tweet.querySelector('[data-testid="caret"]');
  if (!caret) {{ return false; }}
  caret.click();
  return true;
}})()"#,
            id = cell.0
        );
        self.eval(js).await
    }

    async fn menu_entries(&self) -> Result<Vec<MenuEntry>> {
        let rows: Vec<MenuEntryRow> = self.eval(MENU_ENTRIES_JS).await?;
        Ok(rows
            .into_iter()
            .map(|row| MenuEntry {
                index: row.index,
                label: row.label,
            })
            .collect())
    }

    async fn activate_menu_entry(&self, index: usize) -> Result<bool> {
        let js = format!(
            r#"(() => {{
  const items = document.querySelectorAll('[role="menuitem"]');
  const item = items[{index}];
  if (!item) {{ return false; }}
  item.click();
  return true;
}})()"#
        );
        self.eval(js).await
    }

    async fn dismiss_menu(&self) -> Result<()> {
        let _: bool = self.eval(DISMISS_MENU_JS).await?;
        Ok(())
    }

    async fn confirm_block(&self) -> Result<bool> {
        self.eval(CONFIRM_BLOCK_JS).await
    }
}
