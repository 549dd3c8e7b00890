use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::CellHandle;
use crate::page::driver::PageDriver;

const MENU_OPEN_PAUSE: Duration = Duration::from_millis(500);
const BLOCK_CLICK_PAUSE: Duration = Duration::from_millis(500);
const CONFIRM_PAUSE: Duration = Duration::from_millis(300);

/// Drive the host page's menu flow to block the author of one reply.
///
/// Every failure mode collapses to `false`: the caller records the reply as
/// flagged-but-not-blocked and the scan moves on.
pub async fn block_author(page: &dyn PageDriver, cell: CellHandle) -> bool {
    match run_sequence(page, cell).await {
        Ok(done) => done,
        Err(error) => {
            warn!(target: "scan", cell = cell.0, "block sequence failed: {error:#}");
            false
        }
    }
}

async fn run_sequence(page: &dyn PageDriver, cell: CellHandle) -> Result<bool> {
    if !page.open_author_menu(cell).await.context("opening author menu")? {
        debug!(target: "scan", cell = cell.0, "no menu trigger on cell");
        return Ok(false);
    }
    sleep(MENU_OPEN_PAUSE).await;

    let entries = page.menu_entries().await.context("reading menu entries")?;
    let block_entry = entries
        .iter()
        .find(|entry| entry.label.to_lowercase().contains("block"));
    let Some(entry) = block_entry else {
        debug!(target: "scan", cell = cell.0, "menu has no block entry");
        page.dismiss_menu().await.context("dismissing menu")?;
        return Ok(false);
    };

    if !page
        .activate_menu_entry(entry.index)
        .await
        .context("activating block entry")?
    {
        debug!(target: "scan", cell = cell.0, "block entry no longer present");
        return Ok(false);
    }
    sleep(BLOCK_CLICK_PAUSE).await;

    if !page.confirm_block().await.context("confirming block")? {
        debug!(target: "scan", cell = cell.0, "confirmation control not found");
        return Ok(false);
    }
    sleep(CONFIRM_PAUSE).await;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{candidate, FakeTimeline};

    fn timeline_with_menu(labels: &[&str]) -> FakeTimeline {
        let fake = FakeTimeline::new(vec![
            candidate(1, "op", "post"),
            candidate(2, "troll", "reply"),
        ]);
        fake.set_menu_labels(labels);
        fake
    }

    #[tokio::test(start_paused = true)]
    async fn runs_the_full_menu_sequence() {
        let fake = timeline_with_menu(&["Mute @troll", "Block @troll", "Report post"]);

        assert!(block_author(&fake, CellHandle(2)).await);
        assert_eq!(
            fake.calls(),
            vec![
                "open_menu:2".to_string(),
                "entries".to_string(),
                "activate:1".to_string(),
                "confirm".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn block_entry_match_is_case_insensitive() {
        let fake = timeline_with_menu(&["BLOCK @troll"]);

        assert!(block_author(&fake, CellHandle(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_menu_trigger_gives_up_quietly() {
        let fake = timeline_with_menu(&["Block @troll"]);
        fake.set_menu_trigger_present(false);

        assert!(!block_author(&fake, CellHandle(2)).await);
        assert_eq!(fake.calls(), vec!["open_menu:2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn menu_without_block_entry_is_dismissed() {
        let fake = timeline_with_menu(&["Mute @troll", "Report post"]);

        assert!(!block_author(&fake, CellHandle(2)).await);
        assert_eq!(
            fake.calls(),
            vec![
                "open_menu:2".to_string(),
                "entries".to_string(),
                "dismiss".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_dialog_fails_the_block() {
        let fake = timeline_with_menu(&["Block @troll"]);
        fake.set_confirm_present(false);

        assert!(!block_author(&fake, CellHandle(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn page_errors_are_absorbed() {
        let fake = timeline_with_menu(&["Block @troll"]);
        fake.fail_on("entries");

        assert!(!block_author(&fake, CellHandle(2)).await);
    }
}
