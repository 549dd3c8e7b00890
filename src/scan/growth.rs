use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};

use crate::page::driver::PageDriver;

/// Pause after scrolling for the scroll animation and the host page's lazy
/// load to kick in.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(800);
/// How long one growth wait is allowed to run before reporting no growth.
pub const GROWTH_TIMEOUT: Duration = Duration::from_millis(2000);

const GROWTH_POLL: Duration = Duration::from_millis(100);

pub async fn scroll_to_load_more(page: &dyn PageDriver) -> Result<()> {
    page.scroll_to_last().await?;
    sleep(SCROLL_SETTLE).await;
    Ok(())
}

/// Poll the timeline's cell count until it exceeds the count captured at
/// entry, or the timeout lapses. Plain polling: once this returns there is
/// nothing left watching the page.
pub async fn wait_for_growth(page: &dyn PageDriver, timeout: Duration) -> Result<bool> {
    let baseline = page.reply_count().await?;
    let deadline = Instant::now() + timeout;

    loop {
        if page.reply_count().await? > baseline {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(GROWTH_POLL).await;
    }
}
