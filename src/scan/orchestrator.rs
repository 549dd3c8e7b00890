//! Sequential scan driver. One pass of collection (scroll until the cap, the
//! idle limit, or a stop request), then one pass of classification with
//! optional block automation. Single-threaded on purpose: the page, the
//! classifier and the block flow all act on shared browser state, so replies
//! are handled strictly one at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::classifier::ReplyClassifier;
use crate::domain::ReplyStatus;
use crate::infrastructure::shutdown::ShutdownListener;
use crate::page::driver::PageDriver;

use super::{blocker, growth, harvest};
use super::session::{ScanPhase, ScanSession};

/// Pause between replies so classification requests stay well under any
/// upstream rate limit.
const ANALYSIS_PACING: Duration = Duration::from_millis(300);

pub struct ScanOptions {
    pub max_replies: usize,
    pub confidence_threshold: u8,
    pub auto_scroll: bool,
    pub max_idle_scrolls: u32,
    /// Normalized usernames that are never blocked, even when flagged.
    pub exempt_authors: HashSet<String>,
}

/// Receives the session after every visible change. The console feed hangs
/// off this; tests hang scripted probes off it.
pub trait ScanObserver: Send + Sync {
    fn on_update(&self, session: &ScanSession);
}

pub struct ScanOrchestrator {
    page: Arc<dyn PageDriver>,
    classifier: Arc<dyn ReplyClassifier>,
    options: ScanOptions,
}

impl ScanOrchestrator {
    pub fn new(
        page: Arc<dyn PageDriver>,
        classifier: Arc<dyn ReplyClassifier>,
        options: ScanOptions,
    ) -> Self {
        Self {
            page,
            classifier,
            options,
        }
    }

    pub async fn run(
        &self,
        shutdown: &ShutdownListener,
        observer: &dyn ScanObserver,
    ) -> Result<ScanSession> {
        let mut session = ScanSession::new();

        self.collect(&mut session, shutdown, observer).await?;
        self.analyze(&mut session, shutdown, observer).await;

        session.phase = if shutdown.is_triggered() {
            ScanPhase::Stopped
        } else {
            ScanPhase::Complete
        };
        observer.on_update(&session);

        info!(target: "scan", phase = session.phase.as_str(), "scan finished");
        Ok(session)
    }

    /// Harvest visible replies, then scroll-and-wait until the cap is hit,
    /// scrolling is off, the timeline stops growing, or a stop is requested.
    /// Page failures here abort the scan: without the timeline there is
    /// nothing left to do.
    async fn collect(
        &self,
        session: &mut ScanSession,
        shutdown: &ShutdownListener,
        observer: &dyn ScanObserver,
    ) -> Result<()> {
        loop {
            if shutdown.is_triggered() {
                return Ok(());
            }

            let candidates = self.page.reply_candidates().await?;
            let collected = session.replies.len();
            let fresh = harvest::collect_new_replies(
                &candidates,
                &mut session.seen,
                self.options.max_replies,
                collected,
            );
            if !fresh.is_empty() {
                debug!(
                    target: "scan",
                    new = fresh.len(),
                    total = collected + fresh.len(),
                    "collected replies"
                );
                session.replies.extend(fresh);
                observer.on_update(session);
            }

            if session.replies.len() >= self.options.max_replies {
                info!(target: "scan", max = self.options.max_replies, "reply cap reached");
                return Ok(());
            }
            if !self.options.auto_scroll {
                return Ok(());
            }

            growth::scroll_to_load_more(self.page.as_ref()).await?;
            if growth::wait_for_growth(self.page.as_ref(), growth::GROWTH_TIMEOUT).await? {
                session.no_growth_streak = 0;
            } else {
                session.no_growth_streak += 1;
                if session.no_growth_streak >= self.options.max_idle_scrolls {
                    info!(
                        target: "scan",
                        idle_scrolls = session.no_growth_streak,
                        "timeline stopped growing"
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Classify collected replies one at a time, blocking flagged authors as
    /// they are found. A stop request takes effect between replies; the one
    /// in flight always reaches a final status.
    async fn analyze(
        &self,
        session: &mut ScanSession,
        shutdown: &ShutdownListener,
        observer: &dyn ScanObserver,
    ) {
        session.phase = ScanPhase::Analyzing;
        observer.on_update(session);

        for index in 0..session.replies.len() {
            if shutdown.is_triggered() {
                info!(
                    target: "scan",
                    pending = session.replies.len() - index,
                    "stop requested, leaving remaining replies pending"
                );
                return;
            }

            session.replies[index].status = ReplyStatus::Analyzing;
            observer.on_update(session);

            let text = session.replies[index].text.clone();
            let verdict = self.classifier.classify(&text).await;

            let flagged = verdict.is_usable()
                && verdict.is_hate
                && verdict.confidence >= self.options.confidence_threshold;
            session.replies[index].status = if !verdict.is_usable() {
                ReplyStatus::Error
            } else if flagged {
                ReplyStatus::Hate
            } else {
                ReplyStatus::Safe
            };
            session.replies[index].verdict = Some(verdict);
            observer.on_update(session);

            if flagged {
                let username = session.replies[index].username.clone();
                if self.options.exempt_authors.contains(&username.to_lowercase()) {
                    info!(target: "scan", username = %username, "author allowlisted, not blocking");
                } else if blocker::block_author(self.page.as_ref(), session.replies[index].cell)
                    .await
                {
                    session.replies[index].status = ReplyStatus::Blocked;
                    observer.on_update(session);
                }
            }

            sleep(ANALYSIS_PACING).await;
        }
    }
}
