//! Live console feed for a running scan. Subscribed as a [`ScanObserver`],
//! it diffs each session snapshot against the last one it saw and emits one
//! log line per phase change and per reply status transition.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{ReplyRecord, ReplyStatus};
use crate::scan::{ScanObserver, ScanPhase, ScanSession};

const TEXT_PREVIEW_CHARS: usize = 100;

pub struct ConsoleFeed {
    state: Mutex<FeedState>,
}

struct FeedState {
    phase: Option<ScanPhase>,
    statuses: Vec<ReplyStatus>,
}

impl ConsoleFeed {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FeedState {
                phase: None,
                statuses: Vec::new(),
            }),
        }
    }
}

impl Default for ConsoleFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanObserver for ConsoleFeed {
    fn on_update(&self, session: &ScanSession) {
        let mut state = self.state.lock();

        if state.phase != Some(session.phase) {
            state.phase = Some(session.phase);
            match session.phase {
                ScanPhase::Complete | ScanPhase::Stopped => {
                    let stats = session.stats();
                    info!(
                        target: "scan",
                        phase = session.phase.as_str(),
                        total = stats.total,
                        analyzed = stats.analyzed,
                        hate = stats.hate,
                        blocked = stats.blocked,
                        errors = stats.errors,
                        "scan summary"
                    );
                }
                _ => info!(target: "scan", phase = session.phase.as_str(), "phase changed"),
            }
        }

        for (index, reply) in session.replies.iter().enumerate() {
            let previous = state.statuses.get(index).copied();
            if previous != Some(reply.status) {
                render_transition(reply, previous);
            }
        }
        state.statuses = session.replies.iter().map(|r| r.status).collect();
    }
}

fn render_transition(reply: &ReplyRecord, previous: Option<ReplyStatus>) {
    let preview = truncate_chars(&reply.text, TEXT_PREVIEW_CHARS);
    match reply.status {
        ReplyStatus::Pending => {
            if previous.is_none() {
                debug!(target: "scan", username = %reply.username, text = %preview, "reply collected");
            }
        }
        ReplyStatus::Analyzing => {}
        ReplyStatus::Safe => {
            let confidence = reply.verdict.as_ref().map(|v| v.confidence).unwrap_or(0);
            info!(target: "scan", username = %reply.username, confidence, "safe");
        }
        ReplyStatus::Hate => {
            let (confidence, reason) = verdict_detail(reply);
            warn!(
                target: "scan",
                username = %reply.username,
                confidence,
                reason = %reason,
                text = %preview,
                "hate speech detected"
            );
        }
        ReplyStatus::Blocked => {
            info!(target: "scan", username = %reply.username, "author blocked");
        }
        ReplyStatus::Error => {
            let error = reply
                .verdict
                .as_ref()
                .and_then(|v| v.error.as_deref())
                .unwrap_or("unknown");
            warn!(
                target: "scan",
                username = %reply.username,
                error = %error,
                "classification failed"
            );
        }
    }
}

fn verdict_detail(reply: &ReplyRecord) -> (u8, &str) {
    match reply.verdict.as_ref() {
        Some(v) => (v.confidence, v.reason.as_str()),
        None => (0, ""),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(max).collect();
    preview.push('…');
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellHandle;

    #[test]
    fn short_text_is_left_alone() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn long_text_is_cut_at_a_character_boundary() {
        let long = "ü".repeat(150);
        let preview = truncate_chars(&long, 100);
        assert_eq!(preview.chars().count(), 101);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn feed_tracks_each_snapshot_it_is_shown() {
        let feed = ConsoleFeed::new();
        let mut session = ScanSession::new();
        session.replies.push(ReplyRecord::new(CellHandle(1), "a", "text"));
        session.replies.push(ReplyRecord::new(CellHandle(2), "b", "more"));

        feed.on_update(&session);
        assert_eq!(feed.state.lock().statuses.len(), 2);

        session.replies[0].status = ReplyStatus::Safe;
        session.phase = ScanPhase::Analyzing;
        feed.on_update(&session);

        let state = feed.state.lock();
        assert_eq!(state.phase, Some(ScanPhase::Analyzing));
        assert_eq!(state.statuses[0], ReplyStatus::Safe);
    }
}
