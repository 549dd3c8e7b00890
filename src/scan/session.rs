use std::collections::HashSet;

use crate::domain::{ReplyRecord, ReplyStatus, ScanStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Collecting,
    Analyzing,
    Complete,
    Stopped,
}

impl ScanPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPhase::Collecting => "collecting",
            ScanPhase::Analyzing => "analyzing",
            ScanPhase::Complete => "complete",
            ScanPhase::Stopped => "stopped",
        }
    }
}

/// All state of one scan. Created when the scan starts, mutated in place by
/// the orchestrator, reported and dropped when it ends; nothing persists.
pub struct ScanSession {
    pub phase: ScanPhase,
    pub replies: Vec<ReplyRecord>,
    /// Reply keys already turned into records, across all scroll passes.
    pub seen: HashSet<String>,
    pub no_growth_streak: u32,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Collecting,
            replies: Vec::new(),
            seen: HashSet::new(),
            no_growth_streak: 0,
        }
    }

    pub fn stats(&self) -> ScanStats {
        let mut stats = ScanStats {
            total: self.replies.len(),
            ..ScanStats::default()
        };
        for reply in &self.replies {
            if reply.status.is_final() {
                stats.analyzed += 1;
            }
            match reply.status {
                ReplyStatus::Hate | ReplyStatus::Blocked => stats.hate += 1,
                ReplyStatus::Error => stats.errors += 1,
                _ => {}
            }
            if reply.status == ReplyStatus::Blocked {
                stats.blocked += 1;
            }
        }
        stats
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}
