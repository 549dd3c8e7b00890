//! Scripted in-memory timeline for scan tests. Growth is revealed on a
//! virtual-clock delay after each scroll, mirroring how the real page loads
//! cells a moment after scrolling.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::domain::CellHandle;

use super::driver::{MenuEntry, PageDriver, ReplyCandidate};

pub fn candidate(cell: u64, author: &str, text: &str) -> ReplyCandidate {
    ReplyCandidate {
        cell: CellHandle(cell),
        author: Some(author.to_string()),
        text: Some(text.to_string()),
    }
}

pub fn bare_candidate(cell: u64) -> ReplyCandidate {
    ReplyCandidate {
        cell: CellHandle(cell),
        author: None,
        text: None,
    }
}

struct FakeState {
    visible: Vec<ReplyCandidate>,
    queued: VecDeque<(Vec<ReplyCandidate>, Duration)>,
    armed: Option<(Vec<ReplyCandidate>, Instant)>,
    menu_labels: Vec<String>,
    menu_trigger_present: bool,
    activate_succeeds: bool,
    confirm_present: bool,
    fail_methods: Vec<&'static str>,
    calls: Vec<String>,
}

pub struct FakeTimeline {
    state: Mutex<FakeState>,
}

impl FakeTimeline {
    pub fn new(visible: Vec<ReplyCandidate>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                visible,
                queued: VecDeque::new(),
                armed: None,
                menu_labels: Vec::new(),
                menu_trigger_present: true,
                activate_succeeds: true,
                confirm_present: true,
                fail_methods: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Queue a batch that becomes visible `delay` after the next scroll.
    pub fn queue_batch(&self, batch: Vec<ReplyCandidate>, delay: Duration) {
        self.state.lock().queued.push_back((batch, delay));
    }

    pub fn set_menu_labels(&self, labels: &[&str]) {
        self.state.lock().menu_labels = labels.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_menu_trigger_present(&self, present: bool) {
        self.state.lock().menu_trigger_present = present;
    }

    pub fn set_activate_succeeds(&self, ok: bool) {
        self.state.lock().activate_succeeds = ok;
    }

    pub fn set_confirm_present(&self, present: bool) {
        self.state.lock().confirm_present = present;
    }

    /// Make every future call of `method` return an error.
    pub fn fail_on(&self, method: &'static str) {
        self.state.lock().fail_methods.push(method);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn visible_count(&self) -> usize {
        let mut state = self.state.lock();
        Self::reveal_due(&mut state);
        state.visible.len()
    }

    fn record(state: &mut FakeState, call: String) -> Result<()> {
        state.calls.push(call.clone());
        let method = call.split(':').next().unwrap_or(&call).to_string();
        if state.fail_methods.contains(&method.as_str()) {
            return Err(anyhow!("scripted {method} failure"));
        }
        Ok(())
    }

    fn reveal_due(state: &mut FakeState) {
        if let Some((_, due)) = &state.armed {
            if Instant::now() >= *due {
                let (batch, _) = state.armed.take().unwrap();
                state.visible.extend(batch);
            }
        }
    }
}

#[async_trait]
impl PageDriver for FakeTimeline {
    async fn reply_candidates(&self) -> Result<Vec<ReplyCandidate>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "candidates".to_string())?;
        Self::reveal_due(&mut state);
        Ok(state.visible.clone())
    }

    async fn reply_count(&self) -> Result<usize> {
        let mut state = self.state.lock();
        Self::record(&mut state, "count".to_string())?;
        Self::reveal_due(&mut state);
        Ok(state.visible.len())
    }

    async fn scroll_to_last(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::record(&mut state, "scroll".to_string())?;
        if state.armed.is_none() {
            if let Some((batch, delay)) = state.queued.pop_front() {
                state.armed = Some((batch, Instant::now() + delay));
            }
        }
        Ok(())
    }

    async fn open_author_menu(&self, cell: CellHandle) -> Result<bool> {
        let mut state = self.state.lock();
        Self::record(&mut state, format!("open_menu:{}", cell.0))?;
        Self::reveal_due(&mut state);
        let cell_known = state.visible.iter().any(|c| c.cell == cell);
        Ok(cell_known && state.menu_trigger_present)
    }

    async fn menu_entries(&self) -> Result<Vec<MenuEntry>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "entries".to_string())?;
        Ok(state
            .menu_labels
            .iter()
            .enumerate()
            .map(|(index, label)| MenuEntry {
                index,
                label: label.clone(),
            })
            .collect())
    }

    async fn activate_menu_entry(&self, index: usize) -> Result<bool> {
        let mut state = self.state.lock();
        Self::record(&mut state, format!("activate:{index}"))?;
        Ok(state.activate_succeeds && index < state.menu_labels.len())
    }

    async fn dismiss_menu(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::record(&mut state, "dismiss".to_string())?;
        Ok(())
    }

    async fn confirm_block(&self) -> Result<bool> {
        let mut state = self.state.lock();
        Self::record(&mut state, "confirm".to_string())?;
        Ok(state.confirm_present)
    }
}
