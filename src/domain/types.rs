use serde::{Deserialize, Serialize};

/// Normalized classifier output for a single reply. `error` carries the
/// transport/API/parse detail when the call did not produce a usable
/// classification; such verdicts are never treated as hate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub is_hate: bool,
    pub confidence: u8,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn failure(reason: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_hate: false,
            confidence: 0,
            reason: reason.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.error.is_none()
    }
}

/// Counts derived from a scan session, mirroring what the live feed shows.
/// `hate` includes blocked authors; `blocked` counts successful blocks only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total: usize,
    pub analyzed: usize,
    pub hate: usize,
    pub blocked: usize,
    pub errors: usize,
}
