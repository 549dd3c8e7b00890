pub mod reply;
pub mod types;

pub use reply::{CellHandle, ReplyRecord, ReplyStatus};
pub use types::{ScanStats, Verdict};
