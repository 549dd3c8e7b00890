pub mod blocker;
pub mod growth;
pub mod harvest;
pub mod orchestrator;
pub mod session;

pub use orchestrator::{ScanObserver, ScanOptions, ScanOrchestrator};
pub use session::{ScanPhase, ScanSession};
