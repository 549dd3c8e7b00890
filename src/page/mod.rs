pub mod browser;
pub mod cdp;
pub mod driver;

#[cfg(test)]
pub mod fake;

pub use browser::BrowserSession;
pub use cdp::CdpTimeline;
pub use driver::{MenuEntry, PageDriver, ReplyCandidate};
