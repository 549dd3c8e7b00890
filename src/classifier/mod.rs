use async_trait::async_trait;

use crate::domain::Verdict;

pub mod client;
pub mod protocol;

pub use client::OpenRouterClient;

/// Classification is infallible by contract: every failure mode is folded
/// into the returned verdict so one bad reply never stops the scan.
#[async_trait]
pub trait ReplyClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Verdict;
}
