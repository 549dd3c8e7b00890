use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use url::Url;

use crate::{
    classifier::OpenRouterClient,
    cli::AllowlistAction,
    config::AppConfig,
    db::{
        self,
        allowlist::{normalize_username, AllowlistRepository},
    },
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    page::{BrowserSession, CdpTimeline},
    report::ConsoleFeed,
    scan::{ScanOptions, ScanOrchestrator},
};

const TIMELINE_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Command-line overrides applied on top of the environment configuration.
pub struct ScanOverrides {
    pub max_replies: Option<usize>,
    pub threshold: Option<u8>,
    pub model: Option<String>,
    pub no_scroll: bool,
}

pub struct ScanApp {
    session: BrowserSession,
    allowlist: AllowlistRepository,
    orchestrator: ScanOrchestrator,
    shutdown: Shutdown,
}

impl ScanApp {
    /// Wires everything a scan needs, failing before the browser is touched
    /// when a precondition (URL, credential) is not met.
    pub async fn initialize(
        config: AppConfig,
        paths: &ResolvedPaths,
        shutdown: Shutdown,
        url: &str,
        overrides: ScanOverrides,
    ) -> Result<Self> {
        let url = validate_conversation_url(url)?;
        let api_key = config.openrouter.require_api_key()?.to_string();
        let model = overrides
            .model
            .unwrap_or_else(|| config.openrouter.model.clone());

        let pool = db::init_pool(&paths.db_path).await?;
        let allowlist = AllowlistRepository::new(pool);
        let exempt_authors = allowlist.all_usernames().await?;

        let http = Client::builder()
            .user_agent(format!("hateblock/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let classifier = Arc::new(OpenRouterClient::new(http, api_key, model));

        let session = BrowserSession::establish(&config.chrome, &paths.browser_profile_dir).await?;
        let page = session.open_conversation(url.as_str()).await?;
        let timeline = CdpTimeline::new(page);
        timeline.wait_for_timeline(TIMELINE_READY_TIMEOUT).await?;

        let options = ScanOptions {
            max_replies: overrides.max_replies.unwrap_or(config.scan.max_replies),
            confidence_threshold: overrides
                .threshold
                .unwrap_or(config.scan.confidence_threshold),
            auto_scroll: config.scan.auto_scroll && !overrides.no_scroll,
            max_idle_scrolls: config.scan.max_idle_scrolls,
            exempt_authors,
        };
        let orchestrator = ScanOrchestrator::new(Arc::new(timeline), classifier, options);

        Ok(Self {
            session,
            allowlist,
            orchestrator,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let ScanApp {
            session,
            allowlist,
            orchestrator,
            shutdown,
        } = self;

        let listener = shutdown.subscribe();
        let feed = ConsoleFeed::new();
        let result = orchestrator.run(&listener, &feed).await;

        allowlist.close().await;
        session.shutdown().await;
        result.map(|_| ())
    }
}

/// Scans only make sense on the host platform, so anything that is not an
/// x.com / twitter.com page is refused up front.
pub fn validate_conversation_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid URL: {raw}"))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(anyhow!("unsupported URL scheme: {}", url.scheme()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {raw}"))?
        .to_ascii_lowercase();
    let allowed = ["x.com", "twitter.com"]
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));
    if !allowed {
        return Err(anyhow!("not an x.com / twitter.com URL: {raw}"));
    }
    Ok(url)
}

pub async fn manage_allowlist(paths: &ResolvedPaths, action: AllowlistAction) -> Result<()> {
    let pool = db::init_pool(&paths.db_path).await?;
    let repo = AllowlistRepository::new(pool);

    match action {
        AllowlistAction::Add { username, note } => {
            repo.add(&username, note.as_deref()).await?;
            println!("allowlisted @{}", normalize_username(&username));
        }
        AllowlistAction::Remove { username } => {
            if repo.remove(&username).await? {
                println!("removed @{}", normalize_username(&username));
            } else {
                println!("@{} was not on the allowlist", normalize_username(&username));
            }
        }
        AllowlistAction::List => {
            let rows = repo.list().await?;
            if rows.is_empty() {
                println!("allowlist is empty");
            }
            for row in rows {
                println!(
                    "@{:<20}  added {}  {}",
                    row.username,
                    row.added_at.format("%Y-%m-%d"),
                    row.note.as_deref().unwrap_or("")
                );
            }
        }
    }

    repo.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_urls_on_the_host_platform_pass() {
        assert!(validate_conversation_url("https://x.com/user/status/123").is_ok());
        assert!(validate_conversation_url("https://twitter.com/user/status/123").is_ok());
        assert!(validate_conversation_url("https://mobile.twitter.com/user/status/123").is_ok());
    }

    #[test]
    fn foreign_hosts_are_refused() {
        assert!(validate_conversation_url("https://example.com/user/status/123").is_err());
        // suffix lookalike is not a subdomain
        assert!(validate_conversation_url("https://notx.com/user/status/123").is_err());
    }

    #[test]
    fn garbage_and_odd_schemes_are_refused() {
        assert!(validate_conversation_url("not a url").is_err());
        assert!(validate_conversation_url("ftp://x.com/user/status/123").is_err());
    }
}
