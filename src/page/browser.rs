use std::{
    env,
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use chromiumoxide::{handler::Handler, Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::ChromeConfig;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(1000);
const SPAWN_GRACE: Duration = Duration::from_millis(1500);

/// A devtools connection to a real browser showing the logged-in session.
///
/// Attach order: an explicit `CHROME_WS_URL` endpoint, then whatever is
/// already listening on the debug port, then spawning the executable
/// ourselves. Only a browser we spawned is closed on shutdown; an attached
/// one belongs to the user.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    owns_process: bool,
}

impl BrowserSession {
    pub async fn establish(config: &ChromeConfig, profile_dir: &Path) -> Result<Self> {
        if let Some(ws_url) = &config.ws_url {
            let (browser, handler) = Browser::connect(ws_url.clone())
                .await
                .map_err(|e| anyhow!("could not connect to {ws_url}: {e}"))?;
            tracing::info!(target: "browser", ws = %ws_url, "attached via configured endpoint");
            return Ok(Self {
                browser,
                handler_task: spawn_handler(handler),
                owns_process: false,
            });
        }

        if let Ok(ws_url) = discover_ws_url(config.debug_port).await {
            if let Ok((browser, handler)) = Browser::connect(ws_url.clone()).await {
                tracing::info!(
                    target: "browser",
                    port = config.debug_port,
                    "attached to already-running browser"
                );
                return Ok(Self {
                    browser,
                    handler_task: spawn_handler(handler),
                    owns_process: false,
                });
            }
        }

        let exe = find_chrome_executable(config.executable.as_deref()).ok_or_else(|| {
            anyhow!(
                "no Chromium-family browser found; install Chrome/Chromium or set CHROME_EXECUTABLE"
            )
        })?;
        tracing::info!(target: "browser", exe = %exe, port = config.debug_port, "spawning browser");
        spawn_browser_process(&exe, config, profile_dir)?;
        tokio::time::sleep(SPAWN_GRACE).await;

        let mut last_error = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match discover_ws_url(config.debug_port).await {
                Ok(ws_url) => match Browser::connect(ws_url).await {
                    Ok((browser, handler)) => {
                        return Ok(Self {
                            browser,
                            handler_task: spawn_handler(handler),
                            owns_process: true,
                        });
                    }
                    Err(e) => last_error = Some(anyhow!("devtools connect failed: {e}")),
                },
                Err(e) => last_error = Some(e),
            }
            if attempt < CONNECT_ATTEMPTS {
                tracing::debug!(
                    target: "browser",
                    attempt,
                    "devtools endpoint not ready yet, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
        Err(anyhow!(
            "could not reach the browser on port {} after {} attempts: {:?}",
            config.debug_port,
            CONNECT_ATTEMPTS,
            last_error
        ))
    }

    pub async fn open_conversation(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("could not open a tab: {e}"))?;
        page.goto(url)
            .await
            .map_err(|e| anyhow!("navigation to {url} failed: {e}"))?;
        Ok(page)
    }

    pub async fn shutdown(mut self) {
        if self.owns_process {
            let _ = self.browser.close().await;
            let _ = self.browser.wait().await;
            tracing::info!(target: "browser", "spawned browser closed");
        } else {
            tracing::info!(target: "browser", "leaving attached browser running");
        }
        self.handler_task.abort();
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!(target: "browser", error = %e, "devtools event stream error");
            }
        }
    })
}

fn spawn_browser_process(exe: &str, config: &ChromeConfig, profile_dir: &Path) -> Result<()> {
    let mut args = vec![
        format!("--remote-debugging-port={}", config.debug_port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--disable-infobars".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    Command::new(exe)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn browser {exe}"))?;
    Ok(())
}

async fn discover_ws_url(port: u16) -> Result<String> {
    let version_url = format!("http://127.0.0.1:{port}/json/version");
    let response = reqwest::get(&version_url)
        .await
        .with_context(|| format!("devtools endpoint {version_url} unreachable"))?;
    let json: serde_json::Value = response
        .json()
        .await
        .context("devtools /json/version returned invalid JSON")?;
    json["webSocketDebuggerUrl"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no webSocketDebuggerUrl in devtools response"))
}

/// Explicit override first, then PATH, then the platform's usual install
/// locations.
pub fn find_chrome_executable(explicit: Option<&str>) -> Option<String> {
    if let Some(p) = explicit {
        if Path::new(p).exists() {
            return Some(p.to_string());
        }
    }

    if let Ok(path_var) = env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
            "brave",
        ];
        for dir in env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/brave-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}
