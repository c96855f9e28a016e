use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use inkproxy_core::error::AppError;
use inkproxy_core::identity::IdentityProfile;
use inkproxy_core::models::NavigationOutcome;
use inkproxy_core::traits::{BrowserSession, SessionLauncher};
use tokio::task::JoinHandle;

/// Flags for unattended runs in containers. These keep Chromium working
/// without `/dev/shm` or a GPU; they are not a security boundary.
/// `--headless=new` and `--no-sandbox` come from the builder.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--single-process",
    "--disable-features=site-per-process",
    "--disable-extensions",
    "--no-first-run",
];

/// How long `close` waits for the browser process to exit before killing it.
const PROCESS_EXIT_WAIT: Duration = Duration::from_secs(10);

/// Upper bound for the in-page network-idle probe that follows the load event.
const NETWORK_IDLE_CAP: Duration = Duration::from_secs(15);

/// Resolves once `readyState` is complete and no new resource-timing
/// entries appeared for one second (`true`), or at the cap (`false`).
const NETWORK_IDLE_SCRIPT: &str = r#"new Promise((resolve) => {
    const timeoutMs = __CAP_MS__;
    const idleMs = 1000;
    const interval = 250;
    const start = Date.now();
    const count = () => { try { return performance.getEntriesByType('resource').length; } catch (_) { return 0; } };
    let last = count();
    let stableMs = 0;
    const timer = setInterval(() => {
        const cur = count();
        if (document.readyState === 'complete' && cur === last) {
            stableMs += interval;
        } else {
            stableMs = 0;
        }
        last = cur;
        if (stableMs >= idleMs || Date.now() - start >= timeoutMs) {
            clearInterval(timer);
            resolve(stableMs >= idleMs);
        }
    }, interval);
})"#;

/// Launch settings shared by every session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Browser binary; probed from well-known locations when `None`.
    pub executable: Option<PathBuf>,
    /// Root for per-session browser profiles. Each session gets its own
    /// subdirectory so concurrent browsers never share a profile lock.
    pub user_data_dir: Option<PathBuf>,
    pub launch_timeout: Duration,
    /// Bound on a single CDP command, navigation included. Must stay above
    /// the workflow's navigation timeout or chromiumoxide cuts loads short.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            user_data_dir: None,
            launch_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(95),
        }
    }
}

/// Launches one headless Chromium per request via the Chrome DevTools Protocol.
///
/// Every session owns its own browser process and profile directory;
/// nothing is pooled between requests.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Per-session profile directory under the configured root.
    fn session_profile_dir(&self) -> Option<PathBuf> {
        self.options
            .user_data_dir
            .as_ref()
            .map(|root| root.join(format!("session-{}", uuid::Uuid::new_v4())))
    }

    fn browser_config(&self, profile_dir: Option<&PathBuf>) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .no_sandbox()
            .disable_default_args()
            .launch_timeout(self.options.launch_timeout)
            .request_timeout(self.options.request_timeout);

        if let Some(bin) = self
            .options
            .executable
            .clone()
            .or_else(Self::find_chrome_binary)
        {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        if let Some(dir) = profile_dir {
            builder = builder.user_data_dir(dir);
        }

        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }

        builder
            .build()
            .map_err(|e| AppError::LaunchFailed(format!("Browser config error: {e}")))
    }

    /// `CHROME_BIN`, then the install locations of the Debian chromium and
    /// Google Chrome packages. `None` defers to chromiumoxide's detection.
    fn find_chrome_binary() -> Option<PathBuf> {
        std::env::var_os("CHROME_BIN")
            .map(PathBuf::from)
            .into_iter()
            .chain(
                ["/usr/bin/chromium", "/usr/bin/google-chrome-stable"]
                    .into_iter()
                    .map(PathBuf::from),
            )
            .find(|path| path.is_file())
    }
}

impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession, AppError> {
        let profile_dir = self.session_profile_dir();
        let config = self.browser_config(profile_dir.as_ref())?;
        let timeout = self.options.launch_timeout;

        let (mut browser, mut handler) =
            match tokio::time::timeout(timeout, Browser::launch(config)).await {
                Ok(Ok(launched)) => launched,
                Ok(Err(e)) => return Err(AppError::LaunchFailed(e.to_string())),
                Err(_) => {
                    return Err(AppError::LaunchFailed(format!(
                        "browser did not start within {}s",
                        timeout.as_secs()
                    )));
                }
            };

        // The CDP handler must be polled continuously for the connection to work.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser CDP handler error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Some(Err(kill_err)) = browser.kill().await {
                    tracing::warn!("Failed to kill browser process: {kill_err}");
                }
                handler_task.abort();
                remove_profile_dir(profile_dir.as_deref()).await;
                return Err(AppError::LaunchFailed(format!("Failed to open page: {e}")));
            }
        };

        Ok(ChromiumSession {
            browser,
            page,
            handler_task,
            profile_dir,
        })
    }
}

/// One Chromium process with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
}

async fn remove_profile_dir(dir: Option<&Path>) {
    let Some(dir) = dir else { return };
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        tracing::debug!("Could not remove profile dir {}: {e}", dir.display());
    }
}

fn browser_error(context: &str) -> impl Fn(chromiumoxide::error::CdpError) -> AppError + '_ {
    move |e| AppError::Browser(format!("{context}: {e}"))
}

impl ChromiumSession {
    async fn kill(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            tracing::warn!("Failed to kill browser process: {e}");
        }
    }

    async fn wait_for_network_idle(&self) {
        let script =
            NETWORK_IDLE_SCRIPT.replace("__CAP_MS__", &NETWORK_IDLE_CAP.as_millis().to_string());
        match self.page.evaluate(script).await {
            Ok(result) => {
                if !result.into_value::<bool>().unwrap_or(false) {
                    tracing::warn!(
                        "Network did not go idle within {}s; continuing",
                        NETWORK_IDLE_CAP.as_secs()
                    );
                }
            }
            Err(e) => tracing::warn!("Network-idle probe failed: {e}"),
        }
    }

    async fn load(&self, url: &str) -> Result<NavigationOutcome, AppError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::NavigationFailed(format!("{url}: {e}")))?;

        let request = self
            .page
            .wait_for_navigation_response()
            .await
            .map_err(|e| AppError::NavigationFailed(format!("{url}: {e}")))?;

        let status = request
            .as_ref()
            .and_then(|r| r.response.as_ref())
            .and_then(|r| u16::try_from(r.status).ok());

        if status.is_none() {
            if let Some(reason) = request.as_ref().and_then(|r| r.failure_text.clone()) {
                return Err(AppError::NavigationFailed(format!("{url}: {reason}")));
            }
        }

        self.wait_for_network_idle().await;

        let final_url = self.page.url().await.ok().flatten();
        Ok(NavigationOutcome { status, final_url })
    }
}

impl BrowserSession for ChromiumSession {
    async fn apply_identity(&self, identity: &IdentityProfile) -> Result<(), AppError> {
        self.page
            .execute(SetUserAgentOverrideParams::new(identity.user_agent))
            .await
            .map_err(browser_error("Failed to set user agent"))?;

        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                identity.headers_json(),
            )))
            .await
            .map_err(browser_error("Failed to set extra headers"))?;

        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationOutcome, AppError> {
        match tokio::time::timeout(timeout, self.load(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::NavigationFailed(format!(
                "Navigation timeout of {}s exceeded for {url}",
                timeout.as_secs()
            ))),
        }
    }

    async fn dom_size(&self) -> Result<usize, AppError> {
        self.page
            .evaluate("document.documentElement.outerHTML.length")
            .await
            .map_err(browser_error("Failed to measure DOM"))?
            .into_value::<usize>()
            .map_err(|e| AppError::Browser(format!("Unexpected DOM size value: {e}")))
    }

    async fn content(&self) -> Result<String, AppError> {
        self.page
            .content()
            .await
            .map_err(browser_error("Failed to read page content"))
    }

    async fn current_url(&self) -> Result<Option<String>, AppError> {
        self.page
            .url()
            .await
            .map_err(browser_error("Failed to read page URL"))
    }

    async fn has_element(&self, selector: &str) -> Result<bool, AppError> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.page
            .evaluate(script)
            .await
            .map_err(browser_error("Selector probe failed"))?
            .into_value::<bool>()
            .map_err(|e| AppError::Browser(format!("Unexpected selector probe value: {e}")))
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(browser_error("Scroll failed"))?;
        Ok(())
    }

    async fn click_first(&self, selectors: &[String]) -> Result<Option<String>, AppError> {
        for selector in selectors {
            if !self.has_element(selector).await? {
                continue;
            }
            let element = self
                .page
                .find_element(selector.as_str())
                .await
                .map_err(browser_error("Failed to locate control"))?;
            element
                .click()
                .await
                .map_err(browser_error("Click failed"))?;
            return Ok(Some(selector.clone()));
        }
        Ok(None)
    }

    async fn close(mut self) -> Result<(), AppError> {
        let closed = self.browser.close().await;
        if let Err(e) = &closed {
            tracing::warn!("Browser.close failed, killing process: {e}");
            self.kill().await;
        }

        match tokio::time::timeout(PROCESS_EXIT_WAIT, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Failed to reap browser process: {e}"),
            Err(_) => {
                tracing::warn!(
                    "Browser still running {}s after close, killing it",
                    PROCESS_EXIT_WAIT.as_secs()
                );
                self.kill().await;
            }
        }
        self.handler_task.abort();

        remove_profile_dir(self.profile_dir.take().as_deref()).await;

        closed
            .map(|_| ())
            .map_err(browser_error("Failed to close browser"))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use inkproxy_core::identity::USER_AGENTS;

    use super::*;

    #[test]
    fn launch_args_cover_container_flags() {
        for flag in ["--disable-gpu", "--single-process", "--disable-dev-shm-usage"] {
            assert!(LAUNCH_ARGS.contains(&flag), "missing {flag}");
        }
    }

    #[test]
    fn session_profile_dirs_are_unique_per_launch() {
        let launcher = ChromiumLauncher::new(LaunchOptions {
            user_data_dir: Some(PathBuf::from("/tmp/inkproxy_user_data")),
            ..LaunchOptions::default()
        });

        let a = launcher.session_profile_dir().unwrap();
        let b = launcher.session_profile_dir().unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("/tmp/inkproxy_user_data"));
        assert!(
            a.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("session-"))
        );
    }

    #[test]
    fn browser_config_carries_launch_and_request_timeouts() {
        let launcher = ChromiumLauncher::new(LaunchOptions {
            executable: Some(PathBuf::from("/opt/chromium/chrome")),
            launch_timeout: Duration::from_secs(45),
            request_timeout: Duration::from_secs(120),
            ..LaunchOptions::default()
        });

        let config = launcher.browser_config(None).unwrap();
        let rendered = format!("{config:?}");

        assert!(rendered.contains("launch_timeout: 45s"), "{rendered}");
        assert!(rendered.contains("request_timeout: 120s"), "{rendered}");
        assert!(rendered.contains("headless: New"), "{rendered}");
    }

    #[test]
    fn default_request_timeout_outlasts_default_navigation() {
        let options = LaunchOptions::default();
        let navigation = inkproxy_core::WorkflowConfig::default().navigation_timeout;
        assert!(options.request_timeout > navigation);
    }

    #[tokio::test]
    async fn profile_dir_removal_tolerates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session-gone");
        tokio::fs::create_dir_all(dir.join("Default")).await.unwrap();

        remove_profile_dir(Some(&dir)).await;
        assert!(!dir.exists());

        remove_profile_dir(Some(&dir)).await;
        remove_profile_dir(None).await;
    }

    #[test]
    fn no_profile_root_means_no_profile_dir() {
        let launcher = ChromiumLauncher::default();
        assert!(launcher.session_profile_dir().is_none());
        assert_eq!(launcher.options().launch_timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome/Chromium"]
    async fn real_session_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let launcher = ChromiumLauncher::new(LaunchOptions {
            user_data_dir: Some(tmp.path().to_path_buf()),
            ..LaunchOptions::default()
        });

        let session = launcher.launch().await.unwrap();
        session
            .apply_identity(&IdentityProfile::with_user_agent(
                USER_AGENTS[0],
                "https://example.com/",
            ))
            .await
            .unwrap();
        let outcome = session
            .navigate("https://example.com/", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(outcome.status, Some(200));
        assert!(session.has_element("h1").await.unwrap());
        assert!(!session.has_element("a.load-more").await.unwrap());
        assert!(session.content().await.unwrap().contains("Example Domain"));
        session.close().await.unwrap();
    }
}
