use std::time::Duration;

use tokio::time::{Instant, sleep};
use url::Url;

use crate::error::AppError;
use crate::extract::{extract_images, extract_titled_links};
use crate::identity::IdentityProfile;
use crate::models::{Extraction, ExtractionResult, FetchRequest, Mode};
use crate::profile::SiteProfile;
use crate::traits::{BrowserSession, SessionLauncher, SnapshotSink};

/// How long to let client-side rendering run after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Sleep a fixed amount of time.
    Fixed(Duration),
    /// Poll the DOM size every `poll` until it has not changed for `quiet`,
    /// or until `ceiling` elapses. Either way the workflow proceeds.
    Quiescent {
        ceiling: Duration,
        quiet: Duration,
        poll: Duration,
    },
}

/// Timing knobs for one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub navigation_timeout: Duration,
    pub readiness: Readiness,
    pub listing_wait: Duration,
    pub chapters_wait: Duration,
    pub images_wait: Duration,
    /// Interval between selector probes while waiting.
    pub selector_poll: Duration,
    pub scroll_rounds: u32,
    pub scroll_interval: Duration,
    pub load_more_pause: Duration,
    /// Upper bound on load-more clicks per request.
    pub max_load_more: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(90),
            readiness: Readiness::Fixed(Duration::from_secs(5)),
            listing_wait: Duration::from_secs(30),
            chapters_wait: Duration::from_secs(60),
            images_wait: Duration::from_secs(60),
            selector_poll: Duration::from_millis(250),
            scroll_rounds: 10,
            scroll_interval: Duration::from_secs(2),
            load_more_pause: Duration::from_secs(5),
            max_load_more: 50,
        }
    }
}

impl WorkflowConfig {
    fn wait_for(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Listing => self.listing_wait,
            Mode::Chapters => self.chapters_wait,
            Mode::Images => self.images_wait,
        }
    }
}

/// Drives one browser session per request: launch, identify, navigate,
/// settle, extract, close.
///
/// Generic over the browser and the snapshot destination so the whole
/// request lifecycle can be exercised without a real Chromium.
pub struct Workflow<L, S>
where
    L: SessionLauncher,
    S: SnapshotSink,
{
    launcher: L,
    snapshots: S,
    profile: SiteProfile,
    config: WorkflowConfig,
}

impl<L, S> Workflow<L, S>
where
    L: SessionLauncher,
    S: SnapshotSink,
{
    pub fn new(launcher: L, snapshots: S, profile: SiteProfile, config: WorkflowConfig) -> Self {
        Self {
            launcher,
            snapshots,
            profile,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run the extraction for one request.
    ///
    /// The session is closed before this returns on every path that
    /// launched one. An extraction that yields nothing is
    /// [`AppError::EmptyResult`].
    pub async fn run(&self, request: &FetchRequest) -> Result<Extraction, AppError> {
        if request.target_url.trim().is_empty() {
            return Err(AppError::MissingUrl);
        }

        let identity = IdentityProfile::random(&request.target_url);
        tracing::info!("Fetching URL: {}, type: {}", request.target_url, request.mode);

        let session = self.launcher.launch().await?;
        tracing::info!("Browser launched");

        let outcome = self.drive(&session, request, &identity).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {e}");
        }

        let extraction = outcome?;
        if extraction.result.is_empty() {
            return Err(AppError::EmptyResult(request.mode));
        }
        Ok(extraction)
    }

    async fn drive(
        &self,
        session: &L::Session,
        request: &FetchRequest,
        identity: &IdentityProfile,
    ) -> Result<Extraction, AppError> {
        session.apply_identity(identity).await?;

        tracing::info!("Navigating to URL");
        let navigation = session
            .navigate(&request.target_url, self.config.navigation_timeout)
            .await?;
        if let Err(e) = navigation.ensure_ok() {
            tracing::info!(status = ?navigation.status, "Failed response");
            return Err(e);
        }

        self.settle(session).await?;
        self.save_snapshot(session, request.mode).await;

        let mode = request.mode;
        let truncated = match mode {
            Mode::Listing => false,
            Mode::Chapters => self.expand_chapters(session).await?,
            Mode::Images => {
                session.scroll_to_bottom().await?;
                false
            }
        };

        let selector = self.profile.wait_selector(mode);
        tracing::info!("Waiting for {mode} selector");
        self.wait_for_selector(session, selector, self.config.wait_for(mode))
            .await?;

        let html = session.content().await?;
        let base = session
            .current_url()
            .await?
            .or(navigation.final_url)
            .and_then(|u| Url::parse(&u).ok())
            .or_else(|| Url::parse(&request.target_url).ok());

        let result = match mode {
            Mode::Listing => ExtractionResult::Entries(extract_titled_links(
                &html,
                base.as_ref(),
                &self.profile.listing,
            )?),
            Mode::Chapters => ExtractionResult::Entries(extract_titled_links(
                &html,
                base.as_ref(),
                &self.profile.chapters,
            )?),
            Mode::Images => {
                ExtractionResult::Images(extract_images(&html, base.as_ref(), &self.profile.images)?)
            }
        };

        tracing::info!("Returning {} results", result.len());
        Ok(Extraction { result, truncated })
    }

    async fn settle(&self, session: &L::Session) -> Result<(), AppError> {
        match self.config.readiness {
            Readiness::Fixed(delay) => {
                sleep(delay).await;
                Ok(())
            }
            Readiness::Quiescent {
                ceiling,
                quiet,
                poll,
            } => {
                let deadline = Instant::now() + ceiling;
                let mut last_size = session.dom_size().await?;
                let mut stable_since = Instant::now();

                loop {
                    if stable_since.elapsed() >= quiet {
                        tracing::debug!(size = last_size, "DOM quiescent");
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        tracing::debug!(size = last_size, "DOM still changing at ceiling");
                        return Ok(());
                    }
                    sleep(poll).await;
                    let size = session.dom_size().await?;
                    if size != last_size {
                        last_size = size;
                        stable_since = Instant::now();
                    }
                }
            }
        }
    }

    /// Diagnostic only: failures are logged and never affect the response.
    async fn save_snapshot(&self, session: &L::Session, mode: Mode) {
        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not read page content for snapshot: {e}");
                return;
            }
        };
        if let Err(e) = self.snapshots.save(mode, &html).await {
            tracing::warn!("Failed to save debug snapshot: {e}");
        }
    }

    /// Scroll to trigger lazy loading, then click "load more" until it is
    /// gone or the cap is reached. Returns whether the cap cut it short.
    async fn expand_chapters(&self, session: &L::Session) -> Result<bool, AppError> {
        for _ in 0..self.config.scroll_rounds {
            session.scroll_to_bottom().await?;
            sleep(self.config.scroll_interval).await;
        }

        let selectors = &self.profile.load_more_selectors;
        let mut clicks = 0;
        while clicks < self.config.max_load_more {
            match session.click_first(selectors).await? {
                Some(selector) => {
                    clicks += 1;
                    tracing::info!("Clicking load more ({selector})");
                    sleep(self.config.load_more_pause).await;
                }
                None => return Ok(false),
            }
        }

        for selector in selectors {
            if session.has_element(selector).await? {
                tracing::warn!(
                    clicks,
                    "Load-more control still present after cap; returning partial chapter list"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn wait_for_selector(
        &self,
        session: &L::Session,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), AppError> {
        let poll = self.config.selector_poll;
        let appeared = tokio::time::timeout(timeout, async {
            loop {
                if session.has_element(selector).await? {
                    return Ok::<(), AppError>(());
                }
                sleep(poll).await;
            }
        })
        .await;

        match appeared {
            Ok(result) => result,
            Err(_) => Err(AppError::SelectorTimeout {
                selector: selector.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }
}
