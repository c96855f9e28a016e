//! Test utilities: mock implementations of the browser and snapshot traits.
//!
//! Handwritten mocks for dependency injection in unit and integration
//! tests. All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls after the workflow has consumed them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::identity::IdentityProfile;
use crate::models::{Mode, NavigationOutcome};
use crate::traits::{BrowserSession, SessionLauncher, SnapshotSink};
use crate::workflow::{Readiness, WorkflowConfig};

/// The load-more selector the mock page exposes while clicks remain.
pub const MOCK_LOAD_MORE: &str = "button.load-more";

// ---------------------------------------------------------------------------
// MockLauncher / MockSession
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PageScript {
    html: String,
    status: Option<u16>,
    navigation_error: Option<String>,
    present: Vec<String>,
    load_more_remaining: u32,
    dom_sizes: VecDeque<usize>,
    growing_dom: bool,
    /// Markup and selector swapped in once the last load-more click lands.
    revealed: Option<(String, String)>,
    failing_click: Option<String>,
    failing_content: Option<String>,
}

#[derive(Debug, Default)]
struct Recorded {
    launches: u32,
    closes: u32,
    clicks: u32,
    scrolls: u32,
    dom_probes: u32,
    navigations: Vec<String>,
    user_agents: Vec<&'static str>,
}

#[derive(Debug, Default)]
struct MockState {
    script: PageScript,
    recorded: Recorded,
    launch_error: Option<String>,
}

/// Mock launcher whose sessions all serve the same scripted page.
///
/// Clones share state, so a test can keep one handle and hand another to
/// the workflow.
#[derive(Clone, Debug)]
pub struct MockLauncher {
    state: Arc<Mutex<MockState>>,
}

impl MockLauncher {
    /// A page answering 200 with `html`. No selector is present until
    /// [`with_selector`](Self::with_selector) says so.
    pub fn serving(html: &str) -> Self {
        let state = MockState {
            script: PageScript {
                html: html.to_string(),
                status: Some(200),
                ..PageScript::default()
            },
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A launcher that never manages to start a browser.
    pub fn failing(message: &str) -> Self {
        let launcher = Self::serving("");
        launcher.state.lock().unwrap().launch_error = Some(message.to_string());
        launcher
    }

    pub fn with_selector(self, selector: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .script
            .present
            .push(selector.to_string());
        self
    }

    pub fn with_status(self, status: u16) -> Self {
        self.state.lock().unwrap().script.status = Some(status);
        self
    }

    pub fn with_navigation_error(self, message: &str) -> Self {
        self.state.lock().unwrap().script.navigation_error = Some(message.to_string());
        self
    }

    /// Expose [`MOCK_LOAD_MORE`] for `clicks` clicks.
    pub fn with_load_more(self, clicks: u32) -> Self {
        self.state.lock().unwrap().script.load_more_remaining = clicks;
        self
    }

    /// Serve `html` (and expose `selector`) only after the last load-more
    /// click, as a page that renders its list on demand would.
    pub fn with_revealed_after_load_more(self, html: &str, selector: &str) -> Self {
        self.state.lock().unwrap().script.revealed = Some((html.to_string(), selector.to_string()));
        self
    }

    /// Every click on an exposed load-more control fails with a browser error.
    pub fn with_failing_click(self, message: &str) -> Self {
        self.state.lock().unwrap().script.failing_click = Some(message.to_string());
        self
    }

    /// Reading the page markup fails with a browser error.
    pub fn with_failing_content(self, message: &str) -> Self {
        self.state.lock().unwrap().script.failing_content = Some(message.to_string());
        self
    }

    /// DOM sizes returned by successive probes; the last one repeats.
    pub fn with_dom_sizes(self, sizes: Vec<usize>) -> Self {
        self.state.lock().unwrap().script.dom_sizes = sizes.into();
        self
    }

    /// Every probe reports a larger DOM than the last.
    pub fn with_growing_dom(self) -> Self {
        self.state.lock().unwrap().script.growing_dom = true;
        self
    }

    pub fn launches(&self) -> u32 {
        self.state.lock().unwrap().recorded.launches
    }

    pub fn closes(&self) -> u32 {
        self.state.lock().unwrap().recorded.closes
    }

    pub fn clicks(&self) -> u32 {
        self.state.lock().unwrap().recorded.clicks
    }

    pub fn scrolls(&self) -> u32 {
        self.state.lock().unwrap().recorded.scrolls
    }

    pub fn dom_probes(&self) -> u32 {
        self.state.lock().unwrap().recorded.dom_probes
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().recorded.navigations.clone()
    }

    pub fn user_agents(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().recorded.user_agents.clone()
    }
}

impl SessionLauncher for MockLauncher {
    type Session = MockSession;

    async fn launch(&self) -> Result<MockSession, AppError> {
        let mut state = self.state.lock().unwrap();
        state.recorded.launches += 1;
        if let Some(message) = &state.launch_error {
            return Err(AppError::LaunchFailed(message.clone()));
        }
        Ok(MockSession {
            state: Arc::clone(&self.state),
        })
    }
}

/// Session handed out by [`MockLauncher`].
#[derive(Debug)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl BrowserSession for MockSession {
    async fn apply_identity(&self, identity: &IdentityProfile) -> Result<(), AppError> {
        self.state
            .lock()
            .unwrap()
            .recorded
            .user_agents
            .push(identity.user_agent);
        Ok(())
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<NavigationOutcome, AppError> {
        let mut state = self.state.lock().unwrap();
        state.recorded.navigations.push(url.to_string());
        if let Some(message) = &state.script.navigation_error {
            return Err(AppError::NavigationFailed(message.clone()));
        }
        Ok(NavigationOutcome {
            status: state.script.status,
            final_url: Some(url.to_string()),
        })
    }

    async fn dom_size(&self) -> Result<usize, AppError> {
        let mut state = self.state.lock().unwrap();
        state.recorded.dom_probes += 1;
        if state.script.growing_dom {
            return Ok(state.recorded.dom_probes as usize * 100);
        }
        let sizes = &mut state.script.dom_sizes;
        let size = if sizes.len() > 1 {
            sizes.pop_front()
        } else {
            sizes.front().copied()
        };
        Ok(size.unwrap_or(state.script.html.len()))
    }

    async fn content(&self) -> Result<String, AppError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.script.failing_content {
            return Err(AppError::Browser(message.clone()));
        }
        Ok(state.script.html.clone())
    }

    async fn current_url(&self) -> Result<Option<String>, AppError> {
        Ok(self.state.lock().unwrap().recorded.navigations.last().cloned())
    }

    async fn has_element(&self, selector: &str) -> Result<bool, AppError> {
        let state = self.state.lock().unwrap();
        let script = &state.script;
        Ok(script.present.iter().any(|s| s == selector)
            || (selector == MOCK_LOAD_MORE && script.load_more_remaining > 0))
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().recorded.scrolls += 1;
        Ok(())
    }

    async fn click_first(&self, selectors: &[String]) -> Result<Option<String>, AppError> {
        let mut state = self.state.lock().unwrap();
        let exposed = selectors.iter().any(|s| s == MOCK_LOAD_MORE);
        if !exposed || state.script.load_more_remaining == 0 {
            return Ok(None);
        }
        if let Some(message) = &state.script.failing_click {
            return Err(AppError::Browser(message.clone()));
        }

        let script = &mut state.script;
        script.load_more_remaining -= 1;
        if script.load_more_remaining == 0 {
            if let Some((html, selector)) = script.revealed.take() {
                script.html = html;
                script.present.push(selector);
            }
        }
        state.recorded.clicks += 1;
        Ok(Some(MOCK_LOAD_MORE.to_string()))
    }

    async fn close(self) -> Result<(), AppError> {
        self.state.lock().unwrap().recorded.closes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSnapshots
// ---------------------------------------------------------------------------

/// Mock snapshot sink that records every save, optionally failing.
#[derive(Clone, Debug, Default)]
pub struct MockSnapshots {
    saved: Arc<Mutex<Vec<(Mode, String)>>>,
    fail: bool,
}

impl MockSnapshots {
    /// A sink whose every save fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            saved: Arc::default(),
            fail: true,
        }
    }

    pub fn saved(&self) -> Vec<(Mode, String)> {
        self.saved.lock().unwrap().clone()
    }
}

impl SnapshotSink for MockSnapshots {
    async fn save(&self, mode: Mode, html: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only volume",
            )));
        }
        self.saved.lock().unwrap().push((mode, html.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Workflow timings shrunk to milliseconds, for tests running on real time.
pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        navigation_timeout: Duration::from_millis(200),
        readiness: Readiness::Fixed(Duration::ZERO),
        listing_wait: Duration::from_millis(50),
        chapters_wait: Duration::from_millis(50),
        images_wait: Duration::from_millis(50),
        selector_poll: Duration::from_millis(5),
        scroll_rounds: 2,
        scroll_interval: Duration::ZERO,
        load_more_pause: Duration::ZERO,
        max_load_more: 5,
    }
}
