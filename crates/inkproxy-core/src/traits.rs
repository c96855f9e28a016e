use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::identity::IdentityProfile;
use crate::models::{Mode, NavigationOutcome};

/// Starts isolated browser sessions, one per request.
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    /// Start a browser with one blank page, bounded by the launcher's own timeout.
    fn launch(&self) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}

/// One browser process and one page, driven by a single workflow run.
///
/// `close` consumes the session, so it runs at most once.
pub trait BrowserSession: Send + Sync + Sized {
    /// Set the User-Agent override and extra HTTP headers.
    fn apply_identity(
        &self,
        identity: &IdentityProfile,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Load `url` and wait for the network to settle, bounded by `timeout`.
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<NavigationOutcome, AppError>> + Send;

    /// Size of the current markup; a cheap signal for DOM quiescence.
    fn dom_size(&self) -> impl Future<Output = Result<usize, AppError>> + Send;

    /// The fully rendered markup.
    fn content(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// The page's current URL, if any.
    fn current_url(&self) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Whether at least one element matches `selector` right now.
    fn has_element(&self, selector: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn scroll_to_bottom(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Click the first element of the first selector that matches anything.
    ///
    /// Returns the selector that was clicked, or `None` if nothing matched.
    fn click_first(
        &self,
        selectors: &[String],
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Terminate the browser.
    fn close(self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Receives the rendered markup of each request for offline troubleshooting.
pub trait SnapshotSink: Send + Sync {
    fn save(&self, mode: Mode, html: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op SnapshotSink for use when snapshots are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSnapshots;

impl SnapshotSink for NullSnapshots {
    async fn save(&self, _mode: Mode, _html: &str) -> Result<(), AppError> {
        Ok(())
    }
}
