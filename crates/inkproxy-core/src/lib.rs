pub mod error;
pub mod extract;
pub mod identity;
pub mod models;
pub mod profile;
pub mod snapshot;
pub mod traits;
pub mod workflow;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use identity::IdentityProfile;
pub use models::{Entry, Extraction, ExtractionResult, FetchRequest, Mode, NavigationOutcome};
pub use profile::SiteProfile;
pub use snapshot::FileSnapshots;
pub use traits::{BrowserSession, NullSnapshots, SessionLauncher, SnapshotSink};
pub use workflow::{Readiness, Workflow, WorkflowConfig};
