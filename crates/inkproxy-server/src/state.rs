use inkproxy_core::{SessionLauncher, SnapshotSink, Workflow};

/// Shared application state, available to all route handlers via `State<Arc<AppState<L, S>>>`.
pub struct AppState<L, S>
where
    L: SessionLauncher,
    S: SnapshotSink,
{
    pub workflow: Workflow<L, S>,
}
