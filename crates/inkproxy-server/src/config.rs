use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use inkproxy_client::LaunchOptions;
use inkproxy_core::{AppError, Readiness, WorkflowConfig};

const DEFAULT_DEBUG_DIR: &str = "/tmp/debug";
const MAX_SETTLE_SECS: u64 = 60;
/// Headroom between the workflow's navigation bound and the CDP command bound.
const CDP_REQUEST_SLACK: Duration = Duration::from_secs(5);

/// Command-line and environment configuration for the `inkproxy` binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "inkproxy", version, about = "Headless-browser extraction proxy")]
pub struct ServerConfig {
    /// Port to listen on (bound on 0.0.0.0)
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Browser executable; probed from well-known locations when unset
    #[arg(long, env = "CHROME_BIN")]
    pub chrome_bin: Option<PathBuf>,

    /// Root directory for browser profiles
    #[arg(
        long,
        env = "INKPROXY_USER_DATA_DIR",
        default_value = "/tmp/inkproxy_user_data"
    )]
    pub user_data_dir: PathBuf,

    /// Directory for debug snapshots (falls back to RAILWAY_VOLUME_MOUNT_PATH)
    #[arg(long, env = "INKPROXY_DEBUG_DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Disable debug snapshots
    #[arg(long, env = "INKPROXY_NO_SNAPSHOTS", default_value_t = false)]
    pub no_snapshots: bool,

    /// Upper bound on a single navigation
    #[arg(long, env = "INKPROXY_NAVIGATION_TIMEOUT_SECS", default_value_t = 90)]
    pub navigation_timeout_secs: u64,

    /// Fixed settle delay after navigation
    #[arg(long, env = "INKPROXY_SETTLE_SECS", default_value_t = 5)]
    pub settle_secs: u64,

    /// Maximum number of load-more clicks per chapters request
    #[arg(long, env = "INKPROXY_MAX_LOAD_MORE", default_value_t = 50)]
    pub max_load_more: u32,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_load_more == 0 {
            return Err(AppError::ConfigError(
                "--max-load-more must be at least 1".to_string(),
            ));
        }
        if self.settle_secs > MAX_SETTLE_SECS {
            return Err(AppError::ConfigError(format!(
                "--settle-secs must not exceed {MAX_SETTLE_SECS}, got {}",
                self.settle_secs
            )));
        }
        if self.navigation_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "--navigation-timeout-secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Where debug snapshots go, or `None` when they are disabled.
    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        if self.no_snapshots {
            return None;
        }
        let dir = self.debug_dir.clone().unwrap_or_else(|| {
            std::env::var_os("RAILWAY_VOLUME_MOUNT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEBUG_DIR))
        });
        Some(dir)
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            executable: self.chrome_bin.clone(),
            user_data_dir: Some(self.user_data_dir.clone()),
            request_timeout: Duration::from_secs(self.navigation_timeout_secs) + CDP_REQUEST_SLACK,
            ..LaunchOptions::default()
        }
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            readiness: Readiness::Fixed(Duration::from_secs(self.settle_secs)),
            max_load_more: self.max_load_more,
            ..WorkflowConfig::default()
        }
    }
}
