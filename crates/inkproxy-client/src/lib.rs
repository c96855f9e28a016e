pub mod chromium;

pub use chromium::{ChromiumLauncher, ChromiumSession, LaunchOptions};
