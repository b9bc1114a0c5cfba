//! Command implementations for the claude-monitor-lite CLI
//!
//! Each subcommand lives in its own module and takes the loaded
//! [`Config`](crate::config::Config) explicitly.

pub mod control;
pub mod start;
pub mod status;
pub mod stop;
#[cfg(feature = "tui")]
pub mod watch;

pub use control::{run_refresh, run_show};
pub use start::run_auto_start;
pub use status::run_status;
pub use stop::{run_logout, run_stop};
#[cfg(feature = "tui")]
pub use watch::run_watch;

pub const NOT_RUNNING_MESSAGE: &str = "Claude Monitor Lite is not running.";
