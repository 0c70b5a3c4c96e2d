use std::{path::PathBuf, time::Duration};

use clap::Parser;
use dropzone_loop::WatchdogConfig;

/// Headless drag-and-drop scenario runner
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DropzoneCliOptions {
    /// Scenario file to play (RON)
    pub scenario: PathBuf,
    /// Cancel a released drag whose drop target has not answered after this many milliseconds
    #[clap(long, default_value = "5000")]
    pub drop_timeout_ms: u64,
    /// Wait for the drop target forever
    #[clap(long)]
    pub no_watchdog: bool,
}

impl DropzoneCliOptions {
    pub fn watchdog(&self) -> Option<WatchdogConfig> {
        if self.no_watchdog {
            None
        } else {
            Some(WatchdogConfig {
                drop_timeout: Duration::from_millis(self.drop_timeout_ms),
            })
        }
    }
}
