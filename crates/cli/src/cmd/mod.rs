//! CLI command implementations

pub mod add;
pub mod config;
pub mod kv;
pub mod list;
pub mod remove;
pub mod run;
pub mod sync;

use anyhow::Result;
use mirror_cli::{system_config, AppContext, AppPaths, ConsoleNotifier};
use std::sync::Arc;

/// Load the config file and the snapshot
pub fn open_context(paths: &AppPaths) -> Result<AppContext> {
    let config = system_config::load(&paths.config_file)?;
    AppContext::open(&paths.data_dir, config, Arc::new(ConsoleNotifier))
}
