//! Mirror command-line application
//!
//! Library half of the `mirror` binary: the application context tying the
//! snapshot store to live watch sessions, the daemon configuration file and
//! console output helpers.

pub mod console;
pub mod context;
pub mod system_config;
pub mod util;

pub use console::ConsoleNotifier;
pub use context::AppContext;
pub use system_config::{SystemConfig, SystemConfigError};
pub use util::AppPaths;
