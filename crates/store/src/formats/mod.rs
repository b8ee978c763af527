//! Codecs for every snapshot format version
//!
//! | Version | Watch entry                                                           | Settings entry end |
//! |---------|-----------------------------------------------------------------------|--------------------|
//! | 1       | watch, sync, legacy filter string, recursive, add, delete             | no                 |
//! | 2       | v1 + observe                                                          | yes                |
//! | 3       | watch, sync, filter records, recursive, add, delete, observe          | yes                |
//! | 4       | name + v3 + delay                                                     | yes                |
//!
//! Versions before 4 read back the watch directory as the name and no delay.

mod v1;
mod v2;
mod v3;
mod v4;

pub use v1::FormatV1;
pub use v2::FormatV2;
pub use v3::FormatV3;
pub use v4::FormatV4;

use mirror_core::WatchConfig;
use std::path::PathBuf;

/// Legacy single filter string, written by v1 and v2 but never interpreted
pub(crate) const LEGACY_FILTER: &str = "*";

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Watch with the fields every version stores
fn base_watch(watch_dir: String, sync_dir: String) -> WatchConfig {
    WatchConfig::new(PathBuf::from(watch_dir), PathBuf::from(sync_dir))
}
