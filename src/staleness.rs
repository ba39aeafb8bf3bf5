//! # Staleness Policy
//!
//! Decides whether a minified artifact has to be regenerated.
//!
//! A destination is stale when it is missing or older than its source. A
//! missing destination is modelled as `None` rather than an epoch sentinel, so
//! it compares older than every source, even one stamped at the epoch itself.

use std::path::Path;
use std::time::SystemTime;

pub struct StalenessPolicy;

impl StalenessPolicy {
    /// Whether the destination must be (re)built
    pub fn needs_rebuild(source_modified: SystemTime, dest_modified: Option<SystemTime>, force: bool) -> bool {
        if force {
            return true;
        }
        match dest_modified {
            Some(dest) => dest < source_modified,
            None => true,
        }
    }

    /// Modification time of `path`, `None` if it does not exist or is unreadable
    pub fn modification_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}
