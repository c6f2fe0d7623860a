//! Persisted artifacts that live outside the sync loop.

mod waypoints;

pub use waypoints::{Waypoint, WaypointRow, WaypointStore};

use std::path::{Path, PathBuf};

/// Conventional waypoint file location for a target process: one file per
/// process name inside `dir`, so sessions against different games never
/// share a list.
pub fn waypoint_path<P: AsRef<Path>>(dir: P, process_name: &str) -> PathBuf {
    let stem: String = process_name
        .to_ascii_lowercase()
        .trim_end_matches(".exe")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.as_ref().join(format!("{stem}.waypoints.json"))
}
