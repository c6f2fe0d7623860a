//! Waypoints command: list a waypoint file and report validation issues.

use std::path::Path;

use anyhow::Result;
use skyhook::{Error, WaypointStore, load_game_config, waypoint_path};

pub fn run(config_path: &Path, file: Option<&Path>, data_dir: &Path) -> Result<()> {
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => {
            let config = load_game_config(config_path)?;
            waypoint_path(data_dir, &config.process_name)
        }
    };

    let store = WaypointStore::load(&path)?;
    println!("{} ({} waypoint(s))", path.display(), store.len());
    for (i, row) in store.list().iter().enumerate() {
        println!(
            "  {:>2}  {:<24} {:>12} {:>12} {:>12}",
            i + 1,
            row.name,
            row.x,
            row.y,
            row.z
        );
    }

    match store.validate_all() {
        Ok(_) => println!("All rows valid."),
        Err(Error::WaypointValidation(errors)) => {
            for error in &errors {
                println!("  !! {error}");
            }
            anyhow::bail!("{} invalid row value(s)", errors.len());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
