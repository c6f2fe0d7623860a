//! Main trainer mode: attach, sample, dispatch hotkeys.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use skyhook::config::validate_move_amount;
use skyhook::{
    AttachState, Error, HotkeySet, SyncLoop, SystemProcessSource, Waypoint, WaypointStore,
    load_game_config, load_hotkeys, waypoint_path,
};
use tracing::{info, warn};

use crate::input;
use crate::shutdown::StopSignal;

pub fn run(
    config_path: &Path,
    hotkeys_path: &Path,
    data_dir: &Path,
    move_xy: Option<f32>,
    move_z: Option<f32>,
) -> Result<()> {
    let config = reload_config(config_path, move_xy, move_z)?;

    let keys = match load_hotkeys(hotkeys_path) {
        Ok(keys) => keys,
        Err(e) => {
            warn!(
                "No usable hotkey file at {} ({}), all actions unbound",
                hotkeys_path.display(),
                e
            );
            HotkeySet::default()
        }
    };

    let waypoints = load_waypoints(data_dir, &config.process_name)?;
    if !waypoints.is_empty() {
        info!("{} waypoint(s) on digit keys 1-9", waypoints.len());
    }

    let stop = Arc::new(StopSignal::new());
    let stop_ctrlc = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        stop_ctrlc.request();
    })?;

    let reload = Arc::new(AtomicBool::new(false));
    let (mut sync_loop, session) = SyncLoop::new(config, SystemProcessSource);
    let keyboard = input::spawn_key_listener(
        Arc::clone(&stop),
        session.clone(),
        keys,
        hotkeys_path.to_path_buf(),
        waypoints,
        Arc::clone(&reload),
    );

    println!(
        "Waiting for {}... (press Esc or q to quit, r to reload)",
        sync_loop.config().process_name
    );
    let mut last_state = AttachState::Searching;
    while !stop.requested() {
        if reload.swap(false, Ordering::SeqCst) {
            match reload_config(config_path, move_xy, move_z) {
                Ok(fresh) => {
                    sync_loop.set_config(fresh);
                    last_state = AttachState::Searching;
                    println!("Config reloaded, re-attaching...");
                }
                Err(e) => warn!("Config reload failed, keeping previous: {}", e),
            }
        }
        sync_loop.tick();
        let state = session.state();
        if state != last_state {
            match state {
                AttachState::Attached => println!("Attached. Hotkeys are live."),
                AttachState::Searching => println!("Process gone, searching again..."),
            }
            last_state = state;
        }
        if stop.wait_for(sync_loop.poll_interval()) {
            break;
        }
    }

    // Tick source is stopped; join the listener, then the loop (and its
    // process handle) drops last.
    let _ = keyboard.join();
    drop(sync_loop);
    info!("Stopped");
    Ok(())
}

fn reload_config(
    config_path: &Path,
    move_xy: Option<f32>,
    move_z: Option<f32>,
) -> Result<skyhook::GameConfig> {
    let mut config = load_game_config(config_path)?;
    if let Some(step) = move_xy {
        config.move_xy = validate_move_amount("move_xy", step)?;
    }
    if let Some(step) = move_z {
        config.move_z = validate_move_amount("move_z", step)?;
    }
    Ok(config)
}

fn load_waypoints(data_dir: &Path, process_name: &str) -> Result<Vec<Waypoint>> {
    let path = waypoint_path(data_dir, process_name);
    match WaypointStore::load(&path) {
        Ok(store) => Ok(store.validate_all()?),
        Err(Error::WaypointsNotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
