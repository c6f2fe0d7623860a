//! Terminal hotkey handling.
//!
//! A dedicated thread polls for key events and translates them into
//! [`InputAction`]s for the sync loop; it never touches session state
//! directly. Esc, q and Ctrl+C stop the program; digits 1-9 teleport to
//! the matching waypoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use skyhook::{HotkeySet, InputAction, SessionHandle, Waypoint, load_hotkeys};
use tracing::{debug, info, warn};

use crate::shutdown::StopSignal;

/// Map a terminal key to the virtual-key code space used in hotkey files:
/// letters and digits as their uppercase ASCII value, function keys as
/// `0x6F + n`.
pub fn key_code(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Char(c) if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase() as u32),
        KeyCode::F(n) => Some(0x6F + n as u32),
        _ => None,
    }
}

fn is_quit(event: &KeyEvent) -> bool {
    match event.code {
        KeyCode::Esc => true,
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => true,
        _ => false,
    }
}

/// Resolve a key event against the configured bindings.
pub fn action_for(keys: &HotkeySet, event: &KeyEvent) -> Option<InputAction> {
    let code = key_code(event.code)?;
    let bound = [
        (keys.store_position, InputAction::StorePosition),
        (keys.load_position, InputAction::LoadPosition),
        (keys.move_up, InputAction::MoveUp),
        (keys.move_down, InputAction::MoveDown),
        (keys.move_forward, InputAction::MoveForward),
    ];
    bound
        .into_iter()
        .find(|(binding, _)| *binding == Some(code))
        .map(|(_, action)| action)
}

/// Digit keys select a waypoint: `1` is the first row.
fn waypoint_index(event: &KeyEvent) -> Option<usize> {
    match event.code {
        KeyCode::Char(c @ '1'..='9') => Some(c as usize - '1' as usize),
        _ => None,
    }
}

/// Spawn the key listener. It runs until a quit key arrives or `stop` is
/// requested from elsewhere. `r` reloads the hotkey file in place and
/// flags a config reload for the tick loop to pick up.
pub fn spawn_key_listener(
    stop: Arc<StopSignal>,
    session: SessionHandle,
    mut keys: HotkeySet,
    hotkeys_path: PathBuf,
    waypoints: Vec<Waypoint>,
    reload: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Key listener started");
        while !stop.requested() {
            if !event::poll(Duration::from_millis(100)).unwrap_or(false) {
                continue;
            }
            let Ok(Event::Key(key_event)) = event::read() else {
                continue;
            };
            if is_quit(&key_event) {
                debug!("Quit key pressed: {:?}", key_event.code);
                stop.request();
                break;
            }
            if let Some(action) = action_for(&keys, &key_event) {
                if !session.submit(action) {
                    debug!("Dropped input, action queue full");
                }
            } else if matches!(key_event.code, KeyCode::Char('r' | 'R')) {
                match load_hotkeys(&hotkeys_path) {
                    Ok(fresh) => {
                        keys = fresh;
                        info!("Reloaded hotkeys from {}", hotkeys_path.display());
                    }
                    Err(e) => warn!("Hotkey reload failed, keeping previous: {}", e),
                }
                reload.store(true, Ordering::SeqCst);
            } else if let Some(index) = waypoint_index(&key_event)
                && let Some(w) = waypoints.get(index)
            {
                debug!("Teleporting to waypoint {} ({})", index + 1, w.name);
                session.submit(InputAction::SetStored {
                    x: w.x,
                    y: w.y,
                    z: w.z,
                });
                session.submit(InputAction::LoadPosition);
            }
        }
        debug!("Key listener stopped");
    })
}
