//! # skyhook
//!
//! Core library for the Skyhook position trainer.
//!
//! This crate provides:
//! - Pointer-chain parsing and resolution against a live process
//! - Position and orientation pointer sets derived from one base chain
//! - Remote process memory access behind a single trait boundary
//! - The attach/sample/write sync loop and its session handle
//! - Waypoint list editing and persistence

pub mod chain;
pub mod config;
pub mod error;
pub mod memory;
pub mod session;
pub mod storage;

pub use chain::{
    AxisOrder, OrientationPointers, PointerChain, PositionPointerSet, format_offset,
    parse_offset, parse_offset32,
};
pub use config::{
    GameConfig, HotkeySet, load_game_config, load_hotkeys, parse_game_config, save_hotkeys,
};
pub use error::{Error, Result, RowError};
pub use memory::{MemoryAccess, ProcessHandle, find_process, open_process};
pub use session::{
    AttachState, Heading, InputAction, ProcessSource, Sample, SessionHandle, SyncLoop,
    SystemProcessSource,
};
pub use storage::{Waypoint, WaypointRow, WaypointStore, waypoint_path};
