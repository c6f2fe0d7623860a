//! Game config and hotkey files.
//!
//! The raw TOML schema keeps offsets as text in the hex/decimal rule of
//! [`crate::chain::parse_offset`]; free conversion functions turn the raw
//! structs into domain types so no markup detail leaks past this module.
//!
//! ```toml
//! process = "space_game.exe"
//! move_xy = 5.0
//! move_z = 5.0
//!
//! [position]
//! module = "engine.dll"
//! chain = "0x74B2E8,0x34,0x8"
//! byte_gap = 4
//! axis_order = "xzy"
//! shadow_delta = "0x50"
//!
//! [orientation.sin]
//! chain = "0x74B2E8,0x44"
//! inverted = true
//!
//! [orientation.cos]
//! chain = "0x74B2E8,0x48"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::{
    AxisOrder, OrientationPointers, PointerChain, PositionPointerSet, parse_offset32,
};
use crate::error::{Error, Result};

// ============================================================================
// Raw file schema
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawGameConfig {
    pub process: String,
    pub move_xy: f32,
    pub move_z: f32,
    pub position: RawPositionSpec,
    #[serde(default)]
    pub orientation: Option<RawOrientationSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPositionSpec {
    #[serde(default)]
    pub module: String,
    pub chain: String,
    #[serde(default = "default_byte_gap")]
    pub byte_gap: i32,
    #[serde(default)]
    pub axis_order: AxisOrder,
    #[serde(default)]
    pub shadow_delta: Option<String>,
}

fn default_byte_gap() -> i32 {
    PositionPointerSet::DEFAULT_BYTE_GAP
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrientationSpec {
    pub sin: RawAngleSpec,
    pub cos: RawAngleSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAngleSpec {
    #[serde(default)]
    pub module: String,
    pub chain: String,
    #[serde(default)]
    pub inverted: bool,
}

// ============================================================================
// Domain config
// ============================================================================

/// One attach session's configuration. Replaced wholesale on reload,
/// never mutated field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub process_name: String,
    pub position: PositionPointerSet,
    /// Absent orientation disables heading-relative forward movement.
    pub orientation: Option<OrientationPointers>,
    pub move_xy: f32,
    pub move_z: f32,
}

pub fn pointer_chain_from_spec(module: &str, chain: &str) -> Result<PointerChain> {
    PointerChain::parse(module, chain)
}

pub fn position_set_from_spec(spec: &RawPositionSpec) -> Result<PositionPointerSet> {
    let base = pointer_chain_from_spec(&spec.module, &spec.chain)?;
    let mut set = PositionPointerSet::new(base, spec.byte_gap, spec.axis_order);
    if let Some(delta) = &spec.shadow_delta {
        set = set.with_shadow(parse_offset32(delta)?);
    }
    Ok(set)
}

pub fn orientation_from_spec(spec: &RawOrientationSpec) -> Result<OrientationPointers> {
    Ok(OrientationPointers {
        sin: pointer_chain_from_spec(&spec.sin.module, &spec.sin.chain)?,
        sin_inverted: spec.sin.inverted,
        cos: pointer_chain_from_spec(&spec.cos.module, &spec.cos.chain)?,
        cos_inverted: spec.cos.inverted,
    })
}

/// Move magnitudes must be positive finite floats; anything else is an
/// input error, never silently clamped.
pub fn validate_move_amount(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be a positive finite value, got {value}"
        )))
    }
}

pub fn game_config_from_raw(raw: RawGameConfig) -> Result<GameConfig> {
    if raw.process.trim().is_empty() {
        return Err(Error::InvalidConfig("process name is empty".into()));
    }
    Ok(GameConfig {
        process_name: raw.process,
        position: position_set_from_spec(&raw.position)?,
        orientation: raw
            .orientation
            .as_ref()
            .map(orientation_from_spec)
            .transpose()?,
        move_xy: validate_move_amount("move_xy", raw.move_xy)?,
        move_z: validate_move_amount("move_z", raw.move_z)?,
    })
}

pub fn parse_game_config(text: &str) -> Result<GameConfig> {
    let raw: RawGameConfig =
        toml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    game_config_from_raw(raw)
}

pub fn load_game_config<P: AsRef<Path>>(path: P) -> Result<GameConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config = parse_game_config(&text)?;
    info!(
        "Loaded game config from {} (process '{}')",
        path.display(),
        config.process_name
    );
    Ok(config)
}

// ============================================================================
// Hotkeys
// ============================================================================

/// Key bindings for the five input actions plus the two window flags the
/// UI collaborator honors. `None` means unbound. Replaced wholesale on
/// reload, like [`GameConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeySet {
    pub store_position: Option<u32>,
    pub load_position: Option<u32>,
    pub move_up: Option<u32>,
    pub move_down: Option<u32>,
    pub move_forward: Option<u32>,
    pub top_most: bool,
    pub check_active_window_focus: bool,
}

pub fn load_hotkeys<P: AsRef<Path>>(path: P) -> Result<HotkeySet> {
    let text = std::fs::read_to_string(path.as_ref())?;
    toml::from_str(&text).map_err(|e| Error::InvalidConfig(e.to_string()))
}

pub fn save_hotkeys<P: AsRef<Path>>(path: P, keys: &HotkeySet) -> Result<()> {
    let text =
        toml::to_string_pretty(keys).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    std::fs::write(path.as_ref(), text)?;
    Ok(())
}
