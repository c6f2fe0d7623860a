//! Pointer chains: the declarative path from a module base to a live
//! address inside the target process.

mod orientation;
mod position;

pub use orientation::OrientationPointers;
pub use position::{AxisOrder, PositionPointerSet};

use crate::error::{Error, Result};
use crate::memory::MemoryAccess;

/// Parse offset text: `""` is zero, `0x…` is hex, `-0x…` is negated hex,
/// anything else is signed decimal.
pub fn parse_offset(text: &str) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16)
            .map_err(|_| Error::OffsetParse(text.to_string()));
    }
    if let Some(hex) = text.strip_prefix("-0x") {
        return i64::from_str_radix(hex, 16)
            .map(|v| -v)
            .map_err(|_| Error::OffsetParse(text.to_string()));
    }
    text.parse::<i64>()
        .map_err(|_| Error::OffsetParse(text.to_string()))
}

/// Same rule narrowed to the chain-offset width.
pub fn parse_offset32(text: &str) -> Result<i32> {
    let value = parse_offset(text)?;
    i32::try_from(value).map_err(|_| Error::OffsetParse(text.to_string()))
}

/// Render an offset so that it reparses to the same value.
pub fn format_offset(value: i64) -> String {
    if value < 0 {
        format!("-{:#x}", value.unsigned_abs())
    } else {
        format!("{value:#x}")
    }
}

/// A multi-level dereference path: `module base + base offset`, then for
/// each chain offset read a pointer at the current address and add the
/// offset. The address after the last offset is where the scalar lives.
///
/// Chains are immutable once built. Resolution is recomputed on every use
/// and never cached: module bases and intermediate heap pointers move
/// between ticks and across target restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerChain {
    module: String,
    base_offset: i64,
    offsets: Vec<i32>,
}

impl PointerChain {
    pub fn new(module: impl Into<String>, base_offset: i64, offsets: Vec<i32>) -> Self {
        Self {
            module: module.into(),
            base_offset,
            offsets,
        }
    }

    /// Parse the comma-separated chain form `base,off1,off2,…`, each element
    /// in the offset text rule. `module` empty means the main module.
    pub fn parse(module: &str, text: &str) -> Result<Self> {
        let mut parts = text.split(',');
        let base_offset = parse_offset(parts.next().unwrap_or(""))?;
        let offsets = parts.map(parse_offset32).collect::<Result<Vec<_>>>()?;
        Ok(Self::new(module, base_offset, offsets))
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn base_offset(&self) -> i64 {
        self.base_offset
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Render back to the comma-separated form accepted by [`parse`].
    ///
    /// [`parse`]: PointerChain::parse
    pub fn to_chain_text(&self) -> String {
        let mut out = format_offset(self.base_offset);
        for &off in &self.offsets {
            out.push(',');
            out.push_str(&format_offset(off as i64));
        }
        out
    }

    /// Copy of this chain with `delta` added to the last offset, or to the
    /// base offset when the chain has no offsets. This is how axis and
    /// shadow addresses are derived from one configured chain.
    pub fn with_last_offset_delta(&self, delta: i32) -> Self {
        let mut derived = self.clone();
        match derived.offsets.last_mut() {
            Some(last) => *last = last.wrapping_add(delta),
            None => derived.base_offset = derived.base_offset.wrapping_add(delta as i64),
        }
        derived
    }

    /// Walk the chain against the target's current state and produce the
    /// final address. Fails when the module is not loaded or an
    /// intermediate dereference touches unmapped memory; the caller owns
    /// retry policy.
    pub fn resolve<A: MemoryAccess + ?Sized>(&self, mem: &A) -> Result<u64> {
        let base = mem.module_base(&self.module)?;
        let mut addr = base.wrapping_add_signed(self.base_offset);
        for &off in &self.offsets {
            let ptr = mem.read_u64(addr)?;
            addr = ptr.wrapping_add_signed(off as i64);
        }
        Ok(addr)
    }
}
