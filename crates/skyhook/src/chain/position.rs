use serde::Deserialize;

use crate::chain::PointerChain;
use crate::error::Result;
use crate::memory::MemoryAccess;

/// Field order of the position vector in target memory. `Xzy` means the
/// engine stores height as the second float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    #[default]
    Xyz,
    Xzy,
}

/// Derives the X/Y/Z (and optional shadow) addresses from one base chain.
///
/// Each axis is the base chain with `0`, `byte_gap` or `2·byte_gap` added
/// to its last offset; the shadow set adds `shadow_delta` on top first.
/// Axes resolve independently each tick, so a pointer moving between two
/// axis resolutions can skew one read against the others for that tick.
/// That is an accepted trade-off: fixing it would need a batched remote
/// read the accessor contract does not offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPointerSet {
    base: PointerChain,
    byte_gap: i32,
    axis_order: AxisOrder,
    shadow_delta: Option<i32>,
}

impl PositionPointerSet {
    pub const DEFAULT_BYTE_GAP: i32 = 4;

    pub fn new(base: PointerChain, byte_gap: i32, axis_order: AxisOrder) -> Self {
        Self {
            base,
            byte_gap,
            axis_order,
            shadow_delta: None,
        }
    }

    /// Configure a shadow set: a duplicate position representation the
    /// target keeps at a fixed byte distance, written in lockstep with the
    /// primary.
    pub fn with_shadow(mut self, delta: i32) -> Self {
        self.shadow_delta = Some(delta);
        self
    }

    pub fn base(&self) -> &PointerChain {
        &self.base
    }

    pub fn byte_gap(&self) -> i32 {
        self.byte_gap
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow_delta.is_some()
    }

    fn axis_deltas(&self) -> [i32; 3] {
        let gap = self.byte_gap;
        match self.axis_order {
            AxisOrder::Xyz => [0, gap, gap * 2],
            AxisOrder::Xzy => [0, gap * 2, gap],
        }
    }

    /// The three primary chains in X, Y, Z order.
    pub fn axis_chains(&self) -> [PointerChain; 3] {
        self.axis_deltas()
            .map(|delta| self.base.with_last_offset_delta(delta))
    }

    /// The three shadow chains in X, Y, Z order, when configured.
    pub fn shadow_chains(&self) -> Option<[PointerChain; 3]> {
        let shadow_base = self.base.with_last_offset_delta(self.shadow_delta?);
        Some(
            self.axis_deltas()
                .map(|delta| shadow_base.with_last_offset_delta(delta)),
        )
    }

    /// Resolve and read all three axes. Each axis resolves its own full
    /// chain; see the type docs for the skew trade-off.
    pub fn read<A: MemoryAccess + ?Sized>(&self, mem: &A) -> Result<[f32; 3]> {
        let [x, y, z] = self.axis_chains();
        Ok([
            mem.read_f32(x.resolve(mem)?)?,
            mem.read_f32(y.resolve(mem)?)?,
            mem.read_f32(z.resolve(mem)?)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;

    fn base_chain() -> PointerChain {
        PointerChain::new("", 0x100, vec![0x10])
    }

    #[test]
    fn test_axis_deltas_xyz() {
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xyz);
        let [x, y, z] = set.axis_chains();
        assert_eq!(x.offsets(), &[0x10]);
        assert_eq!(y.offsets(), &[0x14]);
        assert_eq!(z.offsets(), &[0x18]);
    }

    #[test]
    fn test_axis_deltas_xzy_swaps_height() {
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xzy);
        let [x, y, z] = set.axis_chains();
        assert_eq!(x.offsets(), &[0x10]);
        assert_eq!(y.offsets(), &[0x18]);
        assert_eq!(z.offsets(), &[0x14]);
    }

    #[test]
    fn test_axis_deltas_respect_byte_gap() {
        let set = PositionPointerSet::new(base_chain(), 8, AxisOrder::Xyz);
        let [_, y, z] = set.axis_chains();
        assert_eq!(y.offsets(), &[0x18]);
        assert_eq!(z.offsets(), &[0x20]);
    }

    #[test]
    fn test_empty_offsets_derive_on_base_offset() {
        let set = PositionPointerSet::new(
            PointerChain::new("", 0x100, vec![]),
            4,
            AxisOrder::Xyz,
        );
        let [x, y, z] = set.axis_chains();
        assert_eq!(x.base_offset(), 0x100);
        assert_eq!(y.base_offset(), 0x104);
        assert_eq!(z.base_offset(), 0x108);
    }

    #[test]
    fn test_shadow_applies_delta_before_axis_deltas() {
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xyz).with_shadow(0x50);
        let [x, y, z] = set.shadow_chains().unwrap();
        assert_eq!(x.offsets(), &[0x60]);
        assert_eq!(y.offsets(), &[0x64]);
        assert_eq!(z.offsets(), &[0x68]);
    }

    #[test]
    fn test_no_shadow_by_default() {
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xyz);
        assert!(!set.has_shadow());
        assert!(set.shadow_chains().is_none());
    }

    #[test]
    fn test_read_resolves_each_axis() {
        // Chain [0x40_0100] + 0x10 points at a float triple.
        let mem = MockMemory::builder(0x40_0000)
            .u64_at(0x40_0100, 0x50_0000)
            .f32_at(0x50_0010, 1.5)
            .f32_at(0x50_0014, -2.0)
            .f32_at(0x50_0018, 128.25)
            .build();
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xyz);
        assert_eq!(set.read(&mem).unwrap(), [1.5, -2.0, 128.25]);
    }

    #[test]
    fn test_read_xzy_maps_second_field_to_height() {
        let mem = MockMemory::builder(0x40_0000)
            .u64_at(0x40_0100, 0x50_0000)
            .f32_at(0x50_0010, 1.0)
            .f32_at(0x50_0014, 99.0) // height stored second
            .f32_at(0x50_0018, 2.0)
            .build();
        let set = PositionPointerSet::new(base_chain(), 4, AxisOrder::Xzy);
        assert_eq!(set.read(&mem).unwrap(), [1.0, 2.0, 99.0]);
    }
}
