use crate::chain::PointerChain;
use crate::error::Result;
use crate::memory::MemoryAccess;

/// Chains for the two heading scalars (sin and cos of the avatar's
/// rotation around the vertical axis). An inverted flag negates the raw
/// sampled value before it is used anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationPointers {
    pub sin: PointerChain,
    pub sin_inverted: bool,
    pub cos: PointerChain,
    pub cos_inverted: bool,
}

impl OrientationPointers {
    /// Sample both scalars, post-inversion.
    pub fn read<A: MemoryAccess + ?Sized>(&self, mem: &A) -> Result<(f32, f32)> {
        let mut sin = mem.read_f32(self.sin.resolve(mem)?)?;
        if self.sin_inverted {
            sin = -sin;
        }
        let mut cos = mem.read_f32(self.cos.resolve(mem)?)?;
        if self.cos_inverted {
            cos = -cos;
        }
        Ok((sin, cos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;

    fn mem_with_angles(sin: f32, cos: f32) -> MockMemory {
        MockMemory::builder(0x40_0000)
            .f32_at(0x40_0200, sin)
            .f32_at(0x40_0204, cos)
            .build()
    }

    fn pointers(sin_inverted: bool, cos_inverted: bool) -> OrientationPointers {
        OrientationPointers {
            sin: PointerChain::new("", 0x200, vec![]),
            sin_inverted,
            cos: PointerChain::new("", 0x204, vec![]),
            cos_inverted,
        }
    }

    #[test]
    fn test_read_uninverted() {
        let mem = mem_with_angles(0.5, -0.25);
        assert_eq!(pointers(false, false).read(&mem).unwrap(), (0.5, -0.25));
    }

    #[test]
    fn test_sin_inversion_negates_raw_value() {
        let mem = mem_with_angles(1.0, 0.0);
        assert_eq!(pointers(true, false).read(&mem).unwrap(), (-1.0, 0.0));
    }

    #[test]
    fn test_cos_inversion_negates_raw_value() {
        let mem = mem_with_angles(0.0, 1.0);
        assert_eq!(pointers(false, true).read(&mem).unwrap(), (0.0, -1.0));
    }
}
