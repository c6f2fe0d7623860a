//! Remote process memory access.
//!
//! The [`MemoryAccess`] trait is the single boundary through which pointer
//! chains are resolved and scalars are read or written. Platform
//! implementations live in [`process`]; tests use the in-memory mock.

mod process;

#[cfg(test)]
pub mod mock;

pub use process::{ProcessHandle, find_process, open_process};

#[cfg(test)]
pub use mock::{MockMemory, MockMemoryBuilder};

use crate::error::Result;

/// Typed access to another process's address space.
///
/// Implementors provide raw buffer reads/writes plus module base lookup;
/// the typed helpers decode little-endian scalars on top of that. Nothing
/// here caches: callers re-resolve addresses from the module base on every
/// use because the target can relocate modules across restarts.
pub trait MemoryAccess {
    /// Fill `buf` from `addr`. A short or faulting read is an error.
    fn read_bytes(&self, addr: u64, buf: &mut [u8]) -> Result<()>;

    /// Write `data` at `addr`.
    fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<()>;

    /// Base address of a loaded module. The empty string selects the main
    /// module of the target.
    fn module_base(&self, module: &str) -> Result<u64>;

    /// Whether the target process is still running.
    fn is_alive(&self) -> bool;

    /// Read a pointer-sized value (the target is assumed 64-bit).
    fn read_u64(&self, addr: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_bytes(addr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f32(&self, addr: u64) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn write_f32(&self, addr: u64, value: f32) -> Result<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }
}
