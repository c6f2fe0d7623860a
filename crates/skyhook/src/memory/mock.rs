//! In-memory fake of a target process for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::memory::MemoryAccess;

/// A scripted address space. Cloning shares the underlying state so a test
/// can keep a handle while the code under test owns another.
#[derive(Clone)]
pub struct MockMemory {
    inner: Arc<Inner>,
}

struct Inner {
    bytes: Mutex<HashMap<u64, u8>>,
    protected: Mutex<Vec<(u64, u64)>>,
    modules: HashMap<String, u64>,
    main_module: u64,
    alive: AtomicBool,
}

pub struct MockMemoryBuilder {
    bytes: HashMap<u64, u8>,
    modules: HashMap<String, u64>,
    main_module: u64,
}

impl MockMemoryBuilder {
    pub fn new(main_module: u64) -> Self {
        Self {
            bytes: HashMap::new(),
            modules: HashMap::new(),
            main_module,
        }
    }

    pub fn module(mut self, name: &str, base: u64) -> Self {
        self.modules.insert(name.to_ascii_lowercase(), base);
        self
    }

    pub fn u64_at(mut self, addr: u64, value: u64) -> Self {
        for (i, b) in value.to_le_bytes().iter().enumerate() {
            self.bytes.insert(addr + i as u64, *b);
        }
        self
    }

    pub fn f32_at(mut self, addr: u64, value: f32) -> Self {
        for (i, b) in value.to_le_bytes().iter().enumerate() {
            self.bytes.insert(addr + i as u64, *b);
        }
        self
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            inner: Arc::new(Inner {
                bytes: Mutex::new(self.bytes),
                protected: Mutex::new(Vec::new()),
                modules: self.modules,
                main_module: self.main_module,
                alive: AtomicBool::new(true),
            }),
        }
    }
}

impl MockMemory {
    pub fn builder(main_module: u64) -> MockMemoryBuilder {
        MockMemoryBuilder::new(main_module)
    }

    /// Simulate process termination: reads and writes start failing.
    pub fn kill(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
    }

    /// Mark a byte range read-only; writes touching it start failing.
    pub fn protect(&self, addr: u64, len: usize) {
        self.inner.protected.lock().unwrap().push((addr, len as u64));
    }

    fn is_protected(&self, addr: u64, len: usize) -> bool {
        let end = addr + len as u64;
        self.inner
            .protected
            .lock()
            .unwrap()
            .iter()
            .any(|&(start, plen)| addr < start + plen && start < end)
    }

    /// Remove a byte range, as if the pages were unmapped.
    pub fn unmap(&self, addr: u64, len: usize) {
        let mut bytes = self.inner.bytes.lock().unwrap();
        for i in 0..len as u64 {
            bytes.remove(&(addr + i));
        }
    }

    /// Overwrite a pointer-sized cell mid-test.
    pub fn set_u64(&self, addr: u64, value: u64) {
        let mut bytes = self.inner.bytes.lock().unwrap();
        for (i, b) in value.to_le_bytes().iter().enumerate() {
            bytes.insert(addr + i as u64, *b);
        }
    }

    pub fn f32_value(&self, addr: u64) -> Option<f32> {
        let bytes = self.inner.bytes.lock().unwrap();
        let mut buf = [0u8; 4];
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = *bytes.get(&(addr + i as u64))?;
        }
        Some(f32::from_le_bytes(buf))
    }
}

impl MemoryAccess for MockMemory {
    fn read_bytes(&self, addr: u64, buf: &mut [u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::MemoryReadFailed {
                address: addr,
                message: "process exited".into(),
            });
        }
        let bytes = self.inner.bytes.lock().unwrap();
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = *bytes
                .get(&(addr + i as u64))
                .ok_or(Error::MemoryReadFailed {
                    address: addr,
                    message: "unmapped".into(),
                })?;
        }
        Ok(())
    }

    fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::MemoryWriteFailed {
                address: addr,
                message: "process exited".into(),
            });
        }
        if self.is_protected(addr, data.len()) {
            return Err(Error::MemoryWriteFailed {
                address: addr,
                message: "write protected".into(),
            });
        }
        let mut bytes = self.inner.bytes.lock().unwrap();
        for (i, b) in data.iter().enumerate() {
            bytes.insert(addr + i as u64, *b);
        }
        Ok(())
    }

    fn module_base(&self, module: &str) -> Result<u64> {
        if module.is_empty() {
            return Ok(self.inner.main_module);
        }
        self.inner
            .modules
            .get(&module.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| Error::ModuleNotFound(module.to_string()))
    }

    fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }
}
