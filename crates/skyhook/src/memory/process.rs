//! Platform process handles: open by PID, read/write memory, enumerate
//! module bases.

use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

use crate::error::{Error, Result};

/// Look up a running process by executable name (case-insensitive, a
/// trailing `.exe` on either side is ignored). Returns the first match.
pub fn find_process(name: &str) -> Option<u32> {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let wanted = normalize_name(name);
    sys.processes()
        .values()
        .find(|p| normalize_name(&p.name().to_string_lossy()) == wanted)
        .map(|p| p.pid().as_u32())
}

fn normalize_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    lower.strip_suffix(".exe").unwrap_or(&lower).to_string()
}

/// Find a process by name and open a memory handle to it.
pub fn open_process(name: &str) -> Result<ProcessHandle> {
    let pid = find_process(name).ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
    debug!("Found process '{}' (pid {})", name, pid);
    ProcessHandle::open(pid)
}

#[cfg(target_os = "windows")]
pub use windows_impl::ProcessHandle;

#[cfg(target_os = "linux")]
pub use linux_impl::ProcessHandle;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use unsupported_impl::ProcessHandle;

#[cfg(target_os = "windows")]
mod windows_impl {
    use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
    use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW,
        TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
        PROCESS_VM_READ, PROCESS_VM_WRITE,
    };

    use crate::error::{Error, Result};
    use crate::memory::MemoryAccess;

    pub struct ProcessHandle {
        handle: HANDLE,
        pid: u32,
    }

    // HANDLE is just an opaque kernel object reference.
    unsafe impl Send for ProcessHandle {}

    impl ProcessHandle {
        pub fn open(pid: u32) -> Result<Self> {
            let access = PROCESS_QUERY_INFORMATION
                | PROCESS_VM_READ
                | PROCESS_VM_WRITE
                | PROCESS_VM_OPERATION;
            // SAFETY: OpenProcess has no memory-safety preconditions.
            let handle = unsafe { OpenProcess(access, false, pid) }
                .map_err(|e| Error::ProcessOpenFailed(format!("pid {pid}: {e}")))?;
            Ok(Self { handle, pid })
        }

        pub fn pid(&self) -> u32 {
            self.pid
        }

        fn modules(&self) -> Result<Vec<(String, u64)>> {
            // SAFETY: snapshot handle is closed below; the entry struct is
            // plain data initialized with its required size field.
            unsafe {
                let snapshot =
                    CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid)
                        .map_err(|e| {
                            Error::ProcessOpenFailed(format!("module snapshot: {e}"))
                        })?;

                let mut entry = MODULEENTRY32W {
                    dwSize: size_of::<MODULEENTRY32W>() as u32,
                    ..Default::default()
                };

                let mut modules = Vec::new();
                if Module32FirstW(snapshot, &mut entry).is_ok() {
                    loop {
                        let len = entry
                            .szModule
                            .iter()
                            .position(|&c| c == 0)
                            .unwrap_or(entry.szModule.len());
                        let name = String::from_utf16_lossy(&entry.szModule[..len]);
                        modules.push((name, entry.modBaseAddr as u64));
                        if Module32NextW(snapshot, &mut entry).is_err() {
                            break;
                        }
                    }
                }
                let _ = CloseHandle(snapshot);
                Ok(modules)
            }
        }
    }

    impl MemoryAccess for ProcessHandle {
        fn read_bytes(&self, addr: u64, buf: &mut [u8]) -> Result<()> {
            let mut bytes_read = 0usize;
            // SAFETY: buf is a valid writable slice of the requested size.
            unsafe {
                ReadProcessMemory(
                    self.handle,
                    addr as *const _,
                    buf.as_mut_ptr() as *mut _,
                    buf.len(),
                    Some(&mut bytes_read),
                )
            }
            .map_err(|e| Error::MemoryReadFailed {
                address: addr,
                message: e.to_string(),
            })?;
            if bytes_read != buf.len() {
                return Err(Error::MemoryReadFailed {
                    address: addr,
                    message: format!("short read: {} of {} bytes", bytes_read, buf.len()),
                });
            }
            Ok(())
        }

        fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<()> {
            let mut bytes_written = 0usize;
            // SAFETY: data is a valid readable slice of the given size.
            unsafe {
                WriteProcessMemory(
                    self.handle,
                    addr as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                    Some(&mut bytes_written),
                )
            }
            .map_err(|e| Error::MemoryWriteFailed {
                address: addr,
                message: e.to_string(),
            })?;
            if bytes_written != data.len() {
                return Err(Error::MemoryWriteFailed {
                    address: addr,
                    message: format!("short write: {} of {} bytes", bytes_written, data.len()),
                });
            }
            Ok(())
        }

        fn module_base(&self, module: &str) -> Result<u64> {
            let modules = self.modules()?;
            if module.is_empty() {
                // The first snapshot entry is the main executable.
                return modules
                    .first()
                    .map(|&(_, base)| base)
                    .ok_or_else(|| Error::ModuleNotFound("<main module>".into()));
            }
            modules
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(module))
                .map(|&(_, base)| base)
                .ok_or_else(|| Error::ModuleNotFound(module.to_string()))
        }

        fn is_alive(&self) -> bool {
            let mut code = 0u32;
            // SAFETY: writes a u32 exit code through a valid pointer.
            match unsafe { GetExitCodeProcess(self.handle, &mut code) } {
                Ok(()) => code == STILL_ACTIVE.0 as u32,
                Err(_) => false,
            }
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            // SAFETY: handle was opened by us and is closed exactly once.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use std::fs::{File, OpenOptions};
    use std::os::unix::fs::FileExt;
    use std::path::Path;

    use tracing::debug;

    use crate::error::{Error, Result};
    use crate::memory::MemoryAccess;

    pub struct ProcessHandle {
        pid: u32,
        mem: File,
    }

    impl ProcessHandle {
        pub fn open(pid: u32) -> Result<Self> {
            let path = format!("/proc/{pid}/mem");
            // Writes need a read-write descriptor; fall back to read-only
            // when the target is not writable by us.
            let mem = match OpenOptions::new().read(true).write(true).open(&path) {
                Ok(f) => f,
                Err(first) => {
                    debug!("{} not writable ({}), reopening read-only", path, first);
                    File::open(&path)
                        .map_err(|e| Error::ProcessOpenFailed(format!("{path}: {e}")))?
                }
            };
            Ok(Self { pid, mem })
        }

        pub fn pid(&self) -> u32 {
            self.pid
        }

        fn exe_name(&self) -> Option<String> {
            let exe = std::fs::read_link(format!("/proc/{}/exe", self.pid)).ok()?;
            exe.file_name().map(|n| n.to_string_lossy().into_owned())
        }
    }

    impl MemoryAccess for ProcessHandle {
        fn read_bytes(&self, addr: u64, buf: &mut [u8]) -> Result<()> {
            self.mem
                .read_exact_at(buf, addr)
                .map_err(|e| Error::MemoryReadFailed {
                    address: addr,
                    message: e.to_string(),
                })
        }

        fn write_bytes(&self, addr: u64, data: &[u8]) -> Result<()> {
            self.mem
                .write_all_at(data, addr)
                .map_err(|e| Error::MemoryWriteFailed {
                    address: addr,
                    message: e.to_string(),
                })
        }

        fn module_base(&self, module: &str) -> Result<u64> {
            let maps = std::fs::read_to_string(format!("/proc/{}/maps", self.pid))
                .map_err(|_| Error::ProcessLost)?;

            let wanted = if module.is_empty() {
                self.exe_name()
                    .ok_or_else(|| Error::ModuleNotFound("<main module>".into()))?
            } else {
                module.to_string()
            };

            for line in maps.lines() {
                let Some(path) = line.split_whitespace().nth(5) else {
                    continue;
                };
                let file_name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                if file_name.eq_ignore_ascii_case(&wanted) {
                    let start = line.split('-').next().unwrap_or("");
                    return u64::from_str_radix(start, 16).map_err(|_| {
                        Error::ModuleNotFound(format!("{wanted}: bad maps line"))
                    });
                }
            }
            Err(Error::ModuleNotFound(wanted))
        }

        fn is_alive(&self) -> bool {
            Path::new(&format!("/proc/{}", self.pid)).exists()
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod unsupported_impl {
    use crate::error::{Error, Result};
    use crate::memory::MemoryAccess;

    pub struct ProcessHandle;

    impl ProcessHandle {
        pub fn open(_pid: u32) -> Result<Self> {
            Err(Error::ProcessOpenFailed(
                "process memory access is not supported on this platform".into(),
            ))
        }
    }

    impl MemoryAccess for ProcessHandle {
        fn read_bytes(&self, addr: u64, _buf: &mut [u8]) -> Result<()> {
            Err(Error::MemoryReadFailed {
                address: addr,
                message: "unsupported platform".into(),
            })
        }

        fn write_bytes(&self, addr: u64, _data: &[u8]) -> Result<()> {
            Err(Error::MemoryWriteFailed {
                address: addr,
                message: "unsupported platform".into(),
            })
        }

        fn module_base(&self, module: &str) -> Result<u64> {
            Err(Error::ModuleNotFound(module.to_string()))
        }

        fn is_alive(&self) -> bool {
            false
        }
    }
}
