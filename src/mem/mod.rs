// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-08-02
//
// ─────────────────────────────────────────────────────────────
// m4ctrl · Physical Memory Window Mapper
//
// Opens the system's raw-memory device once per run and
// establishes process-visible windows onto the physical ranges a
// core's control logic needs. Accesses go through bounds-checked
// volatile word accessors so register side effects happen in
// program order; windows unmap exactly once, on drop, on every
// exit path.
//
// # Public API
// * [`MemDevice`] – shared handle to the raw-memory device
// * [`MemoryArea`] – one mapped window with volatile accessors
// ─────────────────────────────────────────────────────────────

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use log::{debug, warn};
use thiserror::Error;

/// Mapping granularity of the raw-memory device.
pub const PAGE_SIZE: usize = 4096;

/// Errors from opening the raw-memory device or mapping windows.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to open raw-memory device {}: {source}", .path.display())]
    DeviceOpen { path: PathBuf, source: io::Error },

    #[error("region {len:#x} bytes at {base:#x} is empty or not page-aligned")]
    Misaligned { base: u64, len: usize },

    #[error("mmap of {len:#x} bytes at {base:#x} failed: {source}")]
    Map { base: u64, len: usize, source: io::Error },

    #[error("access of {width} bytes at offset {offset:#x} outside {len:#x}-byte window")]
    OutOfBounds { offset: usize, width: usize, len: usize },
}

/// Process-wide handle to the raw-memory device.
///
/// Opened once per run and shared by every [`MemoryArea`] mapped from
/// it; the descriptor closes when the owning context drops, after all
/// windows are gone.
#[derive(Debug)]
pub struct MemDevice {
    file: File,
    path: PathBuf,
}

impl MemDevice {
    /// Open `path` for read/write with synchronous access.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|source| MapError::DeviceOpen { path: path.clone(), source })?;
        debug!("opened raw-memory device {}", path.display());
        Ok(MemDevice { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One mapped window onto a physical address range.
///
/// Owned exclusively by a core context for the lifetime of the
/// mapping; reads and writes are volatile and rejected outside the
/// window. Unmapping happens exactly once, in `Drop`.
pub struct MemoryArea {
    base: u64,
    ptr: NonNull<u8>,
    len: usize,
}

impl MemoryArea {
    /// Map `len` bytes of physical memory starting at `base`.
    ///
    /// The base must be page-aligned and the length nonzero; both are
    /// rejected before the kernel is asked for a mapping.
    pub fn map(dev: &MemDevice, base: u64, len: usize) -> Result<Self, MapError> {
        if len == 0 || base % PAGE_SIZE as u64 != 0 {
            return Err(MapError::Misaligned { base, len });
        }
        // SAFETY: fd is a valid open descriptor; length and offset were
        // validated above. The kernel picks the virtual address.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                dev.file.as_raw_fd(),
                base as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(MapError::Map {
                base,
                len,
                source: io::Error::last_os_error(),
            });
        }
        debug!("mapped {len:#x} bytes at physical {base:#x}");
        let ptr = NonNull::new(ptr.cast::<u8>()).ok_or_else(|| MapError::Map {
            base,
            len,
            source: io::Error::other("mmap returned null"),
        })?;
        Ok(MemoryArea { base, ptr, len })
    }

    /// Physical base address of the window.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Window length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn word_ptr(&self, offset: usize) -> Result<*mut u32, MapError> {
        let width = std::mem::size_of::<u32>();
        if offset % width != 0 || offset + width > self.len {
            return Err(MapError::OutOfBounds { offset, width, len: self.len });
        }
        // SAFETY: offset is aligned and in bounds for the mapping.
        Ok(unsafe { self.ptr.as_ptr().add(offset).cast::<u32>() })
    }

    /// Volatile read of the naturally-aligned word at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32, MapError> {
        let p = self.word_ptr(offset)?;
        // SAFETY: word_ptr guarantees alignment and bounds.
        Ok(unsafe { p.read_volatile() })
    }

    /// Volatile write of the naturally-aligned word at `offset`.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), MapError> {
        let p = self.word_ptr(offset)?;
        // SAFETY: word_ptr guarantees alignment and bounds.
        unsafe { p.write_volatile(value) };
        Ok(())
    }

    /// Read-modify-write of the word at `offset`; returns the value
    /// written.
    pub fn update_u32(
        &mut self,
        offset: usize,
        f: impl FnOnce(u32) -> u32,
    ) -> Result<u32, MapError> {
        let value = f(self.read_u32(offset)?);
        self.write_u32(offset, value)?;
        Ok(value)
    }
}

impl Drop for MemoryArea {
    fn drop(&mut self) {
        // SAFETY: ptr/len came from a successful mmap and are unmapped
        // exactly once.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc != 0 {
            warn!(
                "munmap of {:#x} bytes at physical {:#x} failed: {}",
                self.len,
                self.base,
                io::Error::last_os_error()
            );
        }
    }
}
