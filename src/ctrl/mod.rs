// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-07-30

//! Client side of the kernel-resident coprocessor control driver.
//!
//! The driver exposes four opaque operations per core (start, stop,
//! power-on, power-off) as ioctls on a named control device. The
//! [`CoreControl`] trait is the seam the lifecycle controller sequences
//! against; [`CtrlDevice`] is the real ioctl-backed implementation.

use std::fmt;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

/// The four driver operations, addressed by core index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlOp {
    Start = 0,
    Stop = 1,
    PowerOn = 2,
    PowerOff = 3,
}

impl fmt::Display for CtrlOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CtrlOp::Start => "start-core",
            CtrlOp::Stop => "stop-core",
            CtrlOp::PowerOn => "power-on-core",
            CtrlOp::PowerOff => "power-off-core",
        };
        f.write_str(name)
    }
}

/// Errors from the control device.
#[derive(Debug, Error)]
pub enum CtrlError {
    #[error("failed to open control device {}: {source}", .path.display())]
    DeviceOpen { path: PathBuf, source: io::Error },

    #[error("{op} for core {core} failed: {source}")]
    Ioctl {
        op: CtrlOp,
        core: usize,
        source: io::Error,
    },
}

/// Power/clock operations on one coprocessor core.
///
/// Every operation either succeeds or is fatal to the invoking
/// command; implementations never retry.
pub trait CoreControl {
    fn start_core(&mut self, core: usize) -> Result<(), CtrlError>;
    fn stop_core(&mut self, core: usize) -> Result<(), CtrlError>;
    fn power_on(&mut self, core: usize) -> Result<(), CtrlError>;
    fn power_off(&mut self, core: usize) -> Result<(), CtrlError>;
}

const IOC_MAGIC: u64 = b'm' as u64;
const OPS_PER_CORE: u64 = 4;

/// `_IO(IOC_MAGIC, nr)` with the core index folded into the request
/// number, matching the driver's per-core command layout.
fn request(op: CtrlOp, core: usize) -> libc::c_ulong {
    let nr = core as u64 * OPS_PER_CORE + op as u64;
    ((IOC_MAGIC << 8) | nr) as libc::c_ulong
}

/// Ioctl-backed implementation over the named control device.
#[derive(Debug)]
pub struct CtrlDevice {
    file: File,
}

impl CtrlDevice {
    /// Open the control device read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CtrlError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CtrlError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened control device {}", path.display());
        Ok(CtrlDevice { file })
    }

    fn ioctl(&self, op: CtrlOp, core: usize) -> Result<(), CtrlError> {
        // SAFETY: the fd is a valid open descriptor and the request
        // takes no argument.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request(op, core), 0) };
        if rc < 0 {
            return Err(CtrlError::Ioctl {
                op,
                core,
                source: io::Error::last_os_error(),
            });
        }
        debug!("{op} for core {core} succeeded");
        Ok(())
    }
}

impl CoreControl for CtrlDevice {
    fn start_core(&mut self, core: usize) -> Result<(), CtrlError> {
        self.ioctl(CtrlOp::Start, core)
    }

    fn stop_core(&mut self, core: usize) -> Result<(), CtrlError> {
        self.ioctl(CtrlOp::Stop, core)
    }

    fn power_on(&mut self, core: usize) -> Result<(), CtrlError> {
        self.ioctl(CtrlOp::PowerOn, core)
    }

    fn power_off(&mut self, core: usize) -> Result<(), CtrlError> {
        self.ioctl(CtrlOp::PowerOff, core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_numbers_are_per_core() {
        assert_eq!(request(CtrlOp::Start, 0), (b'm' as libc::c_ulong) << 8);
        assert_eq!(
            request(CtrlOp::PowerOff, 0) + 1,
            request(CtrlOp::Start, 1)
        );
        assert_ne!(request(CtrlOp::Stop, 0), request(CtrlOp::Stop, 1));
    }

    #[test]
    fn open_missing_device_fails() {
        let err = CtrlDevice::open("/nonexistent/m4ctrl").unwrap_err();
        assert!(matches!(err, CtrlError::DeviceOpen { .. }));
    }
}
