// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-03

//! Shared fixtures: a sparse file standing in for physical memory and
//! a recording, fault-injecting control driver.

#![allow(dead_code)]

use std::io::{self, Write};

use m4ctrl::ctrl::{CoreControl, CtrlError, CtrlOp};
use m4ctrl::platform::{self, Region, Target};
use tempfile::NamedTempFile;

/// Create a sparse file large enough to back every region of every
/// core of `target`. Only pages actually written consume space.
pub fn sparse_mem(target: Target) -> NamedTempFile {
    let mut end = 0u64;
    for core in 0..target.core_count() {
        let profile = platform::profile(target, core).unwrap();
        for region in Region::ALL {
            let spec = profile.region(region);
            end = end.max(spec.base + spec.len as u64);
        }
    }
    let file = NamedTempFile::new().unwrap();
    file.as_file().set_len(end).unwrap();
    file
}

/// Write `words` as a firmware image file.
pub fn firmware(words: &[u32]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for word in words {
        file.write_all(&word.to_ne_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Records every driver operation in call order and optionally fails
/// one of them.
#[derive(Default)]
pub struct MockControl {
    pub ops: Vec<(CtrlOp, usize)>,
    pub fail_on: Option<CtrlOp>,
}

impl MockControl {
    pub fn failing_on(op: CtrlOp) -> Self {
        MockControl {
            ops: Vec::new(),
            fail_on: Some(op),
        }
    }

    pub fn calls(&self) -> Vec<(CtrlOp, usize)> {
        self.ops.clone()
    }

    fn record(&mut self, op: CtrlOp, core: usize) -> Result<(), CtrlError> {
        self.ops.push((op, core));
        if self.fail_on == Some(op) {
            return Err(CtrlError::Ioctl {
                op,
                core,
                source: io::Error::from_raw_os_error(5),
            });
        }
        Ok(())
    }
}

impl CoreControl for MockControl {
    fn start_core(&mut self, core: usize) -> Result<(), CtrlError> {
        self.record(CtrlOp::Start, core)
    }

    fn stop_core(&mut self, core: usize) -> Result<(), CtrlError> {
        self.record(CtrlOp::Stop, core)
    }

    fn power_on(&mut self, core: usize) -> Result<(), CtrlError> {
        self.record(CtrlOp::PowerOn, core)
    }

    fn power_off(&mut self, core: usize) -> Result<(), CtrlError> {
        self.record(CtrlOp::PowerOff, core)
    }
}

/// Number of live mappings of `path` in this process.
pub fn mapped_count(path: &std::path::Path) -> usize {
    let maps = std::fs::read_to_string("/proc/self/maps").unwrap();
    let needle = path.to_str().unwrap();
    maps.lines().filter(|line| line.contains(needle)).count()
}
