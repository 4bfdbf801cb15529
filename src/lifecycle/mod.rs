// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-08-03
//
// ─────────────────────────────────────────────────────────────
// m4ctrl · Lifecycle Controller
//
// Sequences one coprocessor core through its states: Held (reset
// asserted) and Running (reset released). Register writes go
// through the mapped reset-control window; power and clock
// transitions are delegated to the kernel control driver behind
// the [`CoreControl`] seam.
//
// Deploy is a composite transition with a strict order: platform
// reset → stop → power cycle → image transfer (+ TCM boot-word
// mirror) → core reset → start. The boot ROM reads the initial
// stack pointer and reset vector from TCM offset 0 whichever
// window the bulk image was placed in.
// ─────────────────────────────────────────────────────────────

use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use log::info;
use thiserror::Error;

use crate::ctrl::{CoreControl, CtrlError};
use crate::image::{self, ImageError};
use crate::mem::{MapError, MemDevice, MemoryArea};
use crate::platform::{self, CoreProfile, ProfileError, Region, Target};

/// Destination memory for the bulk firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Tightly-coupled memory (the default).
    #[default]
    Tcm,
    /// External DRAM window; boot words are mirrored into TCM.
    Ddr,
}

impl Placement {
    fn region(self) -> Region {
        match self {
            Placement::Tcm => Region::Tcm,
            Placement::Ddr => Region::Ddr,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Placement::Tcm => "tcm",
            Placement::Ddr => "ddr",
        })
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcm" => Ok(Placement::Tcm),
            "ddr" => Ok(Placement::Ddr),
            other => Err(format!("unknown memory placement '{other}' (expected tcm or ddr)")),
        }
    }
}

/// A validated request to deploy firmware to one core.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub core: usize,
    pub placement: Placement,
    pub firmware: PathBuf,
}

impl DeployRequest {
    /// Check the request before any hardware is touched: the core
    /// index must exist on `target` and the firmware file must be
    /// readable. The file is re-checked at open time during transfer.
    pub fn validate(&self, target: Target) -> Result<(), LifecycleError> {
        platform::profile(target, self.core)?;
        File::open(&self.firmware).map_err(|source| LifecycleError::FirmwareUnreadable {
            path: self.firmware.clone(),
            source,
        })?;
        Ok(())
    }
}

/// Errors from lifecycle transitions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Ctrl(#[from] CtrlError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("firmware image {} is not readable: {source}", .path.display())]
    FirmwareUnreadable { path: PathBuf, source: io::Error },
}

/// One core's mapped hardware state.
///
/// Owns the raw-memory device handle and the four region windows.
/// All mappings are established at construction, before any register
/// access; field order guarantees the windows unmap before the device
/// handle closes.
pub struct CoreContext {
    core: usize,
    profile: CoreProfile,
    areas: [MemoryArea; Region::COUNT],
    _dev: MemDevice,
}

impl CoreContext {
    /// Resolve the profile for `(target, core)` and map its regions.
    pub fn new(dev: MemDevice, target: Target, core: usize) -> Result<Self, LifecycleError> {
        let profile = platform::profile(target, core)?;
        Self::from_profile(dev, core, profile)
    }

    /// Map the regions of an explicit profile.
    pub fn from_profile(
        dev: MemDevice,
        core: usize,
        profile: CoreProfile,
    ) -> Result<Self, LifecycleError> {
        let mut map = |region: Region| -> Result<MemoryArea, MapError> {
            let spec = profile.region(region);
            MemoryArea::map(&dev, spec.base, spec.len)
        };
        let areas = [
            map(Region::ResetCtrl)?,
            map(Region::Ocram)?,
            map(Region::Tcm)?,
            map(Region::Ddr)?,
        ];
        Ok(CoreContext {
            core,
            profile,
            areas,
            _dev: dev,
        })
    }

    pub fn core(&self) -> usize {
        self.core
    }

    pub fn area(&self, region: Region) -> &MemoryArea {
        &self.areas[region.index()]
    }

    fn area_mut(&mut self, region: Region) -> &mut MemoryArea {
        &mut self.areas[region.index()]
    }

    /// Current value of the core's reset-control register.
    pub fn reset_register(&self) -> Result<u32, MapError> {
        self.area(Region::ResetCtrl).read_u32(self.profile.rcr_offset)
    }

    /// Whether the non-self-clearing reset bit currently holds the core.
    pub fn reset_held(&self) -> Result<bool, MapError> {
        Ok(self.reset_register()? & (1 << self.profile.non_sclr_bit) != 0)
    }

    fn update_rcr(&mut self, f: impl FnOnce(u32) -> u32) -> Result<u32, MapError> {
        let offset = self.profile.rcr_offset;
        self.areas[Region::ResetCtrl.index()].update_u32(offset, f)
    }

    fn mirror_ddr_into_tcm(&mut self) -> Result<(), ImageError> {
        // DDR is the last region; split so the DDR window can be read
        // while TCM is written.
        let (head, tail) = self.areas.split_at_mut(Region::Ddr.index());
        image::mirror_boot_words(&tail[0], &mut head[Region::Tcm.index()])
    }
}

/// State machine over one [`CoreContext`].
pub struct Controller<C> {
    ctx: CoreContext,
    ctrl: C,
}

impl<C: CoreControl> Controller<C> {
    pub fn new(ctx: CoreContext, ctrl: C) -> Self {
        Controller { ctx, ctrl }
    }

    pub fn context(&self) -> &CoreContext {
        &self.ctx
    }

    pub fn control(&self) -> &C {
        &self.ctrl
    }

    /// Release the core: ungate its clock domain, then clear the
    /// non-self-clearing reset bit. Idempotent if already running.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        let core = self.ctx.core;
        self.ctrl.start_core(core)?;
        let bit = self.ctx.profile.non_sclr_bit;
        self.ctx.update_rcr(|v| v & !(1 << bit))?;
        info!("started core {core}");
        Ok(())
    }

    /// Hold the core: set the non-self-clearing reset bit, then ask
    /// the driver to stop the core's clock domain.
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        let core = self.ctx.core;
        let bit = self.ctx.profile.non_sclr_bit;
        self.ctx.update_rcr(|v| v | (1 << bit))?;
        self.ctrl.stop_core(core)?;
        info!("stopped core {core}");
        Ok(())
    }

    /// Power the core's domain on. Delegated to the control driver.
    pub fn power_on(&mut self) -> Result<(), LifecycleError> {
        let core = self.ctx.core;
        self.ctrl.power_on(core)?;
        info!("powered on core {core}");
        Ok(())
    }

    /// Power the core's domain off. Delegated to the control driver.
    pub fn power_off(&mut self) -> Result<(), LifecycleError> {
        let core = self.ctx.core;
        self.ctrl.power_off(core)?;
        info!("powered off core {core}");
        Ok(())
    }

    /// Deploy firmware and leave the core running.
    ///
    /// The order is load-bearing: the platform reset forces a clean
    /// hardware state before anything else, the power cycle clears
    /// state a previous run may have left in the domain, and the core
    /// reset latches the new boot words before release.
    pub fn deploy(&mut self, request: &DeployRequest) -> Result<(), LifecycleError> {
        debug_assert_eq!(request.core, self.ctx.core);
        let core = self.ctx.core;
        info!(
            "deploying {} to core {core} ({} placement)",
            request.firmware.display(),
            request.placement
        );

        let platform_bit = self.ctx.profile.platform_reset_bit;
        self.ctx.update_rcr(|v| v | (1 << platform_bit))?;

        self.stop()?;
        self.ctrl.power_off(core)?;
        self.ctrl.power_on(core)?;

        let destination = request.placement.region();
        image::transfer(&request.firmware, self.ctx.area_mut(destination))?;
        if request.placement != Placement::Tcm {
            self.ctx.mirror_ddr_into_tcm()?;
        }

        let core_bit = self.ctx.profile.core_reset_bit;
        self.ctx.update_rcr(|v| v | (1 << core_bit))?;

        self.start()
    }
}
