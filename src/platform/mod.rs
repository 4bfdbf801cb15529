// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-07-19
//
// ─────────────────────────────────────────────────────────────
// m4ctrl · Platform Register Profile
//
// Per-chip-variant tables describing, for every coprocessor
// core, the physical memory regions the controller must map and
// the bit positions inside the reset-control register. This is
// the only module that knows variant-specific addresses; every
// other component is coded against [`CoreProfile`].
//
// # Public API
// * [`Target`] – supported chip variants
// * [`Region`] – the fixed set of per-core memory regions
// * [`profile`] – resolve `(target, core)` → [`CoreProfile`]
// ─────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Chip variants this tool knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// i.MX7D: one Cortex-M4, dedicated M4RCR in the SRC block.
    Imx7d,
    /// i.MX8M Mini: one Cortex-M core, same SRC layout, larger TCM.
    Imx8mm,
    /// i.MX8QM: two Cortex-M4 cores sharing one reset-control
    /// register, one bit lane per core.
    Imx8qm,
}

impl Target {
    /// Number of coprocessor cores on this variant.
    pub fn core_count(self) -> usize {
        self.cores().len()
    }

    fn cores(self) -> &'static [CoreProfile] {
        match self {
            Target::Imx7d => &IMX7D_CORES,
            Target::Imx8mm => &IMX8MM_CORES,
            Target::Imx8qm => &IMX8QM_CORES,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Imx7d => "imx7d",
            Target::Imx8mm => "imx8mm",
            Target::Imx8qm => "imx8qm",
        };
        f.write_str(name)
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imx7d" => Ok(Target::Imx7d),
            "imx8mm" => Ok(Target::Imx8mm),
            "imx8qm" => Ok(Target::Imx8qm),
            other => Err(format!(
                "unknown target '{other}' (expected imx7d, imx8mm or imx8qm)"
            )),
        }
    }
}

/// The fixed set of hardware regions a core's control logic needs.
///
/// Discriminant order is the mapping order inside a core context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Reset-control register block (SRC on i.MX parts).
    ResetCtrl = 0,
    /// On-chip RAM.
    Ocram = 1,
    /// Tightly-coupled memory holding the boot-time SP/PC words.
    Tcm = 2,
    /// External DRAM window for bulk firmware placement.
    Ddr = 3,
}

impl Region {
    /// Number of regions per core.
    pub const COUNT: usize = 4;

    /// All regions in mapping order.
    pub const ALL: [Region; Region::COUNT] =
        [Region::ResetCtrl, Region::Ocram, Region::Tcm, Region::Ddr];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One physical address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    /// Physical base address. Must be page-aligned.
    pub base: u64,
    /// Window length in bytes.
    pub len: usize,
}

/// Everything variant-specific about one coprocessor core.
#[derive(Debug, Clone, Copy)]
pub struct CoreProfile {
    /// Address/size of each [`Region`], indexed by `Region::index()`.
    pub regions: [RegionSpec; Region::COUNT],
    /// Byte offset of the core's reset-control register inside the
    /// [`Region::ResetCtrl`] window.
    pub rcr_offset: usize,
    /// Platform-level reset bit (forces a clean hardware state).
    pub platform_reset_bit: u32,
    /// Core logical reset bit (latches new boot state).
    pub core_reset_bit: u32,
    /// Non-self-clearing reset bit; while set the core is held.
    pub non_sclr_bit: u32,
}

impl CoreProfile {
    pub fn region(&self, region: Region) -> RegionSpec {
        self.regions[region.index()]
    }
}

const IMX7D_CORES: [CoreProfile; 1] = [CoreProfile {
    regions: [
        RegionSpec { base: 0x3039_0000, len: 0x1000 },    // SRC
        RegionSpec { base: 0x0090_0000, len: 0x2_0000 },  // OCRAM
        RegionSpec { base: 0x007F_8000, len: 0x8000 },    // TCML
        RegionSpec { base: 0x8000_0000, len: 0x10_0000 }, // DDR window
    ],
    rcr_offset: 0x0C,
    platform_reset_bit: 2,
    core_reset_bit: 1,
    non_sclr_bit: 0,
}];

const IMX8MM_CORES: [CoreProfile; 1] = [CoreProfile {
    regions: [
        RegionSpec { base: 0x3039_0000, len: 0x1000 },    // SRC
        RegionSpec { base: 0x0090_0000, len: 0x4_0000 },  // OCRAM
        RegionSpec { base: 0x007E_0000, len: 0x2_0000 },  // TCML
        RegionSpec { base: 0x8000_0000, len: 0x10_0000 }, // DDR window
    ],
    rcr_offset: 0x0C,
    platform_reset_bit: 2,
    core_reset_bit: 1,
    non_sclr_bit: 0,
}];

// Both 8QM cores share one reset-control register; core n owns the
// four-bit lane starting at bit 4n.
const IMX8QM_CORES: [CoreProfile; 2] = [
    CoreProfile {
        regions: [
            RegionSpec { base: 0x3039_0000, len: 0x1000 },
            RegionSpec { base: 0x0010_0000, len: 0x4_0000 },
            RegionSpec { base: 0x34FE_0000, len: 0x2_0000 },
            RegionSpec { base: 0x8800_0000, len: 0x10_0000 },
        ],
        rcr_offset: 0x0C,
        platform_reset_bit: 2,
        core_reset_bit: 1,
        non_sclr_bit: 0,
    },
    CoreProfile {
        regions: [
            RegionSpec { base: 0x3039_0000, len: 0x1000 },
            RegionSpec { base: 0x0010_0000, len: 0x4_0000 },
            RegionSpec { base: 0x38FE_0000, len: 0x2_0000 },
            RegionSpec { base: 0x8900_0000, len: 0x10_0000 },
        ],
        rcr_offset: 0x0C,
        platform_reset_bit: 6,
        core_reset_bit: 5,
        non_sclr_bit: 4,
    },
];

/// Errors produced by profile lookup.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("core index {core} out of range for {target}: this target has {count} core(s)")]
    CoreOutOfRange {
        target: Target,
        core: usize,
        count: usize,
    },
}

/// Resolve the profile for one core of one chip variant.
///
/// Pure lookup; the only failure is a core index the variant does not
/// have, which callers surface during validation, never mid-sequence.
pub fn profile(target: Target, core: usize) -> Result<CoreProfile, ProfileError> {
    let cores = target.cores();
    cores
        .get(core)
        .copied()
        .ok_or(ProfileError::CoreOutOfRange {
            target,
            core,
            count: cores.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_core_variants() {
        let p = profile(Target::Imx7d, 0).unwrap();
        assert_eq!(p.region(Region::ResetCtrl).base, 0x3039_0000);
        assert_eq!(p.region(Region::Tcm).len, 0x8000);
        assert_eq!(p.non_sclr_bit, 0);

        let p = profile(Target::Imx8mm, 0).unwrap();
        assert_eq!(p.region(Region::Tcm).base, 0x007E_0000);
    }

    #[test]
    fn rejects_out_of_range_core() {
        assert!(matches!(
            profile(Target::Imx7d, 1),
            Err(ProfileError::CoreOutOfRange { core: 1, count: 1, .. })
        ));
        assert!(profile(Target::Imx8qm, 2).is_err());
    }

    #[test]
    fn imx8qm_cores_use_separate_bit_lanes() {
        let c0 = profile(Target::Imx8qm, 0).unwrap();
        let c1 = profile(Target::Imx8qm, 1).unwrap();
        assert_eq!(c1.non_sclr_bit, c0.non_sclr_bit + 4);
        assert_eq!(c1.core_reset_bit, c0.core_reset_bit + 4);
        assert_eq!(c1.platform_reset_bit, c0.platform_reset_bit + 4);
        assert_ne!(c0.region(Region::Tcm).base, c1.region(Region::Tcm).base);
    }

    #[test]
    fn parses_target_names() {
        assert_eq!("imx8mm".parse::<Target>().unwrap(), Target::Imx8mm);
        assert!("imx9".parse::<Target>().is_err());
        assert_eq!(Target::Imx8qm.to_string(), "imx8qm");
    }

    #[test]
    fn regions_are_page_aligned() {
        for target in [Target::Imx7d, Target::Imx8mm, Target::Imx8qm] {
            for core in 0..target.core_count() {
                let p = profile(target, core).unwrap();
                for region in Region::ALL {
                    let spec = p.region(region);
                    assert_eq!(spec.base % 4096, 0, "{target} core {core} {region:?}");
                    assert!(spec.len > 0);
                }
            }
        }
    }
}
