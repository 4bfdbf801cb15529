// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-08-03

//! Command surface for the `m4ctl` binary.
//!
//! Parses and validates one lifecycle command per invocation. All
//! selection invariants (exactly one of start/stop/deploy, core
//! index in range, firmware readable) are enforced here, before any
//! device is opened.

use std::env;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::lifecycle::{DeployRequest, Placement};
use crate::platform::{self, Target};
use crate::Error;

const DEFAULT_CTRL_DEV: &str = "/dev/m4ctrl";
const DEFAULT_MEM_DEV: &str = "/dev/mem";

const CTRL_DEV_ENV: &str = "M4CTRL_DEV";
const MEM_DEV_ENV: &str = "M4CTRL_MEM_DEV";

fn parse_target(s: &str) -> Result<Target, String> {
    s.parse()
}

fn parse_placement(s: &str) -> Result<Placement, String> {
    s.parse()
}

/// Control tool for i.MX Cortex-M coprocessor cores.
#[derive(Parser, Debug)]
#[command(
    name = "m4ctl",
    about = "Start, stop and deploy firmware to an i.MX Cortex-M coprocessor core",
    version
)]
pub struct Cli {
    /// Coprocessor core index.
    #[arg(short, long, default_value_t = 0)]
    pub core: usize,

    /// Start the core (release reset).
    #[arg(short, long, conflicts_with_all = ["stop", "deploy"])]
    pub start: bool,

    /// Stop the core (hold it in reset).
    #[arg(short = 'x', long, conflicts_with = "deploy")]
    pub stop: bool,

    /// Deploy FIRMWARE to the core, then start it.
    #[arg(short, long, value_name = "FIRMWARE")]
    pub deploy: Option<PathBuf>,

    /// Destination memory for the firmware image.
    #[arg(short, long, value_parser = parse_placement, default_value = "tcm")]
    pub memory: Placement,

    /// Target chip variant.
    #[arg(short, long, value_parser = parse_target, default_value = "imx7d")]
    pub target: Target,

    /// Control device path (overrides $M4CTRL_DEV).
    #[arg(long, value_name = "PATH")]
    pub ctrl_dev: Option<PathBuf>,

    /// Raw-memory device path (overrides $M4CTRL_MEM_DEV).
    #[arg(long, value_name = "PATH")]
    pub mem_dev: Option<PathBuf>,
}

/// Command selection errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("exactly one of --start, --stop or --deploy is required")]
    CommandRequired,

    #[error("--start, --stop and --deploy are mutually exclusive")]
    CommandConflict,
}

/// The single lifecycle command of one invocation.
#[derive(Debug, Clone)]
pub enum Command {
    Start,
    Stop,
    Deploy(DeployRequest),
}

/// Resolved device paths. Flag beats environment beats default.
#[derive(Debug, Clone)]
pub struct Config {
    pub ctrl_dev: PathBuf,
    pub mem_dev: PathBuf,
}

impl Config {
    fn resolve(ctrl_flag: Option<PathBuf>, mem_flag: Option<PathBuf>) -> Self {
        Config {
            ctrl_dev: resolve_path(ctrl_flag, CTRL_DEV_ENV, DEFAULT_CTRL_DEV),
            mem_dev: resolve_path(mem_flag, MEM_DEV_ENV, DEFAULT_MEM_DEV),
        }
    }
}

fn resolve_path(flag: Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    flag.or_else(|| env::var_os(env_var).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// A fully validated invocation, ready to execute.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub target: Target,
    pub core: usize,
    pub command: Command,
    pub config: Config,
}

impl Cli {
    /// Validate the argument set into an [`Invocation`].
    ///
    /// Runs before any device is opened; a failure here has performed
    /// no side effects.
    pub fn into_invocation(self) -> Result<Invocation, Error> {
        let selected =
            usize::from(self.start) + usize::from(self.stop) + usize::from(self.deploy.is_some());
        match selected {
            0 => return Err(CliError::CommandRequired.into()),
            1 => {}
            _ => return Err(CliError::CommandConflict.into()),
        }

        let command = if let Some(firmware) = self.deploy {
            let request = DeployRequest {
                core: self.core,
                placement: self.memory,
                firmware,
            };
            request.validate(self.target)?;
            Command::Deploy(request)
        } else {
            platform::profile(self.target, self.core)?;
            if self.start {
                Command::Start
            } else {
                Command::Stop
            }
        };

        Ok(Invocation {
            target: self.target,
            core: self.core,
            command,
            config: Config::resolve(self.ctrl_dev, self.mem_dev),
        })
    }
}
