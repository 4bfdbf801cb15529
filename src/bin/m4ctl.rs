// CLASSIFICATION: COMMUNITY
// Filename: m4ctl.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-03

//! `m4ctl`: start, stop and deploy firmware to an i.MX Cortex-M
//! coprocessor core.

use clap::Parser;
use log::error;

use m4ctrl::cli::{Cli, Command, Invocation};
use m4ctrl::ctrl::CtrlDevice;
use m4ctrl::lifecycle::{Controller, CoreContext};
use m4ctrl::mem::MemDevice;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let invocation = cli.into_invocation().map_err(report)?;
    run(invocation).map_err(report)?;
    Ok(())
}

fn run(invocation: Invocation) -> Result<(), m4ctrl::Error> {
    let ctrl = CtrlDevice::open(&invocation.config.ctrl_dev)?;
    let dev = MemDevice::open(&invocation.config.mem_dev)?;
    let ctx = CoreContext::new(dev, invocation.target, invocation.core)?;
    let mut controller = Controller::new(ctx, ctrl);

    match invocation.command {
        Command::Start => controller.start()?,
        Command::Stop => controller.stop()?,
        Command::Deploy(request) => controller.deploy(&request)?,
    }
    Ok(())
}

fn report(err: m4ctrl::Error) -> anyhow::Error {
    error!("{} failure: {err}", err.class());
    anyhow::Error::new(err)
}
