// CLASSIFICATION: COMMUNITY
// Filename: test_lifecycle.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-03

//! Start/stop semantics and validation against a file-backed stand-in
//! for physical memory.

mod common;

use common::{firmware, sparse_mem, MockControl};
use m4ctrl::ctrl::CtrlOp;
use m4ctrl::lifecycle::{Controller, CoreContext, DeployRequest, Placement};
use m4ctrl::mem::MemDevice;
use m4ctrl::platform::Target;

#[test]
fn stop_asserts_and_start_releases_the_reset_bit() {
    let backing = sparse_mem(Target::Imx7d);
    let dev = MemDevice::open(backing.path()).unwrap();
    let ctx = CoreContext::new(dev, Target::Imx7d, 0).unwrap();
    let mut controller = Controller::new(ctx, MockControl::default());

    controller.stop().unwrap();
    assert!(controller.context().reset_held().unwrap());

    // Idempotent under repetition.
    controller.stop().unwrap();
    assert!(controller.context().reset_held().unwrap());

    controller.start().unwrap();
    assert!(!controller.context().reset_held().unwrap());
    controller.start().unwrap();
    assert!(!controller.context().reset_held().unwrap());

    assert_eq!(
        controller.control().calls(),
        vec![
            (CtrlOp::Stop, 0),
            (CtrlOp::Stop, 0),
            (CtrlOp::Start, 0),
            (CtrlOp::Start, 0),
        ]
    );
}

#[test]
fn imx8qm_cores_toggle_independent_bit_lanes() {
    let backing = sparse_mem(Target::Imx8qm);

    let dev = MemDevice::open(backing.path()).unwrap();
    let ctx = CoreContext::new(dev, Target::Imx8qm, 1).unwrap();
    let mut core1 = Controller::new(ctx, MockControl::default());
    core1.stop().unwrap();
    assert!(core1.context().reset_held().unwrap());
    // Core 1's lane starts at bit 4 of the shared register.
    assert_eq!(core1.context().reset_register().unwrap() & 0b1111, 0);
    drop(core1);

    let dev = MemDevice::open(backing.path()).unwrap();
    let ctx = CoreContext::new(dev, Target::Imx8qm, 0).unwrap();
    let core0 = Controller::new(ctx, MockControl::default());
    // Core 0 sees the shared register with only core 1's lane set.
    assert!(!core0.context().reset_held().unwrap());
}

#[test]
fn requests_outside_core_range_are_rejected_before_hardware() {
    let fw = firmware(&[0x1122_3344]);
    for bad_core in [1, 2, 7] {
        let request = DeployRequest {
            core: bad_core,
            placement: Placement::Tcm,
            firmware: fw.path().to_path_buf(),
        };
        assert!(request.validate(Target::Imx7d).is_err());
    }
    let request = DeployRequest {
        core: 1,
        placement: Placement::Tcm,
        firmware: fw.path().to_path_buf(),
    };
    assert!(request.validate(Target::Imx8qm).is_ok());
}

#[test]
fn end_to_end_stop_start_deploy() {
    let backing = sparse_mem(Target::Imx7d);
    let dev = MemDevice::open(backing.path()).unwrap();
    let ctx = CoreContext::new(dev, Target::Imx7d, 0).unwrap();
    let mut controller = Controller::new(ctx, MockControl::default());

    controller.stop().unwrap();
    assert!(controller.context().reset_held().unwrap(), "reset asserted");

    controller.start().unwrap();
    assert!(!controller.context().reset_held().unwrap(), "reset released");

    let fw = firmware(&[0xA100_0000, 0x0000_1101]);
    let request = DeployRequest {
        core: 0,
        placement: Placement::Tcm,
        firmware: fw.path().to_path_buf(),
    };
    request.validate(Target::Imx7d).unwrap();
    controller.deploy(&request).unwrap();

    let tcm = controller.context().area(m4ctrl::platform::Region::Tcm);
    assert_eq!(tcm.read_u32(0).unwrap(), 0xA100_0000);
    assert_eq!(tcm.read_u32(4).unwrap(), 0x0000_1101);
    assert!(!controller.context().reset_held().unwrap(), "core left running");
}
