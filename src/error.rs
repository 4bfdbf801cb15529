// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-08-03

//! Crate-level error type and the failure taxonomy.
//!
//! Configuration problems are detected before any hardware access.
//! Resource problems mean a device, mapping or file could not be
//! acquired. Hardware problems are failed driver control operations,
//! fatal to the invoking command and never retried.

use std::fmt;

use thiserror::Error;

use crate::cli::CliError;
use crate::ctrl::CtrlError;
use crate::image::ImageError;
use crate::lifecycle::LifecycleError;
use crate::mem::MapError;
use crate::platform::ProfileError;

/// Any failure this crate can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Ctrl(#[from] CtrlError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// The three failure classes of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid input, rejected before any hardware access.
    Configuration,
    /// A device, mapping or file could not be acquired.
    Resource,
    /// A driver control operation failed; unrecoverable at this layer.
    Hardware,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorClass::Configuration => "configuration",
            ErrorClass::Resource => "resource",
            ErrorClass::Hardware => "hardware",
        })
    }
}

impl Error {
    /// Classify this failure for reporting.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Cli(_) | Error::Profile(_) => ErrorClass::Configuration,
            Error::Map(_) | Error::Image(_) => ErrorClass::Resource,
            Error::Ctrl(e) => class_of_ctrl(e),
            Error::Lifecycle(e) => class_of_lifecycle(e),
        }
    }
}

fn class_of_ctrl(err: &CtrlError) -> ErrorClass {
    match err {
        CtrlError::DeviceOpen { .. } => ErrorClass::Resource,
        CtrlError::Ioctl { .. } => ErrorClass::Hardware,
    }
}

fn class_of_lifecycle(err: &LifecycleError) -> ErrorClass {
    match err {
        LifecycleError::Profile(_) => ErrorClass::Configuration,
        LifecycleError::Map(_)
        | LifecycleError::Image(_)
        | LifecycleError::FirmwareUnreadable { .. } => ErrorClass::Resource,
        LifecycleError::Ctrl(e) => class_of_ctrl(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn classifies_the_taxonomy() {
        let err: Error = ProfileError::CoreOutOfRange {
            target: crate::platform::Target::Imx7d,
            core: 9,
            count: 1,
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Configuration);

        let err: Error = MapError::Misaligned { base: 1, len: 0 }.into();
        assert_eq!(err.class(), ErrorClass::Resource);

        let err: Error = CtrlError::Ioctl {
            op: crate::ctrl::CtrlOp::PowerOn,
            core: 0,
            source: io::Error::from_raw_os_error(5),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Hardware);

        let err: Error = LifecycleError::Ctrl(CtrlError::DeviceOpen {
            path: "/dev/m4ctrl".into(),
            source: io::Error::from_raw_os_error(13),
        })
        .into();
        assert_eq!(err.class(), ErrorClass::Resource);
    }
}
