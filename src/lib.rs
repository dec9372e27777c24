#![doc = include_str!("../README.md")]
/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate log;

pub mod constants;
pub mod constellation;
pub mod ephemeris;
pub mod errors;
pub mod frames;
pub mod ident;
pub mod math;
pub mod mount;
pub mod objects;
pub mod orbit;
pub mod time;

pub mod prelude {
    pub use crate::constants::*;
    pub use crate::constellation::Constellation;
    pub use crate::ephemeris::Ephemeris;
    pub use crate::errors::{EphemerisError, MountError};
    pub use crate::frames::Coordinates;
    pub use crate::ident::{Catalog, Identifier};
    pub use crate::math::angle::Angle;
    pub use crate::math::spherical::Spherical;
    pub use crate::math::{Matrix3, Vector3};
    pub use crate::mount::{Mount, MountProtocol, MountType};
    pub use crate::objects::CelestialObject;
    pub use crate::orbit::Orbit;
    pub use crate::time::{CalendarSystem, Time};
    pub use hifitime::Epoch;
    pub use std::fs::File;
}

/// Width of an IEEE-754 double in bytes, for the binary ephemeris reader's
/// record arithmetic.
pub(crate) const DBL_SIZE: usize = 8;

/// Maps a file and copies its contents onto the heap, so the returned bytes
/// outlive the mapping and never fault on a truncated file.
#[macro_export]
macro_rules! file2heap {
    ($filename:tt) => {
        match File::open($filename) {
            Err(e) => Err($crate::errors::InputOutputError::IOError { kind: e.kind() }),
            Ok(file) => unsafe {
                use bytes::Bytes;
                use memmap2::MmapOptions;
                match MmapOptions::new().map(&file) {
                    Err(_) => Err($crate::errors::InputOutputError::IOUnknownError),
                    Ok(mmap) => {
                        let bytes = Bytes::copy_from_slice(&mmap);
                        Ok(bytes)
                    }
                }
            },
        }
    };
}
