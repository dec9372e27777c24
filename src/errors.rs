/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use snafu::prelude::*;
use std::io::ErrorKind as IOErrorKind;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InputOutputError {
    /// Raised for an error in reading or writing the file(s)
    IOError { kind: IOErrorKind },
    /// Raised if an IO error occurred but its representation is not simple (and therefore not an std::io::ErrorKind).
    IOUnknownError,
}

impl From<IOErrorKind> for InputOutputError {
    fn from(kind: IOErrorKind) -> Self {
        Self::IOError { kind }
    }
}

/// Errors from the solar-system ephemeris engine.
///
/// Pure analytic theories are total; only the JPL DE file reader and the
/// SGP4/SDP4 propagator can fail at runtime. The facade reacts to a DE failure
/// by falling back to the analytic series.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EphemerisError {
    #[snafu(display(
        "JED {jed} outside ephemeris file span [{start_jed}, {stop_jed}]"
    ))]
    OutOfRange {
        jed: f64,
        start_jed: f64,
        stop_jed: f64,
    },
    #[snafu(display("ephemeris file does not carry data for object {id}"))]
    NoSuchObject { id: i32 },
    #[snafu(display("{source} when accessing the ephemeris file"))]
    EphemIO { source: InputOutputError },
    #[snafu(display(
        "ephemeris file malformed: need bytes [{start}..{end}] but file holds {size}"
    ))]
    InaccessibleBytes {
        start: usize,
        end: usize,
        size: usize,
    },
    #[snafu(display("ephemeris file header malformed: {reason}"))]
    BadHeader { reason: &'static str },
    #[snafu(display("satellite elements rejected: {reason}"))]
    BadElements { reason: &'static str },
    #[snafu(display("satellite orbit decayed (negative semi-latus rectum)"))]
    Decayed,
    #[snafu(display("no orbital elements stored for this object"))]
    MissingOrbit,
}

pub type EphemerisResult<T> = Result<T, EphemerisError>;

/// High-level mount communication error codes.
///
/// Read and write failures do not change connection state; a caller must
/// explicitly disconnect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MountError {
    /// Input command parameter was not valid
    InvalidInput,
    /// Output data from the mount was not valid (garbage, could not be parsed, etc.)
    InvalidOutput,
    /// Slew/sync coordinates sent to mount invalid, below horizon, out of reach of mount, etc.
    InvalidCoords,
    /// Can't open serial port or socket connection
    OpenFail,
    /// Can't close serial port or socket connection
    CloseFail,
    /// Can't read from serial port or socket connection
    ReadFail,
    /// Can't write to serial port or socket connection
    WriteFail,
    /// Functionality is not implemented/not supported
    NotSupported,
    /// Read/write operation timed out before completion
    TimedOut,
    /// Alignment star could not be added to mount model
    BadAlignment,
}

pub type MountResult<T> = Result<T, MountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeris_error_display_names_the_span() {
        let err = EphemerisError::OutOfRange {
            jed: 2_451_545.0,
            start_jed: 2_458_000.5,
            stop_jed: 2_468_000.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("2451545"));
        assert!(msg.contains("2458000.5"));
    }

    #[test]
    fn mount_error_is_copy_and_comparable() {
        let a = MountError::TimedOut;
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, MountError::ReadFail);
    }
}
