/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use core::f64::consts::{PI, TAU};
use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use serde_derive::{Deserialize, Serialize};

pub const DEG_PER_RAD: f64 = 180.0 / PI;
pub const HOUR_PER_RAD: f64 = 12.0 / PI;
pub const ARCMIN_PER_RAD: f64 = 60.0 * DEG_PER_RAD;
pub const ARCSEC_PER_RAD: f64 = 3600.0 * DEG_PER_RAD;

/// An angle, stored in radians.
///
/// Constructors exist for every sexagesimal representation used by catalogs
/// and mount protocols. Reduction to `[0, 2π)` or `(−π, +π]` is always an
/// explicit operation, never implicit.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub const fn from_radians(rad: f64) -> Self {
        Self(rad)
    }

    pub fn from_degrees(deg: f64) -> Self {
        Self(deg / DEG_PER_RAD)
    }

    pub fn from_hours(hours: f64) -> Self {
        Self(hours / HOUR_PER_RAD)
    }

    pub fn from_arcmin(arcmin: f64) -> Self {
        Self(arcmin / ARCMIN_PER_RAD)
    }

    pub fn from_arcsec(arcsec: f64) -> Self {
        Self(arcsec / ARCSEC_PER_RAD)
    }

    pub fn from_hms(hms: HourMinSec) -> Self {
        Self::from_hours(hms.to_hours())
    }

    pub fn from_dms(dms: DegMinSec) -> Self {
        Self::from_degrees(dms.to_degrees())
    }

    pub const fn as_radians(self) -> f64 {
        self.0
    }

    pub fn to_degrees(self) -> f64 {
        self.0 * DEG_PER_RAD
    }

    pub fn to_hours(self) -> f64 {
        self.0 * HOUR_PER_RAD
    }

    pub fn to_arcmin(self) -> f64 {
        self.0 * ARCMIN_PER_RAD
    }

    pub fn to_arcsec(self) -> f64 {
        self.0 * ARCSEC_PER_RAD
    }

    pub fn to_hms(self) -> HourMinSec {
        HourMinSec::from_hours(self.to_hours())
    }

    pub fn to_dms(self) -> DegMinSec {
        DegMinSec::from_degrees(self.to_degrees())
    }

    /// Reduces this angle to the half-open interval `[0, 2π)`.
    pub fn mod_2pi(self) -> Self {
        Self(self.0.rem_euclid(TAU))
    }

    /// Reduces this angle to the half-open interval `(−π, +π]`.
    pub fn mod_pi(self) -> Self {
        let mut a = self.0.rem_euclid(TAU);
        if a > PI {
            a -= TAU;
        }
        Self(a)
    }

    /// Arctangent of `y / x` reduced to `[0, 2π)`.
    pub fn atan2_2pi(y: f64, x: f64) -> f64 {
        y.atan2(x).rem_euclid(TAU)
    }

    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    pub fn tan(self) -> f64 {
        self.0.tan()
    }
}

impl From<f64> for Angle {
    fn from(rad: f64) -> Self {
        Self(rad)
    }
}

impl From<Angle> for f64 {
    fn from(a: Angle) -> f64 {
        a.0
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Angle {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Angle {
    type Output = Angle;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Sexagesimal hours, minutes, seconds with an explicit sign character, so
/// that `-0h 30m` is distinguishable from `+0h 30m`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourMinSec {
    pub sign: char,
    pub hour: u8,
    pub min: u8,
    pub sec: f64,
}

impl HourMinSec {
    pub fn from_hours(hours: f64) -> Self {
        let sign = if hours < 0.0 { '-' } else { '+' };
        let total = hours.abs();
        let hour = total.floor();
        let min = (60.0 * (total - hour)).floor();
        let sec = 3600.0 * (total - hour - min / 60.0);
        Self {
            sign,
            hour: hour as u8,
            min: min as u8,
            sec,
        }
    }

    pub fn to_hours(&self) -> f64 {
        let h = f64::from(self.hour) + f64::from(self.min) / 60.0 + self.sec / 3600.0;
        if self.sign == '-' {
            -h
        } else {
            h
        }
    }
}

impl fmt::Display for HourMinSec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}h {:02}m {:05.2}s", self.hour, self.min, self.sec)
    }
}

/// Sexagesimal degrees, minutes, seconds with an explicit sign character, so
/// that `-0° 30′` is distinguishable from `+0° 30′`. Degrees run to 360 so
/// west-positive longitudes fit.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DegMinSec {
    pub sign: char,
    pub deg: u16,
    pub min: u8,
    pub sec: f64,
}

impl DegMinSec {
    pub fn from_degrees(degrees: f64) -> Self {
        let sign = if degrees < 0.0 { '-' } else { '+' };
        let total = degrees.abs();
        let deg = total.floor();
        let min = (60.0 * (total - deg)).floor();
        let sec = 3600.0 * (total - deg - min / 60.0);
        Self {
            sign,
            deg: deg as u16,
            min: min as u8,
            sec,
        }
    }

    pub fn to_degrees(&self) -> f64 {
        let d = f64::from(self.deg) + f64::from(self.min) / 60.0 + self.sec / 3600.0;
        if self.sign == '-' {
            -d
        } else {
            d
        }
    }
}

impl fmt::Display for DegMinSec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{:02}° {:02}′ {:04.1}″",
            self.sign, self.deg, self.min, self.sec
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn degree_radian_round_trip() {
        let a = Angle::from_degrees(123.456);
        assert_abs_diff_eq!(a.to_degrees(), 123.456, epsilon = 1e-12);
        assert_abs_diff_eq!(a.to_arcsec(), 123.456 * 3600.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case(-0.5, 2.0 * PI - 0.5)]
    #[case(0.0, 0.0)]
    #[case(7.0, 7.0 - TAU)]
    fn reduction_to_two_pi(#[case] input: f64, #[case] expect: f64) {
        assert_abs_diff_eq!(
            Angle::from_radians(input).mod_2pi().as_radians(),
            expect,
            epsilon = 1e-15
        );
    }

    #[test]
    fn reduction_to_pm_pi_is_half_open_above() {
        assert_abs_diff_eq!(
            Angle::from_radians(PI).mod_pi().as_radians(),
            PI,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            Angle::from_radians(-PI).mod_pi().as_radians(),
            PI,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            Angle::from_radians(3.0 * PI / 2.0).mod_pi().as_radians(),
            -PI / 2.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn negative_zero_degrees_keeps_its_sign() {
        let dms = DegMinSec::from_degrees(-0.5);
        assert_eq!(dms.sign, '-');
        assert_eq!(dms.deg, 0);
        assert_eq!(dms.min, 30);
        assert_abs_diff_eq!(dms.to_degrees(), -0.5, epsilon = 1e-12);

        let plus = DegMinSec::from_degrees(0.5);
        assert_eq!(plus.sign, '+');
        assert_abs_diff_eq!(plus.to_degrees(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn hms_round_trip() {
        let hms = HourMinSec::from_hours(6.752477);
        assert_eq!(hms.hour, 6);
        assert_eq!(hms.min, 45);
        assert_abs_diff_eq!(hms.to_hours(), 6.752477, epsilon = 1e-12);
    }
}
