/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Civil time, Julian dates, ΔT, and sidereal time.
//!
//! [`Time`] is an immutable instant: a Julian Date on the UTC scale plus the
//! time zone and calendar system used when rendering it as a civil date. The
//! ephemeris time scale (TDT) is reached through [`Time::julian_ephemeris_date`],
//! which applies the piecewise-polynomial ΔT model in [`delta_t`].

pub mod delta_t;

use crate::math::angle::Angle;
use core::f64::consts::TAU;
use hifitime::Epoch;
use serde_derive::{Deserialize, Serialize};

/// The Julian Date of the standard epoch J2000.0 (2000 January 1.5 TT).
pub const JD_J2000: f64 = 2_451_545.0;

/// The Julian Date of the Besselian epoch B1950.0.
pub const JD_B1950: f64 = 2_433_282.4235;

/// The Julian Date of the Besselian epoch B1875.0, the equinox of the IAU
/// constellation boundaries.
pub const JD_B1875: f64 = 2_405_889.258_550;

/// Length of the Besselian (tropical) year in days.
const DAYS_PER_BESSELIAN_YEAR: f64 = 365.242_198_781;

/// Julian Date of the Besselian epoch B1900.0.
const JD_B1900: f64 = 2_415_020.313_52;

/// Calendar system used for civil date conversions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarSystem {
    #[default]
    Gregorian,
    Julian,
}

/// A civil date and time of day in a particular zone and calendar.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CivilDate {
    pub calendar: CalendarSystem,
    /// Hours east of UTC
    pub zone: f64,
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: f64,
}

/// An immutable instant: Julian Date on the UTC scale, plus the zone and
/// calendar used for civil-date rendering.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Time {
    /// Julian Date (UTC)
    pub jd: f64,
    /// Hours east of UTC
    pub zone: f64,
    pub calendar: CalendarSystem,
}

impl Default for Time {
    fn default() -> Self {
        Self {
            jd: JD_J2000,
            zone: 0.0,
            calendar: CalendarSystem::Gregorian,
        }
    }
}

impl Time {
    pub fn from_julian_date(jd: f64) -> Self {
        Self {
            jd,
            zone: 0.0,
            calendar: CalendarSystem::Gregorian,
        }
    }

    /// Constructs an instant from a civil date and time of day.
    ///
    /// The fractional `day` is supported (`15.5` is noon on the 15th) so that
    /// day-of-year epochs convert directly. Algorithm from Meeus,
    /// "Astronomical Algorithms", ch. 7, valid for any year including
    /// negative ones.
    pub fn from_civil(
        calendar: CalendarSystem,
        zone: f64,
        year: i32,
        month: u8,
        day: f64,
        hour: u8,
        min: u8,
        sec: f64,
    ) -> Self {
        let mut y = f64::from(year);
        let mut m = f64::from(month);
        if m <= 2.0 {
            y -= 1.0;
            m += 12.0;
        }

        let b = match calendar {
            CalendarSystem::Gregorian => {
                let a = (y / 100.0).floor();
                2.0 - a + (a / 4.0).floor()
            }
            CalendarSystem::Julian => 0.0,
        };

        let day_frac =
            day + (f64::from(hour) + f64::from(min) / 60.0 + sec / 3600.0) / 24.0;
        let jd_local = (365.25 * (y + 4716.0)).floor()
            + (30.6001 * (m + 1.0)).floor()
            + day_frac
            + b
            - 1524.5;

        Self {
            jd: jd_local - zone / 24.0,
            zone,
            calendar,
        }
    }

    /// Constructs an instant from a Besselian year (e.g. `1875.0`).
    pub fn from_besselian_year(by: f64) -> Self {
        Self::from_julian_date(JD_B1900 + (by - 1900.0) * DAYS_PER_BESSELIAN_YEAR)
    }

    /// Decomposes this instant into a civil date in its zone and calendar.
    pub fn to_civil(&self) -> CivilDate {
        let jd_local = self.jd + self.zone / 24.0;
        let z = (jd_local + 0.5).floor();
        let f = jd_local + 0.5 - z;

        let a = match self.calendar {
            CalendarSystem::Julian => z,
            CalendarSystem::Gregorian => {
                let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
                z + 1.0 + alpha - (alpha / 4.0).floor()
            }
        };

        let b = a + 1524.0;
        let c = ((b - 122.1) / 365.25).floor();
        let d = (365.25 * c).floor();
        let e = ((b - d) / 30.6001).floor();

        let day_frac = b - d - (30.6001 * e).floor() + f;
        let day = day_frac.floor();
        let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
        let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

        let mut hours = 24.0 * (day_frac - day);
        // Guard against rounding pushing 23:59:59.999… into the next day.
        if hours >= 24.0 {
            hours = 0.0;
        }
        let hour = hours.floor();
        let minutes = 60.0 * (hours - hour);
        let min = minutes.floor();
        let sec = 60.0 * (minutes - min);

        CivilDate {
            calendar: self.calendar,
            zone: self.zone,
            year: year as i32,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            min: min as u8,
            sec,
        }
    }

    /// The Julian Ephemeris Date: this instant on the TDT scale,
    /// `jed = jd + ΔT/86400`.
    pub fn julian_ephemeris_date(&self) -> f64 {
        self.jd + delta_t::delta_t_seconds(self.jd) / 86_400.0
    }

    /// Greenwich mean sidereal time at this instant, radians in `[0, 2π)`.
    ///
    /// Meeus, "Astronomical Algorithms", eq. 12.4.
    pub fn greenwich_mean_sidereal_time(&self) -> f64 {
        let t = (self.jd - JD_J2000) / 36_525.0;
        let theta_deg = 280.460_618_37
            + 360.985_647_366_29 * (self.jd - JD_J2000)
            + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0;
        (theta_deg.to_radians()).rem_euclid(TAU)
    }

    /// Local mean sidereal time for an east-positive longitude in radians.
    ///
    /// Pass a longitude pre-corrected by the equation of the equinoxes
    /// (`Δψ·cos ε`) to obtain local *apparent* sidereal time; the frame
    /// bundle does exactly that.
    pub fn sidereal_time(&self, lon: f64) -> f64 {
        (self.greenwich_mean_sidereal_time() + lon).rem_euclid(TAU)
    }

    /// Decimal year of this instant, used to index the ΔT model.
    pub fn decimal_year(&self) -> f64 {
        2000.0 + (self.jd - JD_J2000) / 365.25
    }

    pub fn from_epoch(epoch: Epoch) -> Self {
        Self::from_julian_date(epoch.to_jde_utc_days())
    }

    pub fn to_epoch(&self) -> Epoch {
        Epoch::from_jde_utc(self.jd)
    }

    /// This instant offset by a number of days.
    pub fn add_days(&self, days: f64) -> Self {
        Self {
            jd: self.jd + days,
            ..*self
        }
    }
}

impl From<Epoch> for Time {
    fn from(epoch: Epoch) -> Self {
        Self::from_epoch(epoch)
    }
}

/// Hour angle of a right ascension at a local apparent sidereal time, reduced
/// to `(−π, +π]`.
pub fn hour_angle(lst: f64, ra: f64) -> f64 {
    Angle::from_radians(lst - ra).mod_pi().as_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    // Meeus ch. 7 worked examples.
    #[case(CalendarSystem::Gregorian, 1957, 10, 4.81, 2_436_116.31)]
    #[case(CalendarSystem::Julian, 333, 1, 27.5, 1_842_713.0)]
    #[case(CalendarSystem::Gregorian, 2000, 1, 1.5, JD_J2000)]
    fn civil_to_jd_matches_meeus(
        #[case] cal: CalendarSystem,
        #[case] year: i32,
        #[case] month: u8,
        #[case] day: f64,
        #[case] expect: f64,
    ) {
        let t = Time::from_civil(cal, 0.0, year, month, day, 0, 0, 0.0);
        assert_abs_diff_eq!(t.jd, expect, epsilon = 1e-6);
    }

    #[test]
    fn jd_to_civil_round_trip() {
        let t = Time::from_civil(CalendarSystem::Gregorian, 0.0, 2020, 4, 15.0, 0, 0, 0.0);
        let civil = t.to_civil();
        assert_eq!(civil.year, 2020);
        assert_eq!(civil.month, 4);
        assert_eq!(civil.day, 15);
        assert_eq!(civil.hour, 0);
        assert_eq!(civil.min, 0);
        assert!(civil.sec < 1e-4 || civil.sec > 59.999);
    }

    #[test]
    fn zone_shifts_civil_rendering_not_the_instant() {
        let utc = Time::from_civil(CalendarSystem::Gregorian, 0.0, 2021, 6, 1.0, 12, 0, 0.0);
        let east = Time {
            zone: 8.0,
            ..utc
        };
        assert_abs_diff_eq!(utc.jd, east.jd, epsilon = 0.0);
        assert_eq!(east.to_civil().hour, 20);
    }

    #[test]
    fn besselian_1875_matches_reference_epoch() {
        let t = Time::from_besselian_year(1875.0);
        assert_abs_diff_eq!(t.jd, JD_B1875, epsilon = 1e-3);
    }

    #[test]
    fn gmst_at_1987_april_10_matches_meeus() {
        // Meeus example 12.a: 1987 April 10.0 TT≈UT, GMST = 13h 10m 46.3668s
        let t = Time::from_civil(CalendarSystem::Gregorian, 0.0, 1987, 4, 10.0, 0, 0, 0.0);
        let gmst_hours = t.greenwich_mean_sidereal_time() * 12.0 / core::f64::consts::PI;
        let expect = 13.0 + 10.0 / 60.0 + 46.3668 / 3600.0;
        assert_abs_diff_eq!(gmst_hours, expect, epsilon = 1e-4);
    }

    #[test]
    fn epoch_interop_round_trip() {
        let t = Time::from_civil(CalendarSystem::Gregorian, 0.0, 2015, 8, 20.0, 6, 30, 0.0);
        let back = Time::from_epoch(t.to_epoch());
        assert_abs_diff_eq!(t.jd, back.jd, epsilon = 1e-9);
    }
}
