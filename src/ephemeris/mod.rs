/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The solar-system ephemeris facade.
//!
//! One entry point produces heliocentric position and velocity in AU and
//! AU/day in the fundamental J2000 mean equatorial frame for every kind of
//! solar-system body, dispatching on the body and on which data sources are
//! loaded:
//!
//! | body | method |
//! |---|---|
//! | Sun | zero vector |
//! | major planet, DE file covers the instant | Chebyshev interpolation |
//! | major planet otherwise | VSOP series (Pluto: Standish elements) |
//! | Moon, DE file covers the instant | DE Chebyshev |
//! | Moon otherwise | ELP series |
//! | asteroid, comet | two-body propagation of stored elements |
//! | artificial satellite | SGP4/SDP4, rotated out of TEME |
//!
//! A DE failure (out of range, malformed record) falls back to the analytic
//! theories rather than propagating the error.

pub mod de;
pub mod elp;
pub mod sgp4;
pub mod vsop;

use crate::constants::solar_system::*;
use crate::constants::{AU_KM, LIGHT_AU_PER_DAY, SECONDS_PER_DAY};
use crate::errors::EphemerisResult;
use crate::frames::{obliquity, precession_matrix};
use crate::math::rotation::r1;
use crate::math::{Matrix3, Vector3};
use crate::orbit::{standish, Orbit};
use crate::time::JD_J2000;
use de::DeEphemeris;
use log::warn;
use sgp4::Sgp4;

/// Step used for finite-difference velocities of the analytic theories,
/// days. Small enough that truncation error is negligible against the
/// series truncation itself.
const VEL_STEP_DAYS: f64 = 0.05;

/// Rotation from the mean ecliptic of date at `jed` to the fundamental
/// frame.
fn ecliptic_of_date_to_fundamental(jed: f64) -> Matrix3 {
    precession_matrix(jed).transpose() * r1(-obliquity(jed))
}

/// Rotation from the J2000 ecliptic (the frame of osculating elements) to
/// the fundamental frame.
pub(crate) fn ecliptic_j2000_to_fundamental() -> Matrix3 {
    r1(-obliquity(JD_J2000))
}

/// Heliocentric state of the Earth in the fundamental frame, AU and AU/day.
/// Always analytic (VSOP); the frame bundle relies on this being total.
pub fn earth_heliocentric(jed: f64) -> (Vector3, Vector3) {
    analytic_planet(PLANET_EARTH, jed)
}

/// Analytic (VSOP / ELP / Standish) heliocentric state of a planet or the
/// Moon in the fundamental frame.
fn analytic_planet(planet: i32, jed: f64) -> (Vector3, Vector3) {
    let eval = |jed: f64| -> Vector3 {
        match planet {
            PLANET_SUN => Vector3::zeros(),
            MOON_LUNA => {
                let rot = ecliptic_of_date_to_fundamental(jed);
                let (earth, _) = earth_heliocentric(jed);
                earth + rot * elp::geocentric_spherical(jed).to_vector()
            }
            PLANET_PLUTO => {
                let orbit = standish::mean_orbit(planet, jed)
                    .expect("Pluto always has Standish elements");
                let (pos, _) = orbit.position_velocity(jed);
                ecliptic_j2000_to_fundamental() * pos
            }
            _ => match vsop::heliocentric_position(planet, jed) {
                Some(pos) => ecliptic_of_date_to_fundamental(jed) * pos,
                None => Vector3::zeros(),
            },
        }
    };

    let pos = eval(jed);
    let before = eval(jed - VEL_STEP_DAYS);
    let after = eval(jed + VEL_STEP_DAYS);
    let vel = (after - before) / (2.0 * VEL_STEP_DAYS);
    (pos, vel)
}

/// The ephemeris engine: analytic theories plus an optionally loaded JPL DE
/// file. Construction is cheap; the engine holds no mutable state.
#[derive(Default)]
pub struct Ephemeris {
    de: Option<DeEphemeris>,
}

impl Ephemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a numerical ephemeris; bodies and instants it covers are
    /// served from it in preference to the analytic theories.
    pub fn with_de(de: DeEphemeris) -> Self {
        Self { de: Some(de) }
    }

    pub fn de(&self) -> Option<&DeEphemeris> {
        self.de.as_ref()
    }

    /// Heliocentric position and velocity of a planet, the Sun, or the Moon
    /// at `jed`, AU and AU/day, fundamental frame.
    pub fn position_velocity(&self, planet: i32, jed: f64) -> EphemerisResult<(Vector3, Vector3)> {
        if planet == PLANET_SUN {
            return Ok((Vector3::zeros(), Vector3::zeros()));
        }
        if let Some(de) = &self.de {
            if de.covers(jed) && planet != PLANET_PLUTO {
                match de.position_velocity(planet, jed) {
                    Ok(state) => return Ok(state),
                    Err(err) => {
                        warn!("DE lookup failed ({err}); falling back to analytic series");
                    }
                }
            }
        }
        Ok(analytic_planet(planet, jed))
    }

    /// Heliocentric state from osculating elements (asteroids and comets).
    /// Elements are referred to the J2000 ecliptic.
    pub fn orbit_position_velocity(&self, orbit: &Orbit, jed: f64) -> (Vector3, Vector3) {
        let (pos, vel) = orbit.position_velocity(jed);
        let rot = ecliptic_j2000_to_fundamental();
        (rot * pos, rot * vel)
    }

    /// Heliocentric state of an Earth satellite: SGP4/SDP4 in TEME, rotated
    /// to the fundamental frame by the precession of the TEME pseudo-equinox,
    /// then shifted by the Earth's heliocentric state.
    pub fn satellite_position_velocity(
        &self,
        propagator: &Sgp4,
        jed: f64,
    ) -> EphemerisResult<(Vector3, Vector3)> {
        let (pos_km, vel_km_s) = propagator.propagate_jd(jed)?;
        let rot = precession_matrix(jed).transpose();
        let geo_pos = rot * pos_km / AU_KM;
        let geo_vel = rot * vel_km_s * SECONDS_PER_DAY / AU_KM;
        let (earth_pos, earth_vel) = self.position_velocity(PLANET_EARTH, jed)?;
        Ok((earth_pos + geo_pos, earth_vel + geo_vel))
    }

    /// Geocentric state of an Earth satellite in the fundamental frame, AU
    /// and AU/day. Light-time correction never applies to this vector.
    pub fn satellite_geocentric(
        &self,
        propagator: &Sgp4,
        jed: f64,
    ) -> EphemerisResult<(Vector3, Vector3)> {
        let (pos_km, vel_km_s) = propagator.propagate_jd(jed)?;
        let rot = precession_matrix(jed).transpose();
        Ok((
            rot * pos_km / AU_KM,
            rot * vel_km_s * SECONDS_PER_DAY / AU_KM,
        ))
    }

    /// Retarded (antedated) heliocentric state of a planet or the Moon as
    /// seen from `obs_pos`: the body is re-evaluated one light-time earlier.
    /// A single iteration is sufficient for every body except close Earth
    /// satellites, which skip the correction entirely.
    pub fn astrometric_position_velocity(
        &self,
        planet: i32,
        jed: f64,
        obs_pos: &Vector3,
    ) -> EphemerisResult<(Vector3, Vector3)> {
        let (pos, _) = self.position_velocity(planet, jed)?;
        let tau = (pos - obs_pos).norm() / LIGHT_AU_PER_DAY;
        self.position_velocity(planet, jed - tau)
    }

    /// Retarded heliocentric state from osculating elements.
    pub fn astrometric_orbit_position_velocity(
        &self,
        orbit: &Orbit,
        jed: f64,
        obs_pos: &Vector3,
    ) -> (Vector3, Vector3) {
        let (pos, _) = self.orbit_position_velocity(orbit, jed);
        let tau = (pos - obs_pos).norm() / LIGHT_AU_PER_DAY;
        self.orbit_position_velocity(orbit, jed - tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use bytes::Bytes;

    #[test]
    fn sun_is_the_origin() {
        let eph = Ephemeris::new();
        let (pos, vel) = eph.position_velocity(PLANET_SUN, JD_J2000).unwrap();
        assert_eq!(pos, Vector3::zeros());
        assert_eq!(vel, Vector3::zeros());
    }

    #[test]
    fn moon_stays_near_the_earth() {
        let eph = Ephemeris::new();
        for k in 0..12 {
            let jed = JD_J2000 + f64::from(k) * 100.0;
            let (moon, _) = eph.position_velocity(MOON_LUNA, jed).unwrap();
            let (earth, _) = eph.position_velocity(PLANET_EARTH, jed).unwrap();
            let d_km = (moon - earth).norm() * AU_KM;
            assert!(
                (354_000.0..407_000.0).contains(&d_km),
                "Earth-Moon distance {d_km} km"
            );
        }
    }

    #[test]
    fn earth_velocity_is_orbital() {
        let (_, vel) = earth_heliocentric(JD_J2000 + 1_234.0);
        let v_km_s = vel.norm() * AU_KM / SECONDS_PER_DAY;
        assert!((28.0..31.0).contains(&v_km_s), "Earth at {v_km_s} km/s");
    }

    #[test]
    fn de_takes_priority_inside_its_span_and_falls_back_outside() {
        let de =
            DeEphemeris::from_bytes(Bytes::from(de::testutil::synthetic_file())).unwrap();
        let eph = Ephemeris::with_de(de);

        // Inside the span the synthetic Mercury (1e6 km on x at mid-record)
        // is served from the file.
        let mid = de::testutil::START_JED + 16.0;
        let (pos, _) = eph.position_velocity(PLANET_MERCURY, mid).unwrap();
        assert_relative_eq!(pos.x, 1.0e6 / de::testutil::AU_TEST, epsilon = 1e-12);

        // Outside the span the analytic series answers: Mercury near 0.4 AU.
        let outside = de::testutil::STOP_JED + 1_000.0;
        let (pos, _) = eph.position_velocity(PLANET_MERCURY, outside).unwrap();
        assert!((0.3..0.48).contains(&pos.norm()), "r = {}", pos.norm());
    }

    #[test]
    fn light_time_antedates_the_position() {
        let eph = Ephemeris::new();
        let jed = JD_J2000 + 500.0;
        let (earth, _) = eph.position_velocity(PLANET_EARTH, jed).unwrap();
        let (geometric, _) = eph.position_velocity(PLANET_JUPITER, jed).unwrap();
        let (retarded, _) = eph
            .astrometric_position_velocity(PLANET_JUPITER, jed, &earth)
            .unwrap();
        let shift = (geometric - retarded).norm();
        // Jupiter moves ~0.0075 AU/day and is light-delayed by tens of
        // minutes: the retardation must be visible but small.
        assert!(shift > 1e-5, "shift {shift}");
        assert!(shift < 1e-2, "shift {shift}");
    }

    #[test]
    fn keplerian_orbit_rotates_into_the_fundamental_frame() {
        let eph = Ephemeris::new();
        // A circular orbit in the J2000 ecliptic plane must be inclined by
        // the obliquity in the fundamental (equatorial) frame.
        let mu = crate::constants::GM_SUN_AU3_DAY2;
        let a: f64 = 2.0;
        let orbit = Orbit::new(JD_J2000, a, 0.0, 0.0, 0.0, 0.0, 0.0, (mu / (a * a * a)).sqrt());
        let mut max_z: f64 = 0.0;
        for k in 0..40 {
            let (pos, _) = eph.orbit_position_velocity(&orbit, JD_J2000 + f64::from(k) * 30.0);
            max_z = max_z.max(pos.z.abs());
        }
        let sin_obl = obliquity(JD_J2000).sin();
        assert_abs_diff_eq!(max_z, a * sin_obl, epsilon = 0.01);
    }

    #[test]
    fn satellite_state_is_earth_plus_geocentric() {
        let tle = sgp4::Tle::from_lines(
            "ISS",
            "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992",
            "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008",
        )
        .unwrap();
        let prop = Sgp4::new(&tle).unwrap();
        let eph = Ephemeris::new();
        let jed = tle.epoch_jd + 0.1;
        let (helio, _) = eph.satellite_position_velocity(&prop, jed).unwrap();
        let (geo, _) = eph.satellite_geocentric(&prop, jed).unwrap();
        let (earth, _) = eph.position_velocity(PLANET_EARTH, jed).unwrap();
        assert_abs_diff_eq!((helio - earth - geo).norm(), 0.0, epsilon = 1e-12);
        let alt_km = geo.norm() * AU_KM;
        assert!((6_600.0..6_900.0).contains(&alt_km));
    }
}
