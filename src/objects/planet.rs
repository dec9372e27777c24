/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Solar-system objects: planets, moons, asteroids, comets, and artificial
//! satellites, with their magnitude models and rotational orientation.

use crate::constants::solar_system::*;
use crate::constants::AU_KM;
use crate::ephemeris::sgp4::{Sgp4, Tle};
use crate::ephemeris::Ephemeris;
use crate::errors::EphemerisResult;
use crate::frames::Coordinates;
use crate::ident::Identifier;
use crate::math::rotation::{r1, r3};
use crate::math::{Matrix3, Vector3};
use crate::objects::{ApparentPlace, ObjectKind};
use crate::orbit::Orbit;
use crate::time::JD_J2000;
use core::f64::consts::FRAC_PI_2;
use serde_derive::{Deserialize, Serialize};

/// A solar-system body: identifier, osculating elements, photometric
/// parameters, and physical properties. Artificial satellites use the
/// [`Satellite`] wrapper, which adds the TLE and its propagator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Planet {
    pub kind: ObjectKind,
    pub names: Vec<String>,
    pub id: Identifier,
    /// Osculating heliocentric elements (J2000 ecliptic); `None` for major
    /// planets served by the theories.
    pub orbit: Option<Orbit>,
    /// Absolute magnitude H; infinite when unknown
    pub h_mag: f32,
    /// Phase slope G (asteroids) or brightening exponent K (comets);
    /// infinite when unknown
    pub g_mag: f32,
    /// Equatorial radius, km; 0 or infinite when unknown
    pub radius: f64,
    /// Mass in Earth masses; 0 or infinite when unknown
    pub mass: f64,
}

impl Planet {
    pub fn new(kind: ObjectKind, id: Identifier) -> Self {
        Self {
            kind,
            names: Vec::new(),
            id,
            orbit: None,
            h_mag: f32::INFINITY,
            g_mag: f32::INFINITY,
            radius: 0.0,
            mass: 0.0,
        }
    }

    /// The NAIF planet/moon number when this object carries one.
    pub fn planet_id(&self) -> Option<i32> {
        match self.id.catalog() {
            crate::ident::Catalog::JplPlanet => Some(self.id.ident() as i32),
            _ => None,
        }
    }

    /// Heliocentric state at `jed` in the fundamental frame, AU and AU/day.
    pub fn position_velocity(
        &self,
        eph: &Ephemeris,
        jed: f64,
    ) -> EphemerisResult<(Vector3, Vector3)> {
        match (self.kind, self.planet_id(), &self.orbit) {
            (ObjectKind::Planet | ObjectKind::Moon, Some(id), _) => {
                eph.position_velocity(id, jed)
            }
            (_, _, Some(orbit)) => Ok(eph.orbit_position_velocity(orbit, jed)),
            _ => Err(crate::errors::EphemerisError::MissingOrbit),
        }
    }

    /// Apparent direction, distance (AU), and magnitude for an observer.
    pub fn apparent_place(
        &self,
        frame: &Coordinates,
        eph: &Ephemeris,
    ) -> EphemerisResult<ApparentPlace> {
        let (pos, _vel) = if frame.lighttime {
            match (self.kind, self.planet_id(), &self.orbit) {
                (ObjectKind::Planet | ObjectKind::Moon, Some(id), _) => {
                    eph.astrometric_position_velocity(id, frame.jed, &frame.obs_pos)?
                }
                (_, _, Some(orbit)) => {
                    eph.astrometric_orbit_position_velocity(orbit, frame.jed, &frame.obs_pos)
                }
                _ => return Err(crate::errors::EphemerisError::MissingOrbit),
            }
        } else {
            self.position_velocity(eph, frame.jed)?
        };

        let toward = pos - frame.obs_pos;
        let distance = toward.norm();
        let mut direction = toward / distance;
        if frame.aberration {
            direction = frame.apply_aberration(direction);
        }

        let phase = phase_angle(&pos, &(-toward));
        let sun_distance = pos.norm();
        let magnitude = self.apparent_magnitude(sun_distance, distance, phase);

        Ok(ApparentPlace {
            direction,
            distance,
            magnitude,
        })
    }

    /// Apparent magnitude from heliocentric distance, observer distance
    /// (both AU), and phase angle.
    pub fn apparent_magnitude(&self, sun_dist: f64, obs_dist: f64, phase: f64) -> f64 {
        let h = f64::from(self.h_mag);
        if !h.is_finite() {
            return f64::INFINITY;
        }
        match self.kind {
            ObjectKind::Comet => {
                // H + 5 log Δ + 2.5 K log r
                let k = if self.g_mag.is_finite() {
                    f64::from(self.g_mag)
                } else {
                    4.0
                };
                h + 5.0 * obs_dist.log10() + 2.5 * k * sun_dist.log10()
            }
            _ => {
                // IAU H-G phase model (Bowell et al. 1989).
                let g = if self.g_mag.is_finite() {
                    f64::from(self.g_mag)
                } else {
                    0.15
                };
                let tan_half = (phase / 2.0).tan();
                let phi1 = (-3.33 * tan_half.powf(0.63)).exp();
                let phi2 = (-1.87 * tan_half.powf(1.22)).exp();
                h + 5.0 * (sun_dist * obs_dist).log10()
                    - 2.5 * ((1.0 - g) * phi1 + g * phi2).log10()
            }
        }
    }

    /// Apparent angular radius at a distance in AU, radians.
    pub fn angular_radius(&self, distance_au: f64) -> f64 {
        (self.radius / (distance_au * AU_KM)).asin()
    }

    /// Fraction of the disk illuminated at a phase angle.
    pub fn illumination(phase: f64) -> f64 {
        (1.0 + phase.cos()) / 2.0
    }

    /// Rotation from planetographic to fundamental coordinates at `jed`,
    /// from the IAU pole and prime-meridian expressions.
    pub fn planetographic_matrix(&self, jed: f64) -> Matrix3 {
        match self.planet_id().and_then(|id| rotation_elements(id, jed)) {
            Some((a0, d0, w)) => {
                (r3(w) * r1(FRAC_PI_2 - d0) * r3(a0 + FRAC_PI_2)).transpose()
            }
            None => Matrix3::identity(),
        }
    }
}

/// Phase angle at the body between the Sun and the observer:
/// `position` is heliocentric, `direction` points from the body toward the
/// observer.
pub fn phase_angle(position: &Vector3, direction: &Vector3) -> f64 {
    crate::math::angular_separation(&-position, direction)
}

/// IAU north pole (α₀, δ₀) and prime meridian W in radians for the major
/// planets and the Moon (IAU WGCCRE 2009 report; lunar libration terms
/// truncated).
pub fn rotation_elements(id: i32, jed: f64) -> Option<(f64, f64, f64)> {
    let d = jed - JD_J2000;
    let t = d / 36_525.0;
    let (a0, d0, w) = match id {
        PLANET_SUN => (286.13, 63.87, 84.176 + 14.1844000 * d),
        PLANET_MERCURY => (
            281.0097 - 0.0328 * t,
            61.4143 - 0.0049 * t,
            329.5469 + 6.1385025 * d,
        ),
        PLANET_VENUS => (272.76, 67.16, 160.20 - 1.4813688 * d),
        PLANET_EARTH => (
            0.00 - 0.641 * t,
            90.00 - 0.557 * t,
            190.147 + 360.9856235 * d,
        ),
        PLANET_MARS => (
            317.68143 - 0.1061 * t,
            52.88650 - 0.0609 * t,
            176.630 + 350.89198226 * d,
        ),
        PLANET_JUPITER => (
            268.056595 - 0.006499 * t,
            64.495303 + 0.002413 * t,
            284.95 + 870.5360000 * d,
        ),
        PLANET_SATURN => (
            40.589 - 0.036 * t,
            83.537 - 0.004 * t,
            38.90 + 810.7939024 * d,
        ),
        PLANET_URANUS => (257.311, -15.175, 203.81 - 501.1600928 * d),
        PLANET_NEPTUNE => {
            let n = (357.85 + 52.316 * t).to_radians();
            (
                299.36 + 0.70 * n.sin(),
                43.46 - 0.51 * n.cos(),
                249.978 + 541.1397757 * d - 0.48 * n.sin(),
            )
        }
        PLANET_PLUTO => (132.993, -6.163, 302.695 + 56.3625225 * d),
        MOON_LUNA => {
            let e1 = (125.045 - 0.0529921 * d).to_radians();
            (
                269.9949 + 0.0031 * t - 3.8787 * e1.sin(),
                66.5392 + 0.0130 * t + 1.5419 * e1.cos(),
                38.3213 + 13.17635815 * d + 3.5610 * e1.sin(),
            )
        }
        _ => return None,
    };
    Some((
        a0.to_radians(),
        d0.to_radians(),
        w.to_radians().rem_euclid(core::f64::consts::TAU),
    ))
}

/// An artificial Earth satellite: the TLE record and its initialized
/// propagator, plus a standard magnitude at 1000 km range and half phase.
#[derive(Clone, Debug)]
pub struct Satellite {
    pub names: Vec<String>,
    pub id: Identifier,
    pub tle: Tle,
    pub propagator: Sgp4,
    /// McCants standard magnitude; infinite when unknown
    pub std_mag: f32,
}

impl Satellite {
    pub fn new(tle: Tle) -> EphemerisResult<Self> {
        let propagator = Sgp4::new(&tle)?;
        let id = Identifier::new(crate::ident::Catalog::NoradSatellite, i64::from(tle.norad));
        let names = if tle.name.is_empty() {
            Vec::new()
        } else {
            vec![tle.name.clone()]
        };
        Ok(Self {
            names,
            id,
            tle,
            propagator,
            std_mag: f32::INFINITY,
        })
    }

    /// Apparent direction, range (AU), and magnitude. Satellite vectors are
    /// geometric: light time is a few milliseconds and is skipped.
    pub fn apparent_place(
        &self,
        frame: &Coordinates,
        eph: &Ephemeris,
    ) -> EphemerisResult<ApparentPlace> {
        let (geo_pos, _) = eph.satellite_geocentric(&self.propagator, frame.jed)?;
        let (earth_pos, _) = eph.position_velocity(PLANET_EARTH, frame.jed)?;
        let helio = earth_pos + geo_pos;

        let toward = helio - frame.obs_pos;
        let distance = toward.norm();
        let mut direction = toward / distance;
        if frame.aberration {
            direction = frame.apply_aberration(direction);
        }

        let phase = phase_angle(&helio, &(-toward));
        let magnitude = self.apparent_magnitude(distance * AU_KM, phase);

        Ok(ApparentPlace {
            direction,
            distance,
            magnitude,
        })
    }

    /// McCants magnitude model: standard magnitude at 1000 km range and 50%
    /// illumination, scaled by range and illuminated fraction.
    pub fn apparent_magnitude(&self, range_km: f64, phase: f64) -> f64 {
        let std = f64::from(self.std_mag);
        if !std.is_finite() {
            return f64::INFINITY;
        }
        let illum = Planet::illumination(phase).max(1.0e-6);
        std + 5.0 * (range_km / 1_000.0).log10() - 2.5 * (illum / 0.5).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Catalog;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hg_magnitude_of_ceres_at_opposition() {
        let mut ceres = Planet::new(
            ObjectKind::Asteroid,
            Identifier::new(Catalog::AsteroidNumber, 1),
        );
        ceres.h_mag = 3.34;
        ceres.g_mag = 0.12;
        // Opposition geometry: r = 2.77, Δ = 1.77, phase 0.
        let m = ceres.apparent_magnitude(2.77, 1.77, 0.0);
        assert_abs_diff_eq!(m, 3.34 + 5.0 * (2.77_f64 * 1.77).log10(), epsilon = 1e-9);
        assert!((6.7..7.1).contains(&m));
    }

    #[test]
    fn phase_dims_an_asteroid() {
        let mut body = Planet::new(
            ObjectKind::Asteroid,
            Identifier::new(Catalog::AsteroidNumber, 4),
        );
        body.h_mag = 3.2;
        body.g_mag = 0.32;
        let full = body.apparent_magnitude(2.36, 1.4, 0.0);
        let gibbous = body.apparent_magnitude(2.36, 1.4, 20.0_f64.to_radians());
        assert!(gibbous > full + 0.3, "full {full}, at 20° {gibbous}");
    }

    #[test]
    fn comet_magnitude_brightens_steeply_with_sun_distance() {
        let mut comet = Planet::new(
            ObjectKind::Comet,
            Identifier::new(Catalog::CometNumber, 1),
        );
        comet.h_mag = 5.5;
        comet.g_mag = 4.0; // K
        let far = comet.apparent_magnitude(3.0, 3.0, 0.3);
        let near = comet.apparent_magnitude(1.0, 1.0, 0.3);
        assert_abs_diff_eq!(
            far - near,
            5.0 * 3.0_f64.log10() + 10.0 * 3.0_f64.log10(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn phase_angle_geometry() {
        // Body at 2 AU on x; observer sunward at 1 AU on x: opposition,
        // phase 0.
        let pos = Vector3::new(2.0, 0.0, 0.0);
        let toward_obs = Vector3::new(-1.0, 0.0, 0.0);
        assert_abs_diff_eq!(phase_angle(&pos, &toward_obs), 0.0, epsilon = 1e-12);
        // Observer at quadrature sees ~90° phase.
        let toward_quad = Vector3::new(-2.0, 1.0, 0.0);
        let alpha = phase_angle(&pos, &toward_quad);
        assert!(alpha.to_degrees() > 20.0 && alpha.to_degrees() < 90.0);
    }

    #[test]
    fn planetographic_matrix_is_a_rotation_with_the_right_pole() {
        let mars = Planet::new(ObjectKind::Planet, Identifier::new(Catalog::JplPlanet, 4));
        let m = mars.planetographic_matrix(JD_J2000);
        assert!(crate::math::rotation::is_valid_rotation(&m, 1e-9, 1e-9));
        // The body-frame pole maps to the IAU pole direction.
        let pole = m * Vector3::z();
        let (a0, d0, _) = rotation_elements(4, JD_J2000).unwrap();
        let expect = crate::math::spherical::Spherical::unit(a0, d0).to_vector();
        assert_abs_diff_eq!((pole - expect).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn earth_prime_meridian_tracks_sidereal_rotation() {
        let (_, _, w0) = rotation_elements(PLANET_EARTH, JD_J2000).unwrap();
        let (_, _, w1) = rotation_elements(PLANET_EARTH, JD_J2000 + 1.0).unwrap();
        let spin = (w1 - w0).rem_euclid(core::f64::consts::TAU);
        assert_abs_diff_eq!(spin.to_degrees(), 0.9856235, epsilon = 1e-6);
    }
}
