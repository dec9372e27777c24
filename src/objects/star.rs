/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Catalog stars and the apparent-place pipeline: proper motion, parallax,
//! light time, stellar aberration, and apparent magnitude.

use crate::constants::AU_PER_PARSEC;
use crate::frames::Coordinates;
use crate::ident::{Catalog, Identifier};
use crate::math::spherical::Spherical;
use crate::math::Vector3;
use crate::objects::ApparentPlace;
use crate::time::JD_J2000;
use serde_derive::{Deserialize, Serialize};

/// Light travel time for one parsec, Julian years.
const YEARS_PER_PARSEC: f64 = 3.261_563_777;

/// A catalog star in the fundamental J2000 frame.
///
/// When the parallax is positive, `position` is a heliocentric vector in
/// parsecs and `velocity` its rate in parsecs per Julian year. With unknown
/// parallax the position degrades to a unit direction and the velocity to
/// the transverse proper motion only. Unknown scalar quantities are stored
/// as infinity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Star {
    pub names: Vec<String>,
    pub idents: Vec<Identifier>,
    /// Heliocentric parallax, arcseconds; 0 when unknown
    pub parallax: f64,
    /// Radial velocity as a fraction of light speed; infinite when unknown
    pub radial_velocity: f64,
    /// Position, parsecs (or unit direction when parallax is unknown)
    pub position: Vector3,
    /// Velocity, parsecs per Julian year
    pub velocity: Vector3,
    /// Visual magnitude; infinite when unknown
    pub vmag: f32,
    /// Blue magnitude; infinite when unknown
    pub bmag: f32,
    /// Spectral type string, possibly empty
    pub spectrum: String,
}

impl Default for Star {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            idents: Vec::new(),
            parallax: 0.0,
            radial_velocity: f64::INFINITY,
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            vmag: f32::INFINITY,
            bmag: f32::INFINITY,
            spectrum: String::new(),
        }
    }
}

impl Star {
    /// Sets the star's J2000 spherical coordinates. `coords.rad` is the
    /// distance in parsecs and may be infinite when unknown.
    pub fn set_fundamental_coords(&mut self, coords: Spherical) {
        self.parallax = if coords.rad.is_infinite() {
            0.0
        } else {
            1.0 / coords.rad
        };
        let mut coords = coords;
        if self.parallax <= 0.0 || coords.rad.is_infinite() {
            coords.rad = 1.0;
        }
        self.position = coords.to_vector();
    }

    /// Sets coordinates and proper motion together. `motion.lon`/`motion.lat`
    /// are radians per Julian year, `motion.rad` is the radial velocity in
    /// parsecs per year (infinite when unknown).
    pub fn set_fundamental_motion(&mut self, coords: Spherical, motion: Spherical) {
        let mut coords = coords;
        let mut motion = motion;

        self.parallax = if coords.rad.is_infinite() {
            0.0
        } else {
            1.0 / coords.rad
        };
        self.radial_velocity = motion.rad * YEARS_PER_PARSEC;

        if self.parallax <= 0.0 {
            coords.rad = 1.0;
            motion.rad = 0.0;
        }
        if motion.rad.is_infinite() {
            motion.rad = 0.0;
        }

        self.position = coords.to_vector();
        self.velocity = coords.to_vector_velocity(&motion);
    }

    /// The star's J2000 spherical coordinates; distance in parsecs, infinite
    /// when the parallax is unknown.
    pub fn fundamental_coords(&self) -> Spherical {
        let mut coords = Spherical::from_vector(self.position);
        coords.rad = if self.parallax > 0.0 {
            1.0 / self.parallax
        } else {
            f64::INFINITY
        };
        coords
    }

    /// This star's identifier in a given catalog, or the null identifier.
    pub fn identifier(&self, catalog: Catalog) -> Identifier {
        self.idents
            .iter()
            .copied()
            .find(|id| id.catalog() == catalog)
            .unwrap_or(Identifier::NULL)
    }

    /// Computes the star's apparent direction, distance (parsecs), and
    /// magnitude for the observer instant described by the frame bundle.
    ///
    /// Steps run in order, each gated by the bundle's policy flags; missing
    /// data collapses each step to the identity.
    pub fn apparent_place(&self, frame: &Coordinates) -> ApparentPlace {
        let years = (frame.jed - JD_J2000) / 365.25;

        // Proper motion.
        let mut p = if frame.star_motion {
            self.position + self.velocity * years
        } else {
            self.position
        };

        let mut distance_pc = f64::INFINITY;
        if self.parallax > 0.0 {
            // Heliocentric parallax: shift by the observer's displacement
            // from the barycenter, in parsecs.
            if frame.star_parallax {
                p -= frame.obs_pos / AU_PER_PARSEC;
            }
            // Light time: we see the star where it was |p|/c ago.
            if frame.lighttime {
                let tau_years = p.norm() * YEARS_PER_PARSEC;
                p -= self.velocity * tau_years;
            }
            distance_pc = p.norm();
        }

        let mut direction = p.normalize();
        if frame.aberration {
            direction = frame.apply_aberration(direction);
        }

        let magnitude = self.apparent_magnitude(distance_pc);

        ApparentPlace {
            direction,
            distance: distance_pc,
            magnitude,
        }
    }

    /// Apparent magnitude at a distance in parsecs: the catalog visual
    /// magnitude corrected by the distance modulus against the catalog
    /// distance. Unknown data yields the catalog magnitude unchanged.
    fn apparent_magnitude(&self, distance_pc: f64) -> f64 {
        let v = f64::from(self.vmag);
        if self.parallax > 0.0 && distance_pc.is_finite() && distance_pc > 0.0 {
            v + 5.0 * (distance_pc * self.parallax).log10()
        } else {
            v
        }
    }
}

/// Double-star measures: component letters, separation, position angle, and
/// the epoch of the measurement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoubleStar {
    pub star: Star,
    /// Component letters ("AB", "AC", …)
    pub components: String,
    /// Magnitude difference between components; infinite when unknown
    pub mag_delta: f64,
    /// Separation, radians; infinite when unknown
    pub separation: f64,
    /// Position angle, radians; infinite when unknown
    pub position_angle: f64,
    /// Epoch of the separation/PA measure, Julian year; infinite when unknown
    pub pa_year: f64,
}

/// Variability record: type string, period, epoch, and the magnitude range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableStar {
    pub star: Star,
    /// GCVS variability type ("M", "EA", "SRB", …)
    pub var_type: String,
    /// Magnitude at minimum brightness (numerically largest)
    pub min_mag: f64,
    /// Magnitude at maximum brightness (numerically smallest)
    pub max_mag: f64,
    /// Period, days; infinite when unknown
    pub period: f64,
    /// Epoch of maximum, Julian Date; infinite when unknown
    pub epoch: f64,
}

/// Folds the variability phase into a magnitude: the star is at maximum at
/// its epoch and dims by the full amplitude half a period later. For
/// eclipsing binaries the sinusoid is a first approximation only.
fn fold_variable_phase(
    magnitude: f64,
    min_mag: f64,
    max_mag: f64,
    period: f64,
    epoch: f64,
    jed: f64,
) -> f64 {
    if !(period.is_finite() && epoch.is_finite() && period > 0.0) {
        return magnitude;
    }
    let amplitude = min_mag - max_mag;
    if !amplitude.is_finite() {
        return magnitude;
    }
    let phase = (jed - epoch) / period;
    magnitude + amplitude * (0.5 - 0.5 * (core::f64::consts::TAU * phase).cos())
}

impl VariableStar {
    /// Apparent place with the variability phase folded into the magnitude.
    pub fn apparent_place(&self, frame: &Coordinates) -> ApparentPlace {
        let mut place = self.star.apparent_place(frame);
        place.magnitude = fold_variable_phase(
            place.magnitude,
            self.min_mag,
            self.max_mag,
            self.period,
            self.epoch,
            frame.jed,
        );
        place
    }
}

/// A double star one or both of whose components vary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoubleVariableStar {
    pub double: DoubleStar,
    pub var_type: String,
    pub min_mag: f64,
    pub max_mag: f64,
    pub period: f64,
    pub epoch: f64,
}

impl DoubleVariableStar {
    pub fn apparent_place(&self, frame: &Coordinates) -> ApparentPlace {
        let mut place = self.double.star.apparent_place(frame);
        place.magnitude = fold_variable_phase(
            place.magnitude,
            self.min_mag,
            self.max_mag,
            self.period,
            self.epoch,
            frame.jed,
        );
        place
    }
}

/// Deep-sky objects share the star record plus an angular extent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeepSky {
    pub star: Star,
    /// Major axis, radians; infinite when unknown
    pub major_axis: f64,
    /// Minor axis, radians; infinite when unknown
    pub minor_axis: f64,
    /// Position angle of the major axis, radians; infinite when unknown
    pub position_angle: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angle::Angle;
    use approx::assert_abs_diff_eq;

    fn sirius() -> Star {
        let mut star = Star {
            vmag: -1.46,
            spectrum: "A1V".into(),
            ..Default::default()
        };
        // ICRS J2000: 06h 45m 08.92s, −16° 42′ 58.0″, parallax 0.379″,
        // pm RA −0.5460″/yr, pm Dec −1.2231″/yr.
        let coords = Spherical::new(
            Angle::from_hours(6.0 + 45.0 / 60.0 + 8.92 / 3600.0),
            Angle::from_degrees(-(16.0 + 42.0 / 60.0 + 58.0 / 3600.0)),
            1.0 / 0.379,
        );
        let motion = Spherical::new(
            Angle::from_arcsec(-0.5460 / (16.716_f64).to_radians().cos()),
            Angle::from_arcsec(-1.2231),
            0.0,
        );
        star.set_fundamental_motion(coords, motion);
        star
    }

    #[test]
    fn position_round_trips_through_spherical() {
        let star = sirius();
        let coords = star.fundamental_coords();
        assert_abs_diff_eq!(coords.lon.to_hours(), 6.752_478, epsilon = 1e-4);
        assert_abs_diff_eq!(coords.lat.to_degrees(), -16.716, epsilon = 1e-3);
        assert_abs_diff_eq!(coords.rad, 1.0 / 0.379, epsilon = 1e-9);
    }

    #[test]
    fn unknown_parallax_star_keeps_unit_position_and_catalog_magnitude() {
        let mut star = Star {
            vmag: 5.0,
            ..Default::default()
        };
        star.set_fundamental_coords(Spherical::new(
            Angle::from_hours(12.0),
            Angle::from_degrees(30.0),
            f64::INFINITY,
        ));
        assert_abs_diff_eq!(star.position.norm(), 1.0, epsilon = 1e-12);

        let frame = Coordinates::new(JD_J2000 + 5_000.0, 0.0, 0.5, 0.0);
        let place = star.apparent_place(&frame);
        assert!(place.distance.is_infinite());
        assert_abs_diff_eq!(place.magnitude, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(place.direction.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn proper_motion_moves_the_star_between_epochs() {
        let star = sirius();
        let mut frame_now = Coordinates::new(JD_J2000, 0.0, 0.0, 0.0);
        frame_now.aberration = false;
        frame_now.star_parallax = false;
        let mut frame_later = Coordinates::new(JD_J2000 + 50.0 * 365.25, 0.0, 0.0, 0.0);
        frame_later.aberration = false;
        frame_later.star_parallax = false;

        let now = star.apparent_place(&frame_now);
        let later = star.apparent_place(&frame_later);
        let drift = crate::math::angular_separation(&now.direction, &later.direction);
        // Sirius moves ~1.34″/yr of total proper motion: ~67″ in 50 years.
        let drift_arcsec = Angle::from_radians(drift).to_arcsec();
        assert!(
            (40.0..90.0).contains(&drift_arcsec),
            "drift {drift_arcsec} arcsec"
        );
    }

    #[test]
    fn parallax_shifts_by_under_an_arcsecond_for_sirius() {
        let star = sirius();
        let mut with = Coordinates::new(JD_J2000 + 100.0, 0.0, 0.0, 0.0);
        with.aberration = false;
        with.star_motion = false;
        with.lighttime = false;
        let mut without = with.clone();
        without.star_parallax = false;

        let a = star.apparent_place(&with);
        let b = star.apparent_place(&without);
        let shift = Angle::from_radians(crate::math::angular_separation(
            &a.direction,
            &b.direction,
        ))
        .to_arcsec();
        assert!(shift > 0.05 && shift < 0.8, "parallax shift {shift}″");
    }

    #[test]
    fn magnitude_follows_the_distance_modulus() {
        let mut star = Star {
            vmag: 3.0,
            ..Default::default()
        };
        // 10 pc catalog distance.
        star.set_fundamental_coords(Spherical::new(
            Angle::from_hours(1.0),
            Angle::from_degrees(5.0),
            10.0,
        ));
        // Seen from twice the distance the star is 5·log10(2) ≈ 1.5 mag fainter.
        assert_abs_diff_eq!(
            star.apparent_magnitude(20.0),
            3.0 + 5.0 * 2.0_f64.log10(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn variable_star_is_brightest_at_epoch_and_faintest_at_half_period() {
        let mut star = sirius();
        star.vmag = 4.0;
        let var = VariableStar {
            star,
            var_type: "M".into(),
            min_mag: 9.0,
            max_mag: 4.0,
            period: 100.0,
            epoch: JD_J2000,
        };
        let at_epoch = var.apparent_place(&Coordinates::new(JD_J2000, 0.0, 0.0, 0.0));
        let at_half = var.apparent_place(&Coordinates::new(JD_J2000 + 50.0, 0.0, 0.0, 0.0));
        assert!(at_half.magnitude - at_epoch.magnitude > 4.9);
    }
}
