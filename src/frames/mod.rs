/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The coordinate-frame engine: a consistent web of rotations between the
//! J2000 mean equatorial (fundamental) frame and the true equatorial,
//! ecliptic, local horizon, and galactic frames, with aberration, refraction,
//! and geodetic conversions.
//!
//! A [`Coordinates`] bundle is cheap to construct; build one per observer
//! instant and never share it mutably.

pub mod refraction;

use crate::constants::{AU_KM, EARTH_FLATTENING, EARTH_RADIUS_KM, LIGHT_AU_PER_DAY};
use crate::math::angle::Angle;
use crate::math::spherical::Spherical;
use crate::math::{r1, r2, r3, Matrix3, Vector3};
use crate::time::{Time, JD_J2000};
use core::f64::consts::{FRAC_PI_2, PI};

/// Precession constants `(ζ, z, θ)` in radians for the epoch `jd`, from the
/// IAU 1976 polynomials (Meeus, "Astronomical Algorithms", ch. 21).
pub fn precession_constants(jd: f64) -> (f64, f64, f64) {
    let t = (jd - JD_J2000) / 36_525.0;
    let t2 = t * t;
    let t3 = t * t2;

    let zeta = Angle::from_arcsec(2306.2181 * t + 0.30188 * t2 + 0.017998 * t3);
    let z = Angle::from_arcsec(2306.2181 * t + 1.09468 * t2 + 0.018203 * t3);
    let theta = Angle::from_arcsec(2004.3109 * t - 0.42665 * t2 - 0.041833 * t3);
    (zeta.as_radians(), z.as_radians(), theta.as_radians())
}

/// Nutation in longitude and obliquity `(Δψ, Δε)` in radians for the epoch
/// `jd`, from the four principal terms (Meeus ch. 22). Accuracy is better
/// than an arcsecond across 1600–2200 and degrades continuously outside.
pub fn nutation_constants(jd: f64) -> (f64, f64) {
    let t = (jd - JD_J2000) / 36_525.0;
    let n = Angle::from_degrees(125.0445 - 1934.1363 * t).mod_2pi().as_radians();
    let l = Angle::from_degrees(280.4665 + 36_000.7698 * t).mod_2pi().as_radians() * 2.0;
    let l1 = Angle::from_degrees(218.3165 + 481_267.8813 * t).mod_2pi().as_radians() * 2.0;

    let (sn, cn) = n.sin_cos();
    let s2n = 2.0 * sn * cn;
    let c2n = cn * cn - sn * sn;
    let (s2l, c2l) = l.sin_cos();
    let (s2l1, c2l1) = l1.sin_cos();

    let dl = Angle::from_arcsec(-17.20 * sn - 1.32 * s2l - 0.23 * s2l1 + 0.21 * s2n);
    let de = Angle::from_arcsec(9.20 * cn + 0.57 * c2l + 0.10 * c2l1 - 0.09 * c2n);
    (dl.as_radians(), de.as_radians())
}

/// Mean obliquity of the ecliptic in radians at the epoch `jd`, cubic fit
/// valid 1600–2100. Does not include nutation.
pub fn obliquity(jd: f64) -> f64 {
    let t = (jd - JD_J2000) / 36_525.0;
    let e = 23.439291 + t * (-0.0130042 + t * (-0.000_000_16 + t * 0.000_000_504));
    e.to_radians()
}

/// Rotation from the fundamental J2000 mean equatorial frame to the mean
/// equatorial frame of the epoch `jd`. Does not include nutation.
pub fn precession_matrix(jd: f64) -> Matrix3 {
    let (zeta, z, theta) = precession_constants(jd);
    r3(-z) * r2(theta) * r3(-zeta)
}

/// Rotation correcting mean equatorial coordinates for nutation (mean → true
/// equatorial of date).
pub fn nutation_matrix(obq: f64, nut_lon: f64, nut_obq: f64) -> Matrix3 {
    r1(-obq - nut_obq) * r3(-nut_lon) * r1(obq)
}

/// Rotation from the equatorial to the ecliptic frame for the given
/// obliquity; pass a negative obliquity for the inverse.
pub fn ecliptic_matrix(obliquity: f64) -> Matrix3 {
    r1(obliquity)
}

/// Rotation from the true equatorial frame of date to the local horizon
/// frame, given the local apparent sidereal time and latitude in radians.
///
/// The middle row is negated because horizon coordinates are left-handed
/// (azimuth runs from north through east).
pub fn horizon_matrix(lst: f64, lat: f64) -> Matrix3 {
    let mut m = r2(lat - FRAC_PI_2) * r3(PI + lst);
    m.set_row(1, &(-m.row(1)));
    m
}

/// Rotation from the fundamental J2000 mean equatorial frame to the galactic
/// frame. Constants from Liu et al. 2011, "Reconsidering the Galactic
/// Coordinate System", A&A 526 A16.
pub fn galactic_matrix() -> Matrix3 {
    Matrix3::new(
        -0.054875539390, -0.873437104725, -0.483834991775,
        0.494109453633, -0.444829594298, 0.746982248696,
        -0.867666135681, -0.198076389622, 0.455983794523,
    )
}

/// Converts geodetic longitude, latitude, and altitude to a geocentric
/// rectangular vector. `geodetic.rad` is the altitude above the ellipsoid in
/// the same units as the equatorial radius `a`; `f` is the flattening
/// `(a − b)/a`. Formula from the Astronomical Almanac (1990), pp. K11–K13.
pub fn to_geocentric(geodetic: Spherical, a: f64, f: f64) -> Vector3 {
    let (sp, cp) = geodetic.lat.as_radians().sin_cos();
    let f2 = (1.0 - f) * (1.0 - f);
    let c = 1.0 / (cp * cp + f2 * sp * sp).sqrt();
    let s = f2 * c;

    let (slon, clon) = geodetic.lon.as_radians().sin_cos();
    Vector3::new(
        (a * c + geodetic.rad) * cp * clon,
        (a * c + geodetic.rad) * cp * slon,
        (a * s + geodetic.rad) * sp,
    )
}

/// Converts a geocentric rectangular vector to geodetic longitude, latitude,
/// and altitude by iterative recovery of the geodetic latitude. Inverse of
/// [`to_geocentric`] everywhere except exactly at the poles.
pub fn to_geodetic(geocentric: Vector3, a: f64, f: f64) -> Spherical {
    let (x, y, z) = (geocentric.x, geocentric.y, geocentric.z);
    let r = (x * x + y * y).sqrt();
    let e2 = 2.0 * f - f * f;
    let lon = Angle::atan2_2pi(y, x);

    let mut lat = z.atan2(r);
    let mut c = 1.0 / (1.0 - f);
    if r > 0.0 {
        loop {
            let lat1 = lat;
            let s = lat1.sin();
            c = 1.0 / (1.0 - e2 * s * s).sqrt();
            lat = ((z + a * c * e2 * s) / r).atan();
            if (lat1 - lat).abs() <= 1.0e-8 {
                break;
            }
        }
    } else {
        lat = if z == 0.0 {
            0.0
        } else if z > 0.0 {
            FRAC_PI_2
        } else {
            -FRAC_PI_2
        };
    }

    let h = r / lat.cos() - a * c;
    Spherical::new(Angle::from_radians(lon), Angle::from_radians(lat), h)
}

/// Converts a red shift to a radial velocity as a fraction of light speed,
/// using the relativistic formula. Red shifts above 1 map below 1.
pub fn redshift_to_radial_velocity(z: f64) -> f64 {
    let z12 = (z + 1.0) * (z + 1.0);
    (z12 - 1.0) / (z12 + 1.0)
}

/// Converts a radial velocity (fraction of light speed, magnitude below 1)
/// to the equivalent red shift.
pub fn radial_velocity_to_redshift(rv: f64) -> f64 {
    ((1.0 + rv) / (1.0 - rv)).sqrt() - 1.0
}

/// A frame bundle for one observer instant: every rotation out of the
/// fundamental frame, the observer's heliocentric state, and the policy
/// flags that control which apparent-place corrections are applied.
#[derive(Clone, Debug)]
pub struct Coordinates {
    /// Julian Date (UTC) of this bundle
    pub epoch: f64,
    /// Julian Ephemeris Date of this bundle
    pub jed: f64,
    /// Observer east longitude, radians
    pub lon: f64,
    /// Observer geodetic latitude, radians
    pub lat: f64,
    /// Observer altitude above the ellipsoid, km
    pub alt: f64,

    /// Mean obliquity of the ecliptic, radians
    pub obq: f64,
    /// Nutation in longitude, radians
    pub nut_lon: f64,
    /// Nutation in obliquity, radians
    pub nut_obq: f64,
    /// Local apparent sidereal time, radians
    pub lst: f64,

    /// J2000 mean equatorial → mean equatorial of date
    pub pre_mat: Matrix3,
    /// Mean equatorial of date → true equatorial of date
    pub nut_mat: Matrix3,
    /// J2000 mean equatorial → true equatorial of date
    pub equ_mat: Matrix3,
    /// J2000 mean equatorial → ecliptic of date
    pub ecl_mat: Matrix3,
    /// J2000 mean equatorial → local horizon
    pub hor_mat: Matrix3,
    /// J2000 mean equatorial → galactic
    pub gal_mat: Matrix3,

    /// Observer heliocentric position, AU, fundamental frame
    pub obs_pos: Vector3,
    /// Observer heliocentric velocity, AU/day, fundamental frame
    pub obs_vel: Vector3,

    /// Apply heliocentric parallax to star positions
    pub star_parallax: bool,
    /// Apply proper motion to star positions
    pub star_motion: bool,
    /// Apply aberration of light
    pub aberration: bool,
    /// Apply light-time correction
    pub lighttime: bool,
}

impl Coordinates {
    /// Builds the frame bundle for a Julian Date, east longitude and geodetic
    /// latitude in radians, and altitude in kilometers above the ellipsoid.
    pub fn new(jd: f64, lon: f64, lat: f64, alt: f64) -> Self {
        let time = Time::from_julian_date(jd);
        let jed = time.julian_ephemeris_date();

        let (nut_lon, nut_obq) = nutation_constants(jd);
        let obq = obliquity(jd);
        let lst = time.sidereal_time(lon + nut_lon * (obq + nut_obq).cos());

        let pre_mat = precession_matrix(jd);
        let nut_mat = nutation_matrix(obq, nut_lon, nut_obq);
        let equ_mat = nut_mat * pre_mat;
        let ecl_mat = ecliptic_matrix(obq + nut_obq) * equ_mat;
        let hor_mat = horizon_matrix(lst, lat) * equ_mat;
        let gal_mat = galactic_matrix();

        let (earth_pos, earth_vel) = crate::ephemeris::earth_heliocentric(jed);

        // The observer's displacement from the geocenter, rotated from the
        // true equatorial frame of date back to the fundamental frame.
        let geodetic = Spherical::new(
            Angle::from_radians(lst),
            Angle::from_radians(lat),
            alt,
        );
        let geocentric = to_geocentric(geodetic, EARTH_RADIUS_KM, EARTH_FLATTENING);
        let geocentric_fun = equ_mat.transpose() * geocentric;
        let obs_pos = earth_pos + geocentric_fun / AU_KM;

        Self {
            epoch: jd,
            jed,
            lon,
            lat,
            alt,
            obq,
            nut_lon,
            nut_obq,
            lst,
            pre_mat,
            nut_mat,
            equ_mat,
            ecl_mat,
            hor_mat,
            gal_mat,
            obs_pos,
            obs_vel: earth_vel,
            star_parallax: true,
            star_motion: true,
            aberration: true,
            lighttime: true,
        }
    }

    pub fn from_time(time: &Time, lon: f64, lat: f64, alt: f64) -> Self {
        Self::new(time.jd, lon, lat, alt)
    }

    pub fn time(&self) -> Time {
        Time::from_julian_date(self.epoch)
    }

    pub fn location(&self) -> Spherical {
        Spherical::new(
            Angle::from_radians(self.lon),
            Angle::from_radians(self.lat),
            self.alt,
        )
    }

    // Fundamental-frame vectors into the derived frames and back.

    pub fn to_equatorial(&self, fun: Vector3) -> Vector3 {
        self.equ_mat * fun
    }

    pub fn to_ecliptic(&self, fun: Vector3) -> Vector3 {
        self.ecl_mat * fun
    }

    pub fn to_horizon(&self, fun: Vector3) -> Vector3 {
        self.hor_mat * fun
    }

    pub fn to_galactic(&self, fun: Vector3) -> Vector3 {
        self.gal_mat * fun
    }

    pub fn from_equatorial(&self, equ: Vector3) -> Vector3 {
        self.equ_mat.transpose() * equ
    }

    pub fn from_ecliptic(&self, ecl: Vector3) -> Vector3 {
        self.ecl_mat.transpose() * ecl
    }

    pub fn from_horizon(&self, hor: Vector3) -> Vector3 {
        self.hor_mat.transpose() * hor
    }

    pub fn from_galactic(&self, gal: Vector3) -> Vector3 {
        self.gal_mat.transpose() * gal
    }

    pub fn to_equatorial_spherical(&self, fun: Spherical) -> Spherical {
        Spherical::from_vector(self.to_equatorial(fun.to_vector()))
    }

    pub fn to_horizon_spherical(&self, fun: Spherical) -> Spherical {
        Spherical::from_vector(self.to_horizon(fun.to_vector()))
    }

    pub fn from_equatorial_spherical(&self, equ: Spherical) -> Spherical {
        Spherical::from_vector(self.from_equatorial(equ.to_vector()))
    }

    pub fn from_horizon_spherical(&self, hor: Spherical) -> Spherical {
        Spherical::from_vector(self.from_horizon(hor.to_vector()))
    }

    /// Applies aberration of light to an apparent unit direction in the
    /// fundamental frame, using the relativistic formula from the Explanatory
    /// Supplement to the Astronomical Almanac, p. 129.
    pub fn apply_aberration(&self, p: Vector3) -> Vector3 {
        let v = self.obs_vel / LIGHT_AU_PER_DAY;
        let beta = (1.0 - v.dot(&v)).sqrt();
        let dot = v.dot(&p);
        let s = 1.0 + dot / (1.0 + beta);
        let n = 1.0 + dot;
        (p * beta + v * s) / n
    }

    /// Removes aberration from an apparent unit direction. First-order,
    /// non-relativistic; adequate because aberration never exceeds about
    /// 20 arcseconds.
    pub fn remove_aberration(&self, p: Vector3) -> Vector3 {
        (p - self.obs_vel / LIGHT_AU_PER_DAY).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn precession_at_j2000_is_identity() {
        let p = precession_matrix(JD_J2000);
        assert_abs_diff_eq!((p - Matrix3::identity()).norm(), 0.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(JD_J2000 + 20.0 * 365.25)]
    #[case(JD_J2000 - 125.0 * 365.25)]
    #[case(crate::time::JD_B1875)]
    fn precession_is_orthogonal_with_unit_determinant(#[case] jd: f64) {
        let p = precession_matrix(jd);
        assert!(crate::math::rotation::is_valid_rotation(&p, 1e-12, 1e-12));
        let round = p.transpose() * p;
        assert_abs_diff_eq!((round - Matrix3::identity()).norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn precession_carries_the_equinox_forward_in_ra() {
        // One century of general precession moves the J2000 equinox point by
        // ζ + z ≈ 4612.4″ in RA and +θ-ish in declination.
        let jd = JD_J2000 + 36_525.0;
        let p = precession_matrix(jd);
        let v = p * Vector3::x();
        let s = Spherical::from_vector(v);
        let ra_arcsec = s.lon.to_arcsec();
        assert_abs_diff_eq!(ra_arcsec, 4612.4, epsilon = 10.0);
        assert!(s.lat.as_radians() > 0.0, "equinox precesses north in RA 0");
    }

    #[test]
    fn obliquity_at_j2000_matches_iau_value() {
        let e = obliquity(JD_J2000);
        assert_abs_diff_eq!(e.to_degrees(), 23.439291, epsilon = 1e-6);
    }

    #[test]
    fn nutation_magnitudes_are_physical() {
        for years in [-50, -10, 0, 7, 30] {
            let jd = JD_J2000 + f64::from(years) * 365.25;
            let (dl, de) = nutation_constants(jd);
            assert!(dl.abs() < Angle::from_arcsec(20.0).as_radians());
            assert!(de.abs() < Angle::from_arcsec(11.0).as_radians());
        }
    }

    #[test]
    fn horizon_matrix_puts_meridian_star_due_south() {
        // Observer at +30° latitude, LST = 1 rad; a star on the celestial
        // equator crossing the meridian stands at altitude 60°, azimuth 180°.
        let m = horizon_matrix(1.0, 30.0_f64.to_radians());
        let star = Spherical::unit(1.0, 0.0).to_vector();
        let hor = Spherical::from_vector(m * star);
        assert_abs_diff_eq!(hor.lat.to_degrees(), 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hor.lon.to_degrees(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn horizon_matrix_is_left_handed_east_positive() {
        // A star an hour east of the meridian rises in the east: azimuth 90°.
        let m = horizon_matrix(0.0, 0.0);
        let star = Spherical::unit(15.0_f64.to_radians(), 0.0).to_vector();
        let hor = Spherical::from_vector(m * star);
        assert_abs_diff_eq!(hor.lon.to_degrees(), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hor.lat.to_degrees(), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn galactic_matrix_is_a_rotation() {
        assert!(crate::math::rotation::is_valid_rotation(
            &galactic_matrix(),
            1e-9,
            1e-9
        ));
    }

    #[test]
    fn galactic_pole_maps_to_lat_90() {
        // J2000 north galactic pole: RA 12h 51.4m, Dec +27.13°.
        let ngp = Spherical::unit(
            Angle::from_hours(12.0 + 51.4 / 60.0).as_radians(),
            Angle::from_degrees(27.13).as_radians(),
        )
        .to_vector();
        let gal = Spherical::from_vector(galactic_matrix() * ngp);
        assert!(gal.lat.to_degrees() > 89.9);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(2.1, 0.7, 1.2)]
    #[case(4.0, -1.3, 0.0)]
    #[case(1.0, 1.5, 2.5)]
    fn geodetic_geocentric_round_trip(#[case] lon: f64, #[case] lat: f64, #[case] alt: f64) {
        let geodetic = Spherical::new(
            Angle::from_radians(lon),
            Angle::from_radians(lat),
            alt,
        );
        let v = to_geocentric(geodetic, EARTH_RADIUS_KM, EARTH_FLATTENING);
        let back = to_geodetic(v, EARTH_RADIUS_KM, EARTH_FLATTENING);
        assert_abs_diff_eq!(back.lon.as_radians(), lon.rem_euclid(core::f64::consts::TAU), epsilon = 1e-9);
        assert_abs_diff_eq!(back.lat.as_radians(), lat, epsilon = 1e-8);
        assert_abs_diff_eq!(back.rad, alt, epsilon = 1e-4);
    }

    #[test]
    fn aberration_round_trip_recovers_direction() {
        let coords = Coordinates::new(JD_J2000 + 7_000.0, -2.13, 0.66, 0.0);
        let p = Spherical::unit(1.1, 0.35).to_vector();
        let aberrated = coords.apply_aberration(p);
        // Aberration shifts by at most ~20.5 arcsec.
        let shift = crate::math::angular_separation(&p, &aberrated);
        assert!(shift < Angle::from_arcsec(21.0).as_radians());
        let back = coords.remove_aberration(aberrated);
        let residual = crate::math::angular_separation(&p, &back);
        assert!(residual < 1e-9, "residual {residual}");
    }

    #[test]
    fn redshift_radial_velocity_round_trip() {
        for z in [0.0, 0.1, 1.0, 3.5] {
            let rv = redshift_to_radial_velocity(z);
            assert!(rv < 1.0);
            assert_abs_diff_eq!(radial_velocity_to_redshift(rv), z, epsilon = 1e-12);
        }
    }

    #[test]
    fn observer_position_is_about_one_au_from_sun() {
        let coords = Coordinates::new(JD_J2000 + 3_456.0, -0.5, 0.9, 0.1);
        let r = coords.obs_pos.norm();
        assert!((0.975..1.025).contains(&r), "observer at {r} AU");
        // Orbital velocity about 0.017 AU/day.
        let v = coords.obs_vel.norm();
        assert!((0.015..0.019).contains(&v), "observer velocity {v} AU/day");
    }

    #[test]
    fn equatorial_round_trip_through_bundle() {
        let coords = Coordinates::new(JD_J2000 + 10_000.0, 0.3, -0.7, 0.0);
        let fun = Spherical::unit(2.2, -0.4).to_vector();
        let equ = coords.to_equatorial(fun);
        let back = coords.from_equatorial(equ);
        assert_abs_diff_eq!((fun - back).norm(), 0.0, epsilon = 1e-13);
    }
}
