/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Vector3;
use crate::math::angle::Angle;
use serde_derive::{Deserialize, Serialize};

/// Spherical coordinates: longitude and latitude in radians plus a radial
/// distance. `rad = 1` denotes a unit direction.
///
/// Round-tripping `Vector3 ↔ Spherical` with unit radius preserves the
/// direction to double precision, except at the poles where the longitude is
/// undefined and any value is acceptable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    /// Longitude-like angle (RA, azimuth, ecliptic longitude), radians
    pub lon: Angle,
    /// Latitude-like angle (Dec, altitude, ecliptic latitude), radians
    pub lat: Angle,
    /// Radial distance; unit-free, 1.0 for pure directions
    pub rad: f64,
}

impl Spherical {
    pub fn new(lon: Angle, lat: Angle, rad: f64) -> Self {
        Self { lon, lat, rad }
    }

    /// A unit direction from longitude and latitude in radians.
    pub fn unit(lon: f64, lat: f64) -> Self {
        Self {
            lon: Angle::from_radians(lon),
            lat: Angle::from_radians(lat),
            rad: 1.0,
        }
    }

    pub fn from_vector(v: Vector3) -> Self {
        let rad = v.norm();
        if rad == 0.0 {
            return Self::default();
        }
        Self {
            lon: Angle::from_radians(Angle::atan2_2pi(v.y, v.x)),
            lat: Angle::from_radians((v.z / rad).asin()),
            rad,
        }
    }

    pub fn to_vector(&self) -> Vector3 {
        let (slat, clat) = self.lat.as_radians().sin_cos();
        let (slon, clon) = self.lon.as_radians().sin_cos();
        Vector3::new(
            self.rad * clat * clon,
            self.rad * clat * slon,
            self.rad * slat,
        )
    }

    /// Converts an angular motion (`lon` and `lat` in radians per unit time,
    /// `rad` in distance per unit time) at this position into a rectangular
    /// velocity vector.
    pub fn to_vector_velocity(&self, motion: &Spherical) -> Vector3 {
        let (slat, clat) = self.lat.as_radians().sin_cos();
        let (slon, clon) = self.lon.as_radians().sin_cos();
        let r = self.rad;
        let dlon = motion.lon.as_radians();
        let dlat = motion.lat.as_radians();
        let drad = motion.rad;

        Vector3::new(
            drad * clat * clon - r * dlat * slat * clon - r * dlon * clat * slon,
            drad * clat * slon - r * dlat * slat * slon + r * dlon * clat * clon,
            drad * slat + r * dlat * clat,
        )
    }

    /// Decomposes a rectangular velocity at this position into angular motion:
    /// `lon`/`lat` rates in radians per unit time, `rad` rate in distance per
    /// unit time.
    pub fn vector_velocity_to_motion(&self, vel: &Vector3) -> Spherical {
        let pos = self.to_vector();
        let r = self.rad;
        let rxy2 = pos.x * pos.x + pos.y * pos.y;
        let drad = pos.dot(vel) / r;
        let dlon = if rxy2 > 0.0 {
            (pos.x * vel.y - pos.y * vel.x) / rxy2
        } else {
            0.0
        };
        let dlat = if rxy2 > 0.0 {
            (vel.z * rxy2.sqrt() - pos.z * (pos.x * vel.x + pos.y * vel.y) / rxy2.sqrt())
                / (r * r)
        } else {
            0.0
        };
        Spherical {
            lon: Angle::from_radians(dlon),
            lat: Angle::from_radians(dlat),
            rad: drad,
        }
    }
}

impl From<Vector3> for Spherical {
    fn from(v: Vector3) -> Self {
        Self::from_vector(v)
    }
}

impl From<Spherical> for Vector3 {
    fn from(s: Spherical) -> Self {
        s.to_vector()
    }
}
