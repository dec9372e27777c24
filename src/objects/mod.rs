/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Celestial objects as a tagged variant: stars, deep-sky objects,
//! solar-system bodies, constellations, and surface annotations.
//!
//! Objects are immutable value records; the apparent place is computed per
//! observer epoch and returned, never cached inside the object, so records
//! are freely shared between threads.

pub mod planet;
pub mod star;

use crate::ephemeris::Ephemeris;
use crate::errors::EphemerisResult;
use crate::frames::Coordinates;
use crate::ident::Identifier;
use crate::math::spherical::Spherical;
use crate::math::Vector3;
use crate::orbit::Orbit;
use serde_derive::{Deserialize, Serialize};

pub use planet::{Planet, Satellite};
pub use star::{DeepSky, DoubleStar, DoubleVariableStar, Star, VariableStar};

/// Object type tags. Parsing bare numeric identifiers needs the kind as a
/// disambiguation hint, so this enum lives at the root of the object model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Star,
    DoubleStar,
    VariableStar,
    DoubleVariableStar,
    DeepSky,
    Planet,
    Moon,
    Asteroid,
    Comet,
    Satellite,
    Constellation,
    Feature,
    City,
}

/// The unified output of the computational core: where an object appears,
/// how far it is, and how bright it looks, for one observer instant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ApparentPlace {
    /// Apparent unit direction in the fundamental frame
    pub direction: Vector3,
    /// Distance: parsecs for stars, AU for solar-system bodies; infinite
    /// when unknown
    pub distance: f64,
    /// Apparent visual magnitude; infinite when unknown
    pub magnitude: f64,
}

/// A surface-located annotation (crater, mare, landing site) on a body, or
/// a city on Earth. Carried for completeness; not part of the computational
/// core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feature {
    pub kind: ObjectKind,
    pub names: Vec<String>,
    /// Planetographic longitude and latitude, radians; elevation km
    pub location: Spherical,
}

/// Any celestial object, dispatched by pattern matching rather than
/// downcasts.
#[derive(Clone, Debug)]
pub enum CelestialObject {
    Star(Star),
    DoubleStar(DoubleStar),
    VariableStar(VariableStar),
    DoubleVariableStar(DoubleVariableStar),
    DeepSky(DeepSky),
    SolarSystem(Planet),
    Satellite(Satellite),
    Constellation(crate::constellation::Constellation),
    Feature(Feature),
}

impl CelestialObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Star(_) => ObjectKind::Star,
            Self::DoubleStar(_) => ObjectKind::DoubleStar,
            Self::VariableStar(_) => ObjectKind::VariableStar,
            Self::DoubleVariableStar(_) => ObjectKind::DoubleVariableStar,
            Self::DeepSky(_) => ObjectKind::DeepSky,
            Self::SolarSystem(p) => p.kind,
            Self::Satellite(_) => ObjectKind::Satellite,
            Self::Constellation(_) => ObjectKind::Constellation,
            Self::Feature(f) => f.kind,
        }
    }

    pub fn names(&self) -> &[String] {
        match self {
            Self::Star(s) => &s.names,
            Self::DoubleStar(d) => &d.star.names,
            Self::VariableStar(v) => &v.star.names,
            Self::DoubleVariableStar(d) => &d.double.star.names,
            Self::DeepSky(d) => &d.star.names,
            Self::SolarSystem(p) => &p.names,
            Self::Satellite(s) => &s.names,
            Self::Constellation(c) => &c.names,
            Self::Feature(f) => &f.names,
        }
    }

    /// The object's identifiers; empty for objects that carry none.
    pub fn identifiers(&self) -> Vec<Identifier> {
        match self {
            Self::Star(s) => s.idents.clone(),
            Self::DoubleStar(d) => d.star.idents.clone(),
            Self::VariableStar(v) => v.star.idents.clone(),
            Self::DoubleVariableStar(d) => d.double.star.idents.clone(),
            Self::DeepSky(d) => d.star.idents.clone(),
            Self::SolarSystem(p) => vec![p.id],
            Self::Satellite(s) => vec![s.id],
            Self::Constellation(_) | Self::Feature(_) => Vec::new(),
        }
    }

    /// The stored orbital elements, for objects that have them.
    pub fn orbit(&self) -> Option<&Orbit> {
        match self {
            Self::SolarSystem(p) => p.orbit.as_ref(),
            _ => None,
        }
    }

    /// Computes the apparent place for one observer instant. Objects with a
    /// fixed direction (constellations, features) return their stored
    /// direction unchanged.
    pub fn apparent_place(
        &self,
        frame: &Coordinates,
        eph: &Ephemeris,
    ) -> EphemerisResult<ApparentPlace> {
        match self {
            Self::Star(s) => Ok(s.apparent_place(frame)),
            Self::DoubleStar(d) => Ok(d.star.apparent_place(frame)),
            Self::VariableStar(v) => Ok(v.apparent_place(frame)),
            Self::DoubleVariableStar(d) => Ok(d.apparent_place(frame)),
            Self::DeepSky(d) => Ok(d.star.apparent_place(frame)),
            Self::SolarSystem(p) => p.apparent_place(frame, eph),
            Self::Satellite(s) => s.apparent_place(frame, eph),
            Self::Constellation(c) => Ok(ApparentPlace {
                direction: c.center,
                distance: f64::INFINITY,
                magnitude: f64::INFINITY,
            }),
            Self::Feature(_) => Ok(ApparentPlace {
                direction: Vector3::zeros(),
                distance: f64::INFINITY,
                magnitude: f64::INFINITY,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::solar_system::*;
    use crate::ident::Catalog;
    use crate::time::JD_J2000;
    use approx::assert_abs_diff_eq;

    #[test]
    fn dispatch_reaches_every_variant_kind() {
        let star = CelestialObject::Star(Star::default());
        assert_eq!(star.kind(), ObjectKind::Star);

        let mars = CelestialObject::SolarSystem(Planet::new(
            ObjectKind::Planet,
            Identifier::new(Catalog::JplPlanet, i64::from(PLANET_MARS)),
        ));
        assert_eq!(mars.kind(), ObjectKind::Planet);
        assert_eq!(mars.identifiers()[0].ident(), 4);
    }

    #[test]
    fn planet_apparent_place_is_a_unit_direction_with_distance() {
        let mars = CelestialObject::SolarSystem(Planet::new(
            ObjectKind::Planet,
            Identifier::new(Catalog::JplPlanet, i64::from(PLANET_MARS)),
        ));
        let frame = Coordinates::new(JD_J2000 + 100.0, -2.0, 0.65, 0.0);
        let eph = Ephemeris::new();
        let place = mars.apparent_place(&frame, &eph).unwrap();
        assert_abs_diff_eq!(place.direction.norm(), 1.0, epsilon = 1e-9);
        assert!((0.3..2.7).contains(&place.distance), "Mars at {} AU", place.distance);
    }

    #[test]
    fn moon_geocentric_distance_matches_elp_scale() {
        let luna = CelestialObject::SolarSystem(Planet::new(
            ObjectKind::Moon,
            Identifier::new(Catalog::JplPlanet, i64::from(MOON_LUNA)),
        ));
        let frame = Coordinates::new(JD_J2000 + 3_000.0, 0.0, 0.0, 0.0);
        let eph = Ephemeris::new();
        let place = luna.apparent_place(&frame, &eph).unwrap();
        let d_km = place.distance * crate::constants::AU_KM;
        assert!(
            (350_000.0..410_000.0).contains(&d_km),
            "Moon at {d_km} km"
        );
    }
}
