/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Fixed numerical constants shared by every subsystem. External test vectors
//! depend on these exact values, so they are part of the crate's interface.

/// Speed of light in kilometers per second (km/s)
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// One astronomical unit in kilometers (IAU 2012 definition)
pub const AU_KM: f64 = 149_597_870.7;

/// Light travel time, astronomical units per day
pub const LIGHT_AU_PER_DAY: f64 = SPEED_OF_LIGHT_KM_S * 86_400.0 / AU_KM;

/// Earth's equatorial radius in kilometers (WGS-style ellipsoid)
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Earth ellipsoid flattening, (a - b) / a
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257;

/// One parsec in astronomical units
pub const AU_PER_PARSEC: f64 = 206_264.806_247_096_36;

/// One parsec in kilometers
pub const KM_PER_PARSEC: f64 = AU_PER_PARSEC * AU_KM;

/// One Julian year in days
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Days per Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Seconds per day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Heliocentric gravitational parameter, AU³/day². Equivalent to Gauss'
/// gravitational constant squared.
pub const GM_SUN_AU3_DAY2: f64 = 2.959_122_082_855_911e-4;

/// Geocentric gravitational parameter, km³/s²
pub const GM_EARTH_KM3_S2: f64 = 398_600.4418;

/// Planet and moon identifiers in the JPL NAIF convention used by the
/// identifier algebra (`Catalog::JplPlanet`) and the ephemeris facade.
pub mod solar_system {
    pub const PLANET_SUN: i32 = 0;
    pub const PLANET_MERCURY: i32 = 1;
    pub const PLANET_VENUS: i32 = 2;
    pub const PLANET_EARTH: i32 = 3;
    pub const PLANET_MARS: i32 = 4;
    pub const PLANET_JUPITER: i32 = 5;
    pub const PLANET_SATURN: i32 = 6;
    pub const PLANET_URANUS: i32 = 7;
    pub const PLANET_NEPTUNE: i32 = 8;
    pub const PLANET_PLUTO: i32 = 9;

    pub const MOON_LUNA: i32 = 301;

    pub const fn planet_name_from_id(id: i32) -> Option<&'static str> {
        match id {
            PLANET_SUN => Some("Sun"),
            PLANET_MERCURY => Some("Mercury"),
            PLANET_VENUS => Some("Venus"),
            PLANET_EARTH => Some("Earth"),
            PLANET_MARS => Some("Mars"),
            PLANET_JUPITER => Some("Jupiter"),
            PLANET_SATURN => Some("Saturn"),
            PLANET_URANUS => Some("Uranus"),
            PLANET_NEPTUNE => Some("Neptune"),
            PLANET_PLUTO => Some("Pluto"),
            MOON_LUNA => Some("Moon"),
            _ => None,
        }
    }
}

/// Planetary system masses in Earth masses.
///
/// IAU best estimates from <https://iau-a3.gitlab.io/NSFA/NSFA_cbe.html>;
/// solar mass from JPL DE405,
/// <https://ssd.jpl.nasa.gov/ftp/eph/planets/ioms/de405.iom.pdf>.
pub mod masses {
    pub const MASS_SUN: f64 = 332_946.050_895; // JPL DE405
    pub const MASS_MERCURY: f64 = MASS_SUN / 6.023_657_330e6; // IAU 2015
    pub const MASS_VENUS: f64 = MASS_SUN / 4.085_237_19e5; // IAU 2009
    pub const MASS_EARTH: f64 = 1.0;
    pub const MASS_EARTH_SYSTEM: f64 = MASS_EARTH + 1.230_003_71e-2; // IAU 2009
    pub const MASS_MARS_SYSTEM: f64 = MASS_SUN / 3.098_703_59e6; // IAU 2009
    pub const MASS_JUPITER_SYSTEM: f64 = MASS_SUN / 1.047_348_644e3; // IAU 2009
    pub const MASS_SATURN_SYSTEM: f64 = MASS_SUN / 3.497_901_8e3; // IAU 2009
    pub const MASS_URANUS_SYSTEM: f64 = MASS_SUN / 2.290_295_1e4; // IAU 2015
    pub const MASS_NEPTUNE_SYSTEM: f64 = MASS_SUN / 1.941_226e4; // IAU 2009
    pub const MASS_PLUTO_SYSTEM: f64 = MASS_SUN / 1.3605e8; // IAU 2015
}

pub use solar_system::*;
