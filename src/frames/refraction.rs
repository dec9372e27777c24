/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Atmospheric refraction, Saemundsson/Bennett empirical formulas for
//! standard conditions (1010 mbar, +10 °C).

use crate::math::angle::Angle;

/// Refraction angle at an altitude. `true_altitude` selects the formula for
/// a true (geometric) input altitude; pass `false` for an apparent
/// (refracted) input. Altitudes below the formula domain are clamped to its
/// floor, so the function is total and continuous at the horizon.
pub fn refraction_angle(alt: Angle, true_altitude: bool) -> Angle {
    let r = if true_altitude {
        let h = alt.to_degrees().max(-1.9);
        1.02 / Angle::from_degrees(h + 10.3 / (h + 5.11)).tan()
    } else {
        let h = alt.to_degrees().max(-1.7);
        1.0 / Angle::from_degrees(h + 7.31 / (h + 4.4)).tan()
    };
    Angle::from_arcmin(r)
}

/// Refracted (apparent) altitude from a true (geometric) altitude.
pub fn apply_refraction(alt: Angle) -> Angle {
    alt + refraction_angle(alt, true)
}

/// True (geometric) altitude from a refracted (apparent) altitude.
pub fn remove_refraction(alt: Angle) -> Angle {
    alt - refraction_angle(alt, false)
}
