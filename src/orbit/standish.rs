/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Mean Keplerian elements of the major planets referred to the J2000
//! ecliptic, from E. M. Standish, "Keplerian Elements for Approximate
//! Positions of the Major Planets", JPL/Caltech,
//! <https://ssd.jpl.nasa.gov/?planet_pos>.
//!
//! Two fitting intervals per planet: 1800–2050 (about an arcminute of
//! accuracy) and 3000 BC – 3000 AD (about ten arcminutes). The outer fit for
//! Jupiter through Pluto carries additional secular and trigonometric
//! correction terms on the mean longitude.

use super::Orbit;
use crate::constants::solar_system::*;
use crate::math::angle::Angle;
use crate::time::JD_J2000;

const RAD_PER_DEG: f64 = core::f64::consts::PI / 180.0;

/// One planet row: element values and centennial rates in AU and degrees,
/// plus the optional mean-longitude correction `b·t² + c·cos(f·t) + s·sin(f·t)`.
struct Row {
    a: [f64; 2],
    e: [f64; 2],
    i: [f64; 2],
    l: [f64; 2],
    p: [f64; 2],
    n: [f64; 2],
    b: f64,
    c: f64,
    s: f64,
    f: f64,
}

const NO_EXTRA: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);

macro_rules! row {
    ($a:expr, $e:expr, $i:expr, $l:expr, $p:expr, $n:expr) => {
        row!($a, $e, $i, $l, $p, $n, NO_EXTRA)
    };
    ($a:expr, $e:expr, $i:expr, $l:expr, $p:expr, $n:expr, $extra:expr) => {
        Row {
            a: $a,
            e: $e,
            i: $i,
            l: $l,
            p: $p,
            n: $n,
            b: $extra.0,
            c: $extra.1,
            s: $extra.2,
            f: $extra.3,
        }
    };
}

/// Mercury through Pluto, 1800–2050 fit.
const INNER: [Row; 9] = [
    row!(
        [0.38709927, 0.00000037],
        [0.20563593, 0.00001906],
        [7.00497902, -0.00594749],
        [252.25032350, 149472.67411175],
        [77.45779628, 0.16047689],
        [48.33076593, -0.12534081]
    ),
    row!(
        [0.72333566, 0.00000390],
        [0.00677672, 0.00004107],
        [3.39467605, -0.00078890],
        [181.97909950, 58517.81538729],
        [131.60246718, 0.00268329],
        [76.67984255, -0.27769418]
    ),
    row!(
        [1.00000261, 0.00000562],
        [0.01671123, -0.00004392],
        [-0.00001531, -0.01294668],
        [100.46457166, 35999.37244981],
        [102.93768193, 0.32327364],
        [0.0, 0.0]
    ),
    row!(
        [1.52371034, -0.00001847],
        [0.09339410, 0.00007882],
        [1.84969142, -0.00813131],
        [-4.55343205, 19140.30268499],
        [-23.94362959, 0.44441088],
        [49.55953891, -0.29257343]
    ),
    row!(
        [5.20288700, -0.00011607],
        [0.04838624, -0.00013253],
        [1.30439695, -0.00183714],
        [34.39644051, 3034.74612775],
        [14.72847983, 0.21252668],
        [100.47390909, 0.20469106]
    ),
    row!(
        [9.53667594, -0.00125060],
        [0.05386179, -0.00050991],
        [2.48599187, 0.00193609],
        [49.95424423, 1222.49362201],
        [92.59887831, -0.41897216],
        [113.66242448, -0.28867794]
    ),
    row!(
        [19.18916464, -0.00196176],
        [0.04725744, -0.00004397],
        [0.77263783, -0.00242939],
        [313.23810451, 428.48202785],
        [170.95427630, 0.40805281],
        [74.01692503, 0.04240589]
    ),
    row!(
        [30.06992276, 0.00026291],
        [0.00859048, 0.00005105],
        [1.77004347, 0.00035372],
        [-55.12002969, 218.45945325],
        [44.96476227, -0.32241464],
        [131.78422574, -0.00508664]
    ),
    row!(
        [39.48211675, -0.00031596],
        [0.24882730, 0.00005170],
        [17.14001206, 0.00004818],
        [238.92903833, 145.20780515],
        [224.06891629, -0.04062942],
        [110.47390909, -0.20469106]
    ),
];

/// Mercury through Pluto, 3000 BC – 3000 AD fit.
const OUTER: [Row; 9] = [
    row!(
        [0.38709843, 0.0],
        [0.20563661, 0.00002123],
        [7.00559432, -0.00590158],
        [252.25166724, 149472.67486623],
        [77.45771895, 0.15940013],
        [48.33961819, -0.12214182]
    ),
    row!(
        [0.72332102, -0.00000026],
        [0.00676399, -0.00005107],
        [3.39777545, 0.00043494],
        [181.97970850, 58517.81560260],
        [131.76755713, 0.05679648],
        [76.67261496, -0.27274174]
    ),
    row!(
        [1.00000018, -0.00000003],
        [0.01673163, -0.00003661],
        [-0.00054346, -0.01337178],
        [100.46691572, 35999.37306329],
        [102.93005885, 0.31795260],
        [-5.11260389, -0.24123856]
    ),
    row!(
        [1.52371243, 0.00000097],
        [0.09336511, 0.00009149],
        [1.85181869, -0.00724757],
        [-4.56813164, 19140.29934243],
        [-23.91744784, 0.45223625],
        [49.71320984, -0.26852431]
    ),
    row!(
        [5.20248019, -0.00002864],
        [0.04853590, 0.00018026],
        [1.29861416, -0.00322699],
        [34.33479152, 3034.90371757],
        [14.27495244, 0.18199196],
        [100.29282564, 0.13024619],
        (-0.00012452, 0.06064060, -0.35635438, 38.35125)
    ),
    row!(
        [9.54149883, -0.00003065],
        [0.05550825, -0.00032044],
        [2.49424192, 0.00451969],
        [50.07571329, 1222.11494724],
        [92.86136063, 0.54179478],
        [113.63998702, -0.25015002],
        (0.00025899, -0.13434469, 0.87320147, 38.35125)
    ),
    row!(
        [19.18797948, -0.00020455],
        [0.04685740, -0.00001550],
        [0.77298127, -0.00180155],
        [314.20276625, 428.49512595],
        [172.43404441, 0.09266985],
        [73.96250215, 0.05739699],
        (0.00058331, -0.97731848, 0.17689245, 7.67025)
    ),
    row!(
        [30.06952752, 0.00006447],
        [0.00895439, 0.00000818],
        [1.77005520, 0.00022400],
        [304.22289287, 218.46515314],
        [46.68158724, 0.01009938],
        [131.78635853, -0.00606302],
        (-0.00041348, 0.68346318, -0.10162547, 7.67025)
    ),
    row!(
        [39.48686035, 0.00449751],
        [0.24885238, 0.00006016],
        [17.14104260, 0.00000501],
        [238.96535011, 145.18042903],
        [224.09702598, -0.00968827],
        [110.30167986, -0.00809981],
        (-0.01262724, 0.0, 0.0, 0.0)
    ),
];

/// Mean heliocentric orbital elements of a major planet at the given Julian
/// Ephemeris Date, referred to the J2000 ecliptic. Returns `None` for
/// identifiers that are not Mercury…Pluto.
pub fn mean_orbit(planet: i32, jed: f64) -> Option<Orbit> {
    if !(PLANET_MERCURY..=PLANET_PLUTO).contains(&planet) {
        return None;
    }
    let idx = (planet - 1) as usize;
    let t = (jed - JD_J2000) / 36_525.0;

    let row = if (-2.0..1.0).contains(&t) {
        &INNER[idx]
    } else {
        &OUTER[idx]
    };

    let a = row.a[0] + row.a[1] * t;
    let e = row.e[0] + row.e[1] * t;
    let i = row.i[0] + row.i[1] * t;
    let p = row.p[0] + row.p[1] * t;
    let n = row.n[0] + row.n[1] * t;

    let ft = (row.f * t).to_radians();
    let l = row.l[0] + row.l[1] * t + row.b * t * t + row.c * ft.cos() + row.s * ft.sin();
    let mm_deg_cy = row.l[1] - row.p[1] + 2.0 * row.b * t + row.f * RAD_PER_DEG * (row.s * ft.cos() - row.c * ft.sin());

    Some(Orbit::new(
        jed,
        a * (1.0 - e),
        e,
        i.to_radians(),
        Angle::from_degrees(p - n).mod_2pi().as_radians(),
        Angle::from_degrees(n).mod_2pi().as_radians(),
        Angle::from_degrees(l - p).mod_2pi().as_radians(),
        (mm_deg_cy / 36_525.0).to_radians(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn earth_orbit_at_j2000_matches_table() {
        let orbit = mean_orbit(PLANET_EARTH, JD_J2000).unwrap();
        assert_relative_eq!(orbit.semi_major_axis(), 1.00000261, epsilon = 1e-8);
        assert_relative_eq!(orbit.e, 0.01671123, epsilon = 1e-10);
        // One sidereal-ish year period.
        assert_abs_diff_eq!(orbit.period().unwrap(), 365.25, epsilon = 0.05);
    }

    #[test]
    fn earth_radius_stays_near_one_au_all_year() {
        for day in 0..365 {
            let jed = JD_J2000 + f64::from(day);
            let orbit = mean_orbit(PLANET_EARTH, jed).unwrap();
            let (pos, _) = orbit.position_velocity(jed);
            let r = pos.norm();
            assert!((0.983..1.017).contains(&r), "r = {r} at day {day}");
        }
    }

    #[test]
    fn outer_fit_engages_outside_validity_window() {
        // Year 1500 is t < -2 centuries wrt 1800..2050 window? No: t is from
        // J2000, so 1500 is t = -5 and must use the long fit.
        let jed_1500 = JD_J2000 - 500.0 * 365.25;
        let inner_jed = JD_J2000;
        let o_long = mean_orbit(PLANET_JUPITER, jed_1500).unwrap();
        let o_short = mean_orbit(PLANET_JUPITER, inner_jed).unwrap();
        // Both are Jupiter: same scale of orbit.
        assert_relative_eq!(
            o_long.semi_major_axis(),
            o_short.semi_major_axis(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn no_elements_for_non_planets() {
        assert!(mean_orbit(PLANET_SUN, JD_J2000).is_none());
        assert!(mean_orbit(301, JD_J2000).is_none());
    }

    #[test]
    fn planet_longitudes_advance_at_the_mean_motion() {
        let orbit = mean_orbit(PLANET_MARS, JD_J2000).unwrap();
        // Mars sidereal period ~686.98 days.
        assert_abs_diff_eq!(orbit.period().unwrap(), 686.98, epsilon = 0.2);
    }
}
