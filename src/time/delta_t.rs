/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! ΔT = TDT − UT1, the drift of Earth rotation against uniform ephemeris
//! time.
//!
//! Piecewise polynomial fits from Espenak & Meeus, "Five Millennium Canon of
//! Solar Eclipses" (NASA/TP-2006-214141), spanning −500 to +2150. Outside that
//! range the long-term parabola `−20 + 32·u²` (u in centuries from 1820)
//! takes over, so the model degrades gracefully rather than failing.

use crate::time::{Time, JD_J2000};

/// ΔT in seconds at the given Julian Date (UTC).
pub fn delta_t_seconds(jd: f64) -> f64 {
    delta_t_for_year(2000.0 + (jd - JD_J2000) / 365.25)
}

/// ΔT in seconds at the given decimal year.
pub fn delta_t_for_year(y: f64) -> f64 {
    if y < -500.0 {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    } else if y < 500.0 {
        let u = y / 100.0;
        poly(
            u,
            &[
                10583.6,
                -1014.41,
                33.78311,
                -5.952053,
                -0.1798452,
                0.022174192,
                0.0090316521,
            ],
        )
    } else if y < 1600.0 {
        let u = (y - 1000.0) / 100.0;
        poly(
            u,
            &[
                1574.2,
                -556.01,
                71.23472,
                0.319781,
                -0.8503463,
                -0.005050998,
                0.0083572073,
            ],
        )
    } else if y < 1700.0 {
        let t = y - 1600.0;
        120.0 - 0.9808 * t - 0.01532 * t * t + t * t * t / 7129.0
    } else if y < 1800.0 {
        let t = y - 1700.0;
        poly(t, &[8.83, 0.1603, -0.0059285, 0.00013336]) - t.powi(4) / 1_174_000.0
    } else if y < 1860.0 {
        let t = y - 1800.0;
        poly(
            t,
            &[
                13.72,
                -0.332447,
                0.0068612,
                0.0041116,
                -0.00037436,
                0.0000121272,
                -0.0000001699,
                0.000000000875,
            ],
        )
    } else if y < 1900.0 {
        let t = y - 1860.0;
        poly(t, &[7.62, 0.5737, -0.251754, 0.01680668, -0.0004473624])
            + t.powi(5) / 233_174.0
    } else if y < 1920.0 {
        let t = y - 1900.0;
        poly(t, &[-2.79, 1.494119, -0.0598939, 0.0061966, -0.000197])
    } else if y < 1941.0 {
        let t = y - 1920.0;
        poly(t, &[21.20, 0.84493, -0.076100, 0.0020936])
    } else if y < 1961.0 {
        let t = y - 1950.0;
        29.07 + 0.407 * t - t * t / 233.0 + t * t * t / 2547.0
    } else if y < 1986.0 {
        let t = y - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t * t * t / 718.0
    } else if y < 2005.0 {
        let t = y - 2000.0;
        poly(
            t,
            &[
                63.86,
                0.3345,
                -0.060374,
                0.0017275,
                0.000651814,
                0.00002373599,
            ],
        )
    } else if y < 2050.0 {
        let t = y - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t * t
    } else if y < 2150.0 {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - y)
    } else {
        let u = (y - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    }
}

fn poly(x: f64, coeffs: &[f64]) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

impl Time {
    /// ΔT at this instant, in seconds.
    pub fn delta_t(&self) -> f64 {
        delta_t_seconds(self.jd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    // Published Espenak-Meeus model values (seconds, loose tolerances: the
    // fits themselves carry a few seconds of scatter against observations).
    #[case(2000.0, 63.9, 0.5)]
    #[case(1990.0, 56.9, 1.0)]
    #[case(1900.0, -2.8, 0.5)]
    #[case(1800.0, 13.7, 0.5)]
    #[case(1600.0, 120.0, 0.5)]
    #[case(1000.0, 1574.2, 1.0)]
    #[case(0.0, 10583.6, 1.0)]
    fn model_matches_published_values(
        #[case] year: f64,
        #[case] expect: f64,
        #[case] tol: f64,
    ) {
        assert_abs_diff_eq!(delta_t_for_year(year), expect, epsilon = tol);
    }

    #[test]
    fn model_is_continuous_at_segment_joins() {
        // The published fits agree to a few seconds where segments meet.
        for year in [-500.0, 500.0, 1600.0, 1700.0, 1800.0, 1860.0, 1900.0, 1920.0, 1941.0,
            1961.0, 1986.0, 2005.0, 2050.0, 2150.0]
        {
            let below = delta_t_for_year(year - 1e-6);
            let above = delta_t_for_year(year + 1e-6);
            assert!(
                (below - above).abs() < 5.0,
                "discontinuity of {} s at {}",
                (below - above).abs(),
                year
            );
        }
    }

    #[test]
    fn far_future_follows_long_term_parabola() {
        let u: f64 = (3000.0 - 1820.0) / 100.0;
        assert_abs_diff_eq!(delta_t_for_year(3000.0), -20.0 + 32.0 * u * u, epsilon = 1e-9);
    }
}
