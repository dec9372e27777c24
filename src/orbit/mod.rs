/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Keplerian osculating elements and two-body propagation.
//!
//! Elements use perihelion distance rather than semi-major axis so that the
//! same record describes elliptical (`e < 1`), parabolic (`e = 1`), and
//! hyperbolic (`e > 1`) orbits without singularities.

pub mod standish;

use crate::math::angle::Angle;
use crate::math::Vector3;
use core::f64::consts::TAU;
use serde_derive::{Deserialize, Serialize};

/// Convergence tolerance of the Kepler equation solvers, radians.
const TOLERANCE: f64 = 1.0e-9;

/// Iteration cap. The clamped Newton iteration converges in well under ten
/// steps for any physical orbit; hitting this cap is a bug, not a runtime
/// condition.
const MAX_ITERATIONS: usize = 1_000;

/// A set of Keplerian orbital elements.
///
/// Angles are radians reduced to `[0, 2π)`; distances are AU and rates are
/// per-day, matching the heliocentric conventions of the ephemeris engine
/// (geocentric callers may use km and rad/min as long as they are
/// consistent).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Epoch of the elements as a Julian Ephemeris Date
    pub t: f64,
    /// Perihelion distance, AU; `q ≥ 0`
    pub q: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination to the reference plane, radians in `[0, π]`
    pub i: f64,
    /// Argument of perihelion, radians
    pub w: f64,
    /// Longitude of the ascending node, radians
    pub n: f64,
    /// Mean anomaly at epoch, radians
    pub m: f64,
    /// Mean motion, radians per day; `mm > 0` for bound orbits
    pub mm: f64,
}

impl Orbit {
    #[allow(clippy::too_many_arguments)]
    pub fn new(t: f64, q: f64, e: f64, i: f64, w: f64, n: f64, m: f64, mm: f64) -> Self {
        Self { t, q, e, i, w, n, m, mm }
    }

    /// Solves the Kepler equation at the given Julian Ephemeris Date,
    /// returning the true anomaly (radians) and radial distance.
    ///
    /// Elliptical orbits use the damped Newton iteration from Meeus,
    /// "Astronomical Algorithms" (per-step correction clamped to 0.5 rad);
    /// parabolic orbits use Barker's equation with cubic iteration; hyperbolic
    /// orbits use Newton on `e·sinh H − H − M`.
    ///
    /// # Panics
    ///
    /// Panics if the iteration fails to converge within 1 000 steps, which
    /// cannot happen for finite inputs and indicates a bug.
    pub fn solve_kepler_equation(&self, jed: f64) -> (f64, f64) {
        let e = self.e.abs();
        let ma = self.m + self.mm * (jed - self.t);

        if self.q == 0.0 {
            return (0.0, 0.0);
        }

        if e < 1.0 {
            // Elliptical
            let ma = ma.rem_euclid(TAU);
            let mut ea = ma;
            let mut iterations = 0;
            loop {
                let delta = ea - e * ea.sin() - ma;
                if delta.abs() <= TOLERANCE {
                    break;
                }
                let step = (delta / (1.0 - e * ea.cos())).clamp(-0.5, 0.5);
                ea -= step;
                iterations += 1;
                if iterations > MAX_ITERATIONS {
                    panic!("elliptical Kepler iteration did not converge (e = {e}, M = {ma})");
                }
            }
            let nu = 2.0 * (((1.0 + e) / (1.0 - e)).sqrt() * (ea / 2.0).tan()).atan();
            let r = self.q * (1.0 + e) / (1.0 + e * nu.cos());
            (nu, r)
        } else if e == 1.0 {
            // Parabolic: Barker's equation, cubic iteration
            let mut s = ma;
            let mut iterations = 0;
            loop {
                let s2 = s * s;
                s = (2.0 * s * s2 + ma) / (3.0 * (s2 + 1.0));
                let delta = s * s * s + 3.0 * s - ma;
                if delta.abs() <= TOLERANCE {
                    break;
                }
                iterations += 1;
                if iterations > MAX_ITERATIONS {
                    panic!("parabolic Kepler iteration did not converge (M = {ma})");
                }
            }
            let nu = 2.0 * s.atan();
            let r = self.q * (1.0 + s * s);
            (nu, r)
        } else {
            // Hyperbolic: Newton on e·sinh H − H − M
            let mut ha = (ma / e).asinh();
            let mut iterations = 0;
            loop {
                let delta = e * ha.sinh() - ha - ma;
                if delta.abs() <= TOLERANCE {
                    break;
                }
                ha -= delta / (e * ha.cosh() - 1.0);
                iterations += 1;
                if iterations > MAX_ITERATIONS {
                    panic!("hyperbolic Kepler iteration did not converge (e = {e}, M = {ma})");
                }
            }
            let nu = 2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (ha / 2.0).tanh()).atan();
            let r = self.q * (1.0 + e) / (1.0 + e * nu.cos());
            (nu, r)
        }
    }

    /// The inverse of [`Orbit::solve_kepler_equation`]: recovers mean anomaly
    /// and perihelion distance from a true anomaly and radial distance,
    /// keeping the remaining elements.
    pub fn from_true_anomaly(&self, nu: f64, r: f64) -> Self {
        let mut orbit = *self;
        let e = self.e;
        if e < 1.0 {
            let ea = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
            orbit.m = ea - e * ea.sin();
            orbit.q = r * (1.0 + e * nu.cos()) / (1.0 + e);
        } else if e == 1.0 {
            let s = (nu / 2.0).tan();
            orbit.m = s * s * s + 3.0 * s;
            orbit.q = r / (1.0 + s * s);
        } else {
            let ha = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (nu / 2.0).tan()).atanh();
            orbit.m = e * ha.sinh() - ha;
            orbit.q = r * (1.0 + e * nu.cos()) / (1.0 + e);
        }
        orbit
    }

    /// Propagates these elements to a position and velocity in the element
    /// frame (AU and AU/day for heliocentric elements).
    pub fn position_velocity(&self, jed: f64) -> (Vector3, Vector3) {
        let (nu, r) = self.solve_kepler_equation(jed);
        let e = self.e;

        let mu = if e < 1.0 {
            let a = self.q / (1.0 - e);
            a * a * a * self.mm * self.mm
        } else if e == 1.0 {
            2.0 * self.q.powi(3) * self.mm * self.mm / 9.0
        } else {
            let a = self.q / (e - 1.0);
            a * a * a * self.mm * self.mm
        };

        let p = self.q * (1.0 + e);
        let h = (mu * p).sqrt();
        let dnu = h / (r * r);
        let dr = h * e * nu.sin() / p;

        let u = self.w + nu;
        let (su, cu) = u.sin_cos();
        let (si, ci) = self.i.sin_cos();
        let (sn, cn) = self.n.sin_cos();

        let pos = Vector3::new(
            r * (cu * cn - su * ci * sn),
            r * (cu * sn + su * ci * cn),
            r * (su * si),
        );
        let vel = Vector3::new(
            pos.x * dr / r + r * dnu * (-su * cn - cu * ci * sn),
            pos.y * dr / r + r * dnu * (-su * sn + cu * ci * cn),
            pos.z * dr / r + r * dnu * (cu * si),
        );
        (pos, vel)
    }

    /// Recovers osculating elements from a state vector. `mu` is the
    /// gravitational parameter in units consistent with `pos` and `vel`.
    pub fn from_position_velocity(jed: f64, mu: f64, pos: Vector3, vel: Vector3) -> Self {
        let hv = pos.cross(&vel);
        let h2 = hv.norm_squared();
        let h = h2.sqrt();
        let r = pos.norm();
        let v2 = vel.norm_squared();
        let rv = pos.dot(&vel);

        let p = h2 / mu;
        let a = 1.0 / (2.0 / r - v2 / mu);
        let mut e = (1.0 - p / a).max(0.0).sqrt();
        if (e - 1.0).abs() < 1.0e-6 {
            e = 1.0;
        }

        let q = p / (1.0 + e);
        let mut nu = ((p / r - 1.0) / e).clamp(-1.0, 1.0).acos();
        if rv < 0.0 {
            nu = -nu;
        }

        let (m, mm) = if e < 1.0 {
            let ea = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
            (ea - e * ea.sin(), (mu / (a * a * a)).sqrt())
        } else if e == 1.0 {
            let s = (nu / 2.0).tan();
            (s * s * s + 3.0 * s, 3.0 * (mu / (2.0 * q * q * q)).sqrt())
        } else {
            let ha = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (nu / 2.0).tan()).atanh();
            (e * ha.sinh() - ha, (-mu / (a * a * a)).sqrt())
        };

        let i = (hv.z / h).clamp(-1.0, 1.0).acos();
        let n = Angle::atan2_2pi(hv.x, -hv.y);
        let u = Angle::atan2_2pi(
            (-pos.x * hv.x - pos.y * hv.y) / hv.z,
            (-pos.x * hv.y + pos.y * hv.x) / h,
        );
        let w = Angle::from_radians(u - nu).mod_2pi().as_radians();

        Self::new(jed, q, e, i, w, n, m, mm)
    }

    /// Semi-major axis; negative for hyperbolic orbits, infinite for
    /// parabolic.
    pub fn semi_major_axis(&self) -> f64 {
        self.q / (1.0 - self.e)
    }

    /// Orbital period in days; `None` for unbound orbits.
    pub fn period(&self) -> Option<f64> {
        if self.e < 1.0 && self.mm > 0.0 {
            Some(TAU / self.mm)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rstest::rstest;

    fn kepler_residual(e: f64, ea: f64, ma: f64) -> f64 {
        (ea - e * ea.sin() - ma.rem_euclid(TAU)).abs()
    }

    #[rstest]
    #[case(0.0, 1.2)]
    #[case(0.0167, 0.5)]
    #[case(0.5, 3.0)]
    #[case(0.9671, 1.2)]
    #[case(0.999, 6.0)]
    fn elliptical_solver_satisfies_kepler_equation(#[case] e: f64, #[case] m: f64) {
        let orbit = Orbit::new(0.0, 1.0 - e, e, 0.0, 0.0, 0.0, m, 0.01);
        let (nu, r) = orbit.solve_kepler_equation(0.0);
        // Recover the eccentric anomaly from the true anomaly and check the
        // defining equation to the solver tolerance.
        let ea = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
        assert!(kepler_residual(e, ea, m) < 2e-9);
        assert_relative_eq!(
            r,
            orbit.q * (1.0 + e) / (1.0 + e * nu.cos()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn high_eccentricity_case_converges_to_tolerance() {
        let orbit = Orbit::new(0.0, 1.0 - 0.9671, 0.9671, 0.0, 0.0, 0.0, 1.2, 0.01);
        let (nu, _) = orbit.solve_kepler_equation(0.0);
        let e = 0.9671_f64;
        let ea = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
        assert_abs_diff_eq!(ea - e * ea.sin(), 1.2, epsilon = 1e-8);
    }

    #[test]
    fn parabolic_orbit_satisfies_barker() {
        let orbit = Orbit::new(0.0, 0.5, 1.0, 0.0, 0.0, 0.0, 0.3, 0.02);
        let (nu, r) = orbit.solve_kepler_equation(0.0);
        let s = (nu / 2.0).tan();
        assert_abs_diff_eq!(s * s * s + 3.0 * s, 0.3, epsilon = 1e-8);
        assert_relative_eq!(r, orbit.q * (1.0 + s * s), epsilon = 1e-12);
    }

    #[test]
    fn hyperbolic_orbit_satisfies_kepler() {
        let orbit = Orbit::new(0.0, 1.2, 1.5, 0.0, 0.0, 0.0, 0.8, 0.02);
        let (nu, _) = orbit.solve_kepler_equation(0.0);
        let e = 1.5_f64;
        let ha = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (nu / 2.0).tan()).atanh();
        assert_abs_diff_eq!(e * ha.sinh() - ha, 0.8, epsilon = 1e-8);
    }

    #[test]
    fn elements_state_round_trip() {
        // A Ceres-like heliocentric orbit, mu in AU³/day².
        let mu = crate::constants::GM_SUN_AU3_DAY2;
        let a: f64 = 2.767;
        let e = 0.0785;
        let mm = (mu / (a * a * a)).sqrt();
        let orbit = Orbit::new(2_451_545.0, a * (1.0 - e), e, 0.1846, 1.27, 1.40, 0.4, mm);

        let (pos, vel) = orbit.position_velocity(2_451_545.0 + 321.5);
        let back = Orbit::from_position_velocity(2_451_545.0 + 321.5, mu, pos, vel);

        assert_relative_eq!(back.q, orbit.q, epsilon = 1e-9);
        assert_relative_eq!(back.e, orbit.e, epsilon = 1e-7);
        assert_relative_eq!(back.i, orbit.i, epsilon = 1e-9);
        assert_relative_eq!(back.n, orbit.n, epsilon = 1e-9);
        assert_relative_eq!(back.mm, orbit.mm, epsilon = 1e-9);

        // Re-propagating the recovered elements reproduces the state.
        let (pos2, vel2) = back.position_velocity(2_451_545.0 + 321.5);
        assert_abs_diff_eq!((pos - pos2).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!((vel - vel2).norm(), 0.0, epsilon = 1e-11);
    }

    #[test]
    fn vis_viva_holds_along_the_orbit() {
        let mu = crate::constants::GM_SUN_AU3_DAY2;
        let a: f64 = 1.5;
        let e = 0.3;
        let mm = (mu / (a * a * a)).sqrt();
        let orbit = Orbit::new(0.0, a * (1.0 - e), e, 0.3, 0.5, 1.0, 0.0, mm);
        for days in [0.0, 50.0, 200.0, 400.0] {
            let (pos, vel) = orbit.position_velocity(days);
            let r = pos.norm();
            let v2 = vel.norm_squared();
            assert_relative_eq!(v2, mu * (2.0 / r - 1.0 / a), epsilon = 1e-10);
        }
    }
}
