/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

// Vector3 is nalgebra's Vector3 with a 64-bit floating point representation.
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;

pub mod angle;
pub mod interpolation;
pub mod rotation;
pub mod spherical;

pub use rotation::{r1, r2, r3};

/// Angular separation between two unit vectors, in radians.
///
/// Uses the atan2 form, which stays accurate for very small and very large
/// separations where `acos` of a dot product loses precision.
pub fn angular_separation(a: &Vector3, b: &Vector3) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Position angle of `b` as seen from `a`, measured eastward from north,
/// in radians in `[0, 2π)`. Both vectors are equatorial unit directions.
pub fn position_angle(a: &Vector3, b: &Vector3) -> f64 {
    let sa = spherical::Spherical::from_vector(*a);
    let sb = spherical::Spherical::from_vector(*b);
    let dlon = sb.lon - sa.lon;
    let y = dlon.sin() * sb.lat.cos();
    let x = sa.lat.cos() * sb.lat.sin() - sa.lat.sin() * sb.lat.cos() * dlon.cos();
    angle::Angle::atan2_2pi(y, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn separation_of_orthogonal_axes_is_quarter_turn() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert_abs_diff_eq!(angular_separation(&x, &y), FRAC_PI_2, epsilon = 1e-15);
    }

    #[test]
    fn separation_of_nearly_parallel_vectors_keeps_precision() {
        let a = Vector3::x();
        let tiny = 1e-9;
        let b = Vector3::new(1.0, tiny, 0.0).normalize();
        assert_abs_diff_eq!(angular_separation(&a, &b), tiny, epsilon = 1e-15);
    }

    #[test]
    fn position_angle_due_north_is_zero() {
        let a = spherical::Spherical::unit(1.0, 0.2).to_vector();
        let b = spherical::Spherical::unit(1.0, 0.3).to_vector();
        assert_abs_diff_eq!(position_angle(&a, &b), 0.0, epsilon = 1e-9);
    }
}
