/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Matrix3;

/// Build a 3x3 frame rotation matrix around the X axis.
///
/// `r1(θ) · v` expresses `v` in the frame rotated by `+θ` about X.
pub fn r1(angle_rad: f64) -> Matrix3 {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Build a 3x3 frame rotation matrix around the Y axis
pub fn r2(angle_rad: f64) -> Matrix3 {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Build a 3x3 frame rotation matrix around the Z axis
pub fn r3(angle_rad: f64) -> Matrix3 {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Returns whether the matrix is a proper rotation: orthonormal columns and
/// determinant +1 within the given tolerances.
pub fn is_valid_rotation(m: &Matrix3, unit_tol: f64, det_tol: f64) -> bool {
    for col in m.column_iter() {
        if (col.norm() - 1.0).abs() > unit_tol {
            return false;
        }
    }
    (m.determinant() - 1.0).abs() < det_tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn quarter_turn_about_z_maps_y_onto_x() {
        // Frame rotated +90° about Z: the old +Y axis has new coordinates +X.
        let v = r3(FRAC_PI_2) * Vector3::y();
        assert_abs_diff_eq!(v.x, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(v.y, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn rotations_are_valid_and_invert_by_transpose() {
        for angle in [-2.5, -0.3, 0.0, 0.7, 3.0] {
            for m in [r1(angle), r2(angle), r3(angle)] {
                assert!(is_valid_rotation(&m, 1e-12, 1e-12));
                let id = m.transpose() * m;
                assert_abs_diff_eq!((id - Matrix3::identity()).norm(), 0.0, epsilon = 1e-14);
            }
        }
    }
}
