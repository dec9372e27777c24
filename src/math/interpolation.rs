/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Evaluates a Chebyshev polynomial by Clenshaw recurrence, returning the
/// value and its derivative with respect to the normalized variable.
///
/// `normalized_time` must lie in `[-1, +1]`; `coeffs` are the Chebyshev
/// coefficients in increasing order. The caller scales the derivative by the
/// interval radius to obtain a rate per physical unit.
pub fn chebyshev_eval(normalized_time: f64, coeffs: &[f64]) -> (f64, f64) {
    if coeffs.is_empty() {
        return (0.0, 0.0);
    }

    // Workspace arrays
    let mut w = [0.0_f64; 3];
    let mut dw = [0.0_f64; 3];

    for j in (1..coeffs.len()).rev() {
        w[2] = w[1];
        w[1] = w[0];
        w[0] = coeffs[j] + (2.0 * normalized_time * w[1] - w[2]);

        dw[2] = dw[1];
        dw[1] = dw[0];
        dw[0] = w[1] * 2.0 + dw[1] * 2.0 * normalized_time - dw[2];
    }

    let val = coeffs[0] + (normalized_time * w[0] - w[1]);
    let deriv = w[0] + normalized_time * dw[0] - dw[1];
    (val, deriv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn evaluates_t0_t1_t2() {
        // 1 + 2·T₁(x) + 3·T₂(x) = 1 + 2x + 3(2x² − 1)
        let coeffs = [1.0, 2.0, 3.0];
        for x in [-1.0, -0.5, 0.0, 0.3, 1.0] {
            let (val, deriv) = chebyshev_eval(x, &coeffs);
            assert_abs_diff_eq!(val, 1.0 + 2.0 * x + 3.0 * (2.0 * x * x - 1.0), epsilon = 1e-14);
            assert_abs_diff_eq!(deriv, 2.0 + 12.0 * x, epsilon = 1e-14);
        }
    }

    #[test]
    fn single_coefficient_is_constant() {
        let (val, deriv) = chebyshev_eval(0.7, &[4.25]);
        assert_abs_diff_eq!(val, 4.25, epsilon = 1e-15);
        assert_abs_diff_eq!(deriv, 0.0, epsilon = 1e-15);
    }
}
