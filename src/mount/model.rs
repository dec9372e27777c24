/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The mount alignment model: a four-parameter linear fit from encoder
//! counts to sky coordinates, solved by ordinary least squares over the
//! sighted stars.
//!
//! The deliberate simplicity — an independent offset and scale per axis —
//! covers zero-point and gear-scale errors. Polar misalignment,
//! non-orthogonality, and flexure belong to a richer model that would slot
//! in at the same seam.

use crate::errors::{MountError, MountResult};
use crate::math::angle::Angle;
use nalgebra::{Matrix2, Vector2};

/// One sighted star: raw encoder angles and the celestial azimuth/altitude
/// the mount was actually pointing at, all in radians.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sighting {
    pub x_enc: f64,
    pub y_enc: f64,
    pub azimuth: f64,
    pub altitude: f64,
}

/// The fitted pointing model `azimuth ≈ a·x + b`, `altitude ≈ c·y + d`.
#[derive(Clone, Debug, Default)]
pub struct MountModel {
    sightings: Vec<Sighting>,
    /// Fit parameters; `None` until three sightings are solved.
    params: Option<(f64, f64, f64, f64)>,
}

impl MountModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stars sighted so far.
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// Whether a solved fit is available.
    pub fn is_aligned(&self) -> bool {
        self.params.is_some()
    }

    pub fn reset(&mut self) {
        self.sightings.clear();
        self.params = None;
    }

    /// Records a sighting and re-solves the fit once three stars are
    /// available. Azimuths are unwrapped against the first sighting so a set
    /// of stars straddling north does not tear the fit apart.
    pub fn add_sighting(&mut self, sighting: Sighting) -> MountResult<()> {
        let mut sighting = sighting;
        if let Some(first) = self.sightings.first() {
            sighting.azimuth =
                first.azimuth + Angle::from_radians(sighting.azimuth - first.azimuth)
                    .mod_pi()
                    .as_radians();
            sighting.x_enc = first.x_enc
                + Angle::from_radians(sighting.x_enc - first.x_enc)
                    .mod_pi()
                    .as_radians();
        }
        self.sightings.push(sighting);
        if self.sightings.len() >= 3 {
            self.solve()?;
        }
        Ok(())
    }

    /// Solves both axes by ordinary least squares.
    fn solve(&mut self) -> MountResult<()> {
        let (a, b) = fit_axis(
            self.sightings.iter().map(|s| (s.x_enc, s.azimuth)),
            self.sightings.len(),
        )?;
        let (c, d) = fit_axis(
            self.sightings.iter().map(|s| (s.y_enc, s.altitude)),
            self.sightings.len(),
        )?;
        self.params = Some((a, b, c, d));
        Ok(())
    }

    /// The fit parameters `(a, b, c, d)`.
    pub fn parameters(&self) -> Option<(f64, f64, f64, f64)> {
        self.params
    }

    /// Maps encoder angles to celestial azimuth and altitude.
    pub fn encoders_to_celestial(&self, x_enc: f64, y_enc: f64) -> MountResult<(f64, f64)> {
        let (a, b, c, d) = self.params.ok_or(MountError::BadAlignment)?;
        Ok((
            Angle::from_radians(a * x_enc + b).mod_2pi().as_radians(),
            c * y_enc + d,
        ))
    }

    /// Maps celestial azimuth and altitude to encoder angles.
    pub fn celestial_to_encoders(&self, azimuth: f64, altitude: f64) -> MountResult<(f64, f64)> {
        let (a, b, c, d) = self.params.ok_or(MountError::BadAlignment)?;
        if a.abs() < f64::EPSILON || c.abs() < f64::EPSILON {
            return Err(MountError::BadAlignment);
        }
        // Choose the azimuth branch nearest the fitted span.
        let reference = self.sightings.first().map_or(0.0, |s| s.azimuth);
        let azimuth = reference
            + Angle::from_radians(azimuth - reference).mod_pi().as_radians();
        Ok(((azimuth - b) / a, (altitude - d) / c))
    }

    /// Residual of one sighting against the fit: `(Δazimuth, Δaltitude)` in
    /// radians.
    pub fn residuals(&self, index: usize) -> MountResult<(f64, f64)> {
        let (a, b, c, d) = self.params.ok_or(MountError::BadAlignment)?;
        let s = self.sightings.get(index).ok_or(MountError::InvalidInput)?;
        Ok((
            s.azimuth - (a * s.x_enc + b),
            s.altitude - (c * s.y_enc + d),
        ))
    }

    /// Root-mean-square pointing error of the fit over all sightings,
    /// radians.
    pub fn rms_error(&self) -> MountResult<f64> {
        if self.params.is_none() {
            return Err(MountError::BadAlignment);
        }
        let mut sum = 0.0;
        for i in 0..self.sightings.len() {
            let (da, dh) = self.residuals(i)?;
            sum += da * da + dh * dh;
        }
        Ok((sum / self.sightings.len() as f64).sqrt())
    }
}

/// Least-squares fit of `y ≈ m·x + k` via the 2×2 normal equations.
fn fit_axis(
    samples: impl Iterator<Item = (f64, f64)>,
    n: usize,
) -> MountResult<(f64, f64)> {
    if n < 2 {
        return Err(MountError::BadAlignment);
    }
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in samples {
        sx += x;
        sy += y;
        sxx += x * x;
        sxy += x * y;
    }
    let ata = Matrix2::new(sxx, sx, sx, n as f64);
    let atb = Vector2::new(sxy, sy);
    let solution = ata
        .lu()
        .solve(&atb)
        .ok_or(MountError::BadAlignment)?;
    Ok((solution[0], solution[1]))
}
