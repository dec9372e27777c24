/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! SGP4/SDP4 analytical satellite propagation from two-line element sets
//! (Hoots & Roehrich, Spacetrack Report #3; WGS-72 constants).
//!
//! A satellite whose unperturbed period reaches 225 minutes is propagated
//! with the deep-space extension: secular lunisolar rates on the node and
//! perigee plus the geosynchronous resonance integrator. The half-day
//! (Molniya) resonance terms and the lunisolar periodic terms are truncated;
//! position error for such orbits grows beyond the usual 1–3 km.
//!
//! Output states are in the TEME frame (km and km/s); the ephemeris facade
//! rotates them to the fundamental frame.

use crate::errors::{EphemerisError, EphemerisResult};
use crate::math::Vector3;
use crate::time::{CalendarSystem, Time};
use core::f64::consts::{PI, TAU};
use log::warn;
use serde_derive::{Deserialize, Serialize};

// WGS-72 geopotential, the constant set TLEs are generated against.
const XKE: f64 = 0.074_366_916_133_17; // sqrt(GM) in (earth radii)^1.5/min
const CK2: f64 = 5.413_080e-4; // 0.5 * J2
const CK4: f64 = 0.620_988_75e-6; // -0.375 * J4
const XJ3: f64 = -0.253_881e-5;
const EARTH_RADIUS_KM_WGS72: f64 = 6378.135;
const QOMS2T: f64 = 1.880_279_16e-9; // ((120 - 78)/xkmper)^4
const S_PARAM: f64 = 1.012_229_28; // 1 + 78/xkmper
const MINUTES_PER_DAY: f64 = 1440.0;

// Lunisolar strengths: G·m3/a3³ expressed in (rad/min)².
const SUN_STRENGTH: f64 = 1.194_59e-5 * 1.194_59e-5;
const MOON_STRENGTH: f64 = 1.583_5e-4 * 1.583_5e-4 / 82.3007;

// Geosynchronous resonance coefficients (Spacetrack Report #3).
const Q22: f64 = 1.789_167_9e-6;
const Q31: f64 = 2.146_074_8e-6;
const Q33: f64 = 2.212_301_5e-7;
const FASX2: f64 = 0.131_309_08;
const FASX4: f64 = 2.884_319_8;
const FASX6: f64 = 0.374_480_87;
/// Earth rotation rate, rad/min
const RPTIM: f64 = 4.375_269_088_02e-3;
/// Resonance integrator step, minutes
const STEP: f64 = 720.0;

/// A NORAD two-line element set, the exchange format for satellite orbits.
/// Angles are radians, the mean motion is radians per minute, and the epoch
/// is a UTC Julian Date.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tle {
    pub name: String,
    pub norad: u32,
    pub designation: String,
    /// Epoch of the elements, Julian Date (UTC)
    pub epoch_jd: f64,
    /// Half the first derivative of mean motion, rad/min²
    pub xndt2o: f64,
    /// One sixth the second derivative of mean motion, rad/min³
    pub xndd6o: f64,
    /// B* drag term, (earth radii)⁻¹
    pub bstar: f64,
    /// Inclination, rad
    pub xincl: f64,
    /// Right ascension of the ascending node, rad
    pub xnodeo: f64,
    /// Eccentricity
    pub eo: f64,
    /// Argument of perigee, rad
    pub omegao: f64,
    /// Mean anomaly, rad
    pub xmo: f64,
    /// Mean motion, rad/min
    pub xno: f64,
}

impl Tle {
    /// Parses a TLE from its name line and the two element lines.
    pub fn from_lines(name: &str, line1: &str, line2: &str) -> EphemerisResult<Self> {
        if line1.len() < 69 || !line1.starts_with('1') {
            return Err(EphemerisError::BadElements {
                reason: "line 1 malformed",
            });
        }
        if line2.len() < 69 || !line2.starts_with('2') {
            return Err(EphemerisError::BadElements {
                reason: "line 2 malformed",
            });
        }

        let field = |line: &str, range: core::ops::Range<usize>| -> String {
            line[range].trim().to_string()
        };
        let parse_f64 = |s: &str| -> EphemerisResult<f64> {
            s.parse().map_err(|_| EphemerisError::BadElements {
                reason: "numeric field malformed",
            })
        };

        let norad: u32 = field(line1, 2..7)
            .parse()
            .map_err(|_| EphemerisError::BadElements {
                reason: "catalog number malformed",
            })?;
        let designation = field(line1, 9..17);
        let epoch: f64 = parse_f64(&field(line1, 18..32))?;
        let xndt20: f64 = parse_f64(&field(line1, 33..43))?;
        let xndd60 = parse_implied_exponent(&field(line1, 44..52))?;
        let bstar = parse_implied_exponent(&field(line1, 53..61))?;

        let xincl: f64 = parse_f64(&field(line2, 8..16))?;
        let xnode0: f64 = parse_f64(&field(line2, 17..25))?;
        let e0: f64 = parse_f64(&format!("0.{}", field(line2, 26..33)))?;
        let omega0: f64 = parse_f64(&field(line2, 34..42))?;
        let xm0: f64 = parse_f64(&field(line2, 43..51))?;
        let xn0: f64 = parse_f64(&field(line2, 52..63))?;

        // Two-digit years: 57–99 are 19xx, 00–56 are 20xx.
        let mut year = (epoch / 1000.0) as i32;
        let day = epoch - f64::from(year) * 1000.0;
        year += if year > 56 { 1900 } else { 2000 };
        let epoch_jd = Time::from_civil(CalendarSystem::Gregorian, 0.0, year, 1, day, 0, 0, 0.0).jd;

        let rev_to_rad_min = TAU / MINUTES_PER_DAY;
        Ok(Self {
            name: name.trim().to_string(),
            norad,
            designation,
            epoch_jd,
            xndt2o: xndt20 * rev_to_rad_min / MINUTES_PER_DAY,
            xndd6o: xndd60 * rev_to_rad_min / (MINUTES_PER_DAY * MINUTES_PER_DAY),
            bstar,
            xincl: xincl.to_radians(),
            xnodeo: xnode0.to_radians(),
            eo: e0,
            omegao: omega0.to_radians(),
            xmo: xm0.to_radians(),
            xno: xn0 * rev_to_rad_min,
        })
    }

    /// The TLE line checksum: digit sum plus one per minus sign, modulo 10.
    pub fn checksum(line: &str) -> u8 {
        let mut sum = 0_u32;
        for c in line.chars().take(68) {
            if let Some(d) = c.to_digit(10) {
                sum += d;
            } else if c == '-' {
                sum += 1;
            }
        }
        (sum % 10) as u8
    }

    /// Unperturbed orbital period in minutes.
    pub fn period_minutes(&self) -> f64 {
        TAU / self.xno
    }

    /// Whether the deep-space (SDP4) corrections apply.
    pub fn is_deep_space(&self) -> bool {
        self.period_minutes() >= 225.0
    }
}

/// Fields like `"-31515-4"` carry an implied leading decimal point and a
/// trailing exponent: −0.31515 × 10⁻⁴.
fn parse_implied_exponent(s: &str) -> EphemerisResult<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    let bad = || EphemerisError::BadElements {
        reason: "implied-exponent field malformed",
    };

    let (mantissa_sign, rest) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    let exp_at = rest[1..]
        .rfind(['+', '-'])
        .map(|p| p + 1)
        .ok_or_else(bad)?;
    let mantissa: f64 = rest[..exp_at].trim().parse().map_err(|_| bad())?;
    let exponent: i32 = rest[exp_at..].parse().map_err(|_| bad())?;
    Ok(mantissa_sign * mantissa * 10f64.powi(exponent - rest[..exp_at].trim().len() as i32))
}

/// Geosynchronous resonance integrator state.
#[derive(Clone, Debug)]
struct Resonance {
    xlamo: f64,
    xfact: f64,
    del1: f64,
    del2: f64,
    del3: f64,
}

#[derive(Clone, Debug)]
enum Method {
    NearEarth {
        /// Perigee below 220 km drops the higher-order drag terms.
        simple: bool,
        c5: f64,
        d2: f64,
        d3: f64,
        d4: f64,
        t3cof: f64,
        t4cof: f64,
        t5cof: f64,
        omgcof: f64,
        xmcof: f64,
        delmo: f64,
        sinmo: f64,
        eta: f64,
    },
    DeepSpace {
        /// Secular lunisolar rates on node and perigee, rad/min
        ssh: f64,
        ssg: f64,
        resonance: Option<Resonance>,
    },
}

/// An initialized SGP4/SDP4 propagator for one element set.
#[derive(Clone, Debug)]
pub struct Sgp4 {
    tle: Tle,
    method: Method,

    // Common epoch quantities
    xnodp: f64,
    aodp: f64,
    cosio: f64,
    sinio: f64,
    x3thm1: f64,
    x1mth2: f64,
    x7thm1: f64,
    xmdot: f64,
    omgdot: f64,
    xnodot: f64,
    xnodcf: f64,
    c1: f64,
    c4: f64,
    t2cof: f64,
    xlcof: f64,
    aycof: f64,
}

impl Sgp4 {
    pub fn new(tle: &Tle) -> EphemerisResult<Self> {
        if !(0.0..1.0).contains(&tle.eo) {
            return Err(EphemerisError::BadElements {
                reason: "eccentricity outside [0, 1)",
            });
        }
        if tle.xno <= 0.0 {
            return Err(EphemerisError::BadElements {
                reason: "mean motion not positive",
            });
        }

        let eo = tle.eo;
        let cosio = tle.xincl.cos();
        let sinio = tle.xincl.sin();
        let theta2 = cosio * cosio;
        let x3thm1 = 3.0 * theta2 - 1.0;
        let eosq = eo * eo;
        let betao2 = 1.0 - eosq;
        let betao = betao2.sqrt();

        // Un-Kozai the mean motion.
        let a1 = (XKE / tle.xno).powf(2.0 / 3.0);
        let del1 = 1.5 * CK2 * x3thm1 / (a1 * a1 * betao * betao2);
        let ao = a1 * (1.0 - del1 * (1.0 / 3.0 + del1 * (1.0 + 134.0 / 81.0 * del1)));
        let delo = 1.5 * CK2 * x3thm1 / (ao * ao * betao * betao2);
        let xnodp = tle.xno / (1.0 + delo);
        let aodp = ao / (1.0 - delo);

        // Drag model fitting constants, adjusted for low perigees.
        let perigee_km = (aodp * (1.0 - eo) - 1.0) * EARTH_RADIUS_KM_WGS72;
        let (s4, qoms24) = if perigee_km < 156.0 {
            let s4_km = if perigee_km < 98.0 {
                20.0
            } else {
                perigee_km - 78.0
            };
            (
                s4_km / EARTH_RADIUS_KM_WGS72 + 1.0,
                ((120.0 - s4_km) / EARTH_RADIUS_KM_WGS72).powi(4),
            )
        } else {
            (S_PARAM, QOMS2T)
        };

        let pinvsq = 1.0 / (aodp * aodp * betao2 * betao2);
        let tsi = 1.0 / (aodp - s4);
        let eta = aodp * eo * tsi;
        let etasq = eta * eta;
        let eeta = eo * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qoms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);

        let c2 = coef1
            * xnodp
            * (aodp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.75 * CK2 * tsi / psisq * x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let c1 = tle.bstar * c2;

        let a3ovk2 = -XJ3 / CK2;
        let c3 = if eo > 1.0e-4 {
            coef * tsi * a3ovk2 * xnodp * sinio / eo
        } else {
            0.0
        };

        let x1mth2 = 1.0 - theta2;
        let c4 = 2.0
            * xnodp
            * coef1
            * aodp
            * betao2
            * (eta * (2.0 + 0.5 * etasq) + eo * (0.5 + 2.0 * etasq)
                - 2.0 * CK2 * tsi / (aodp * psisq)
                    * (-3.0 * x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75
                            * x1mth2
                            * (2.0 * etasq - eeta * (1.0 + etasq))
                            * (2.0 * tle.omegao).cos()));
        let c5 = 2.0 * coef1 * aodp * betao2 * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let theta4 = theta2 * theta2;
        let temp1 = 3.0 * CK2 * pinvsq * xnodp;
        let temp2 = temp1 * CK2 * pinvsq;
        let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xnodp;
        let xmdot = xnodp
            + 0.5 * temp1 * betao * x3thm1
            + 0.0625 * temp2 * betao * (13.0 - 78.0 * theta2 + 137.0 * theta4);
        let x1m5th = 1.0 - 5.0 * theta2;
        let omgdot = -0.5 * temp1 * x1m5th
            + 0.0625 * temp2 * (7.0 - 114.0 * theta2 + 395.0 * theta4)
            + temp3 * (3.0 - 36.0 * theta2 + 49.0 * theta4);
        let xhdot1 = -temp1 * cosio;
        let xnodot =
            xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * theta2) + 2.0 * temp3 * (3.0 - 7.0 * theta2)) * cosio;

        let xnodcf = 3.5 * betao2 * xhdot1 * c1;
        let t2cof = 1.5 * c1;
        let xlcof = 0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio);
        let aycof = 0.25 * a3ovk2 * sinio;

        let deep_space = TAU / xnodp >= 225.0;
        let method = if deep_space {
            // Secular lunisolar rates from the doubly averaged third-body
            // disturbing function (equatorial-perturber approximation).
            let mut ssh = 0.0;
            let mut ssg = 0.0;
            for strength in [SUN_STRENGTH, MOON_STRENGTH] {
                let k = strength / xnodp;
                ssh += -0.375 * k * (2.0 + 3.0 * eosq) * cosio / betao;
                ssg += 0.375 * k * (4.0 - 5.0 * (1.0 - theta2) + eosq) / betao;
            }

            let period = TAU / xnodp;
            let resonance = if (1200.0..1800.0).contains(&period) {
                // Geosynchronous 1:1 resonance.
                let theta_g = Time::from_julian_date(tle.epoch_jd).greenwich_mean_sidereal_time();
                let xlamo = (tle.xmo + tle.xnodeo + tle.omegao - theta_g).rem_euclid(TAU);
                let g200 = 1.0 + eosq * (-2.5 + 0.8125 * eosq);
                let g310 = 1.0 + 2.0 * eosq;
                let g300 = 1.0 + eosq * (-6.0 + 6.60937 * eosq);
                let f220 = 0.75 * (1.0 + cosio) * (1.0 + cosio);
                let f311 = 0.9375 * sinio * sinio * (1.0 + 3.0 * cosio) - 0.75 * (1.0 + cosio);
                let f330 = 1.875 * (1.0 + cosio).powi(3);
                let aonv = (xnodp / XKE).powf(2.0 / 3.0);
                let del_base = 3.0 * xnodp * xnodp * aonv * aonv;
                let del2 = 2.0 * del_base * f220 * g200 * Q22;
                let del3 = 3.0 * del_base * f330 * g300 * Q33 * aonv;
                let del1 = del_base * f311 * g310 * Q31 * aonv;
                let xfact = xmdot + ssg + omgdot + xnodot + ssh - RPTIM - xnodp;
                Some(Resonance {
                    xlamo,
                    xfact,
                    del1,
                    del2,
                    del3,
                })
            } else {
                if period >= 600.0 {
                    // Half-day resonant orbits (Molniya class) propagate with
                    // secular terms only.
                    warn!(
                        "satellite {}: half-day resonance terms truncated",
                        tle.norad
                    );
                }
                None
            };

            Method::DeepSpace {
                ssh,
                ssg,
                resonance,
            }
        } else {
            let (simple, d2, d3, d4, t3cof, t4cof, t5cof) = if perigee_km < 220.0 {
                (true, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
            } else {
                let c1sq = c1 * c1;
                let d2 = 4.0 * aodp * tsi * c1sq;
                let temp = d2 * tsi * c1 / 3.0;
                let d3 = (17.0 * aodp + s4) * temp;
                let d4 = 0.5 * temp * aodp * tsi * (221.0 * aodp + 31.0 * s4) * c1;
                let t3cof = d2 + 2.0 * c1sq;
                let t4cof = 0.25 * (3.0 * d3 + c1 * (12.0 * d2 + 10.0 * c1sq));
                let t5cof =
                    0.2 * (3.0 * d4 + 12.0 * c1 * d3 + 6.0 * d2 * d2 + 15.0 * c1sq * (2.0 * d2 + c1sq));
                (false, d2, d3, d4, t3cof, t4cof, t5cof)
            };
            Method::NearEarth {
                simple,
                c5,
                d2,
                d3,
                d4,
                t3cof,
                t4cof,
                t5cof,
                omgcof: tle.bstar * c3 * tle.omegao.cos(),
                xmcof: if eo > 1.0e-4 {
                    -(2.0 / 3.0) * coef * tle.bstar / eeta
                } else {
                    0.0
                },
                delmo: (1.0 + eta * tle.xmo.cos()).powi(3),
                sinmo: tle.xmo.sin(),
                eta,
            }
        };

        Ok(Self {
            tle: tle.clone(),
            method,
            xnodp,
            aodp,
            cosio,
            sinio,
            x3thm1,
            x1mth2,
            x7thm1: 7.0 * theta2 - 1.0,
            xmdot,
            omgdot,
            xnodot,
            xnodcf,
            c1,
            c4,
            t2cof,
            xlcof,
            aycof,
        })
    }

    /// Propagates to `tsince` minutes after the element epoch, returning a
    /// TEME-frame position (km) and velocity (km/s).
    pub fn propagate(&self, tsince: f64) -> EphemerisResult<(Vector3, Vector3)> {
        let tle = &self.tle;
        let t = tsince;

        // Secular gravity and drag.
        let xmdf = tle.xmo + self.xmdot * t;
        let omgadf = tle.omegao + self.omgdot * t;
        let xnoddf = tle.xnodeo + self.xnodot * t;
        let tsq = t * t;
        let mut xnode = xnoddf + self.xnodcf * tsq;
        let mut tempa = 1.0 - self.c1 * t;
        let mut tempe = tle.bstar * self.c4 * t;
        let mut templ = self.t2cof * tsq;
        let mut omega = omgadf;
        let mut xmp = xmdf;
        let mut xn = self.xnodp;

        match &self.method {
            Method::NearEarth {
                simple,
                c5,
                d2,
                d3,
                d4,
                t3cof,
                t4cof,
                t5cof,
                omgcof,
                xmcof,
                delmo,
                sinmo,
                eta,
            } => {
                if !*simple {
                    let delomg = omgcof * t;
                    let delm = xmcof * ((1.0 + eta * xmdf.cos()).powi(3) - delmo);
                    let temp = delomg + delm;
                    xmp = xmdf + temp;
                    omega = omgadf - temp;
                    let tcube = tsq * t;
                    let tfour = t * tcube;
                    tempa -= d2 * tsq + d3 * tcube + d4 * tfour;
                    tempe += tle.bstar * c5 * (xmp.sin() - sinmo);
                    templ += t3cof * tcube + tfour * (t4cof + t * t5cof);
                }
            }
            Method::DeepSpace {
                ssh,
                ssg,
                resonance,
            } => {
                omega = omgadf + ssg * t;
                xnode = xnoddf + ssh * t + self.xnodcf * tsq;
                if let Some(res) = resonance {
                    // Euler-Maclaurin integration of the resonance equation
                    // in 720-minute steps from the epoch.
                    let mut xli = res.xlamo;
                    let mut xni = self.xnodp;
                    let mut remaining = t;
                    let dir = if t >= 0.0 { 1.0 } else { -1.0 };
                    loop {
                        let xndt = res.del1 * (xli - FASX2).sin()
                            + res.del2 * (2.0 * (xli - FASX4)).sin()
                            + res.del3 * (3.0 * (xli - FASX6)).sin();
                        let xldot = xni + res.xfact;
                        if remaining.abs() <= STEP {
                            xli += xldot * remaining + 0.5 * xndt * remaining * remaining;
                            xni += xndt * remaining;
                            break;
                        }
                        xli += xldot * dir * STEP + 0.5 * xndt * STEP * STEP * dir;
                        xni += xndt * dir * STEP;
                        remaining -= dir * STEP;
                    }
                    xn = xni;
                    let theta = (Time::from_julian_date(tle.epoch_jd)
                        .greenwich_mean_sidereal_time()
                        + RPTIM * t)
                        .rem_euclid(TAU);
                    xmp = xli + theta - xnode - omega;
                }
            }
        }

        let a = (XKE / xn).powf(2.0 / 3.0) * tempa * tempa;
        let e = tle.eo - tempe;
        if e >= 1.0 || e < -0.001 {
            return Err(EphemerisError::Decayed);
        }
        let e = e.max(1.0e-6);
        let xl = xmp + omega + xnode + self.xnodp * templ;

        // Long-period periodics.
        let beta2 = 1.0 - e * e;
        let axn = e * omega.cos();
        let temp = 1.0 / (a * beta2);
        let xll = temp * self.xlcof * axn;
        let aynl = temp * self.aycof;
        let xlt = xl + xll;
        let ayn = e * omega.sin() + aynl;

        // Kepler's equation for E + ω.
        let capu = (xlt - xnode).rem_euclid(TAU);
        let mut epw = capu;
        for _ in 0..10 {
            let sin_epw = epw.sin();
            let cos_epw = epw.cos();
            let delta = (capu - ayn * cos_epw + axn * sin_epw - epw)
                / (1.0 - cos_epw * axn - sin_epw * ayn);
            if delta.abs() < 1.0e-12 {
                break;
            }
            epw += delta.clamp(-0.95, 0.95);
        }
        let (sin_epw, cos_epw) = epw.sin_cos();

        // Short-period periodics.
        let ecose = axn * cos_epw + ayn * sin_epw;
        let esine = axn * sin_epw - ayn * cos_epw;
        let elsq = axn * axn + ayn * ayn;
        let pl = a * (1.0 - elsq);
        if pl < 0.0 {
            return Err(EphemerisError::Decayed);
        }
        let r = a * (1.0 - ecose);
        let rdot = XKE * a.sqrt() * esine / r;
        let rfdot = XKE * pl.sqrt() / r;
        let temp2 = a / r;
        let betal = (1.0 - elsq).sqrt();
        let temp3 = 1.0 / (1.0 + betal);
        let cosu = temp2 * (cos_epw - axn + ayn * esine * temp3);
        let sinu = temp2 * (sin_epw - ayn - axn * esine * temp3);
        let u = sinu.atan2(cosu);
        let sin2u = 2.0 * sinu * cosu;
        let cos2u = 2.0 * cosu * cosu - 1.0;
        let temp = 1.0 / pl;
        let temp1 = CK2 * temp;
        let temp2 = temp1 * temp;

        let rk = r * (1.0 - 1.5 * temp2 * betal * self.x3thm1)
            + 0.5 * temp1 * self.x1mth2 * cos2u;
        let uk = u - 0.25 * temp2 * self.x7thm1 * sin2u;
        let xnodek = xnode + 1.5 * temp2 * self.cosio * sin2u;
        let xinck = tle.xincl + 1.5 * temp2 * self.cosio * self.sinio * cos2u;
        let rdotk = rdot - xn * temp1 * self.x1mth2 * sin2u;
        let rfdotk = rfdot + xn * temp1 * (self.x1mth2 * cos2u + 1.5 * self.x3thm1);

        // Orientation vectors.
        let (sinuk, cosuk) = uk.sin_cos();
        let (sinik, cosik) = xinck.sin_cos();
        let (sinnok, cosnok) = xnodek.sin_cos();
        let xmx = -sinnok * cosik;
        let xmy = cosnok * cosik;
        let ux = xmx * sinuk + cosnok * cosuk;
        let uy = xmy * sinuk + sinnok * cosuk;
        let uz = sinik * sinuk;
        let vx = xmx * cosuk - cosnok * sinuk;
        let vy = xmy * cosuk - sinnok * sinuk;
        let vz = sinik * cosuk;

        let pos = Vector3::new(rk * ux, rk * uy, rk * uz) * EARTH_RADIUS_KM_WGS72;
        let vel = Vector3::new(
            rdotk * ux + rfdotk * vx,
            rdotk * uy + rfdotk * vy,
            rdotk * uz + rfdotk * vz,
        ) * (EARTH_RADIUS_KM_WGS72 / 60.0);

        Ok((pos, vel))
    }

    /// Propagates to an absolute Julian Date (UTC).
    pub fn propagate_jd(&self, jd: f64) -> EphemerisResult<(Vector3, Vector3)> {
        self.propagate((jd - self.tle.epoch_jd) * MINUTES_PER_DAY)
    }

    pub fn tle(&self) -> &Tle {
        &self.tle
    }

    pub fn is_deep_space(&self) -> bool {
        matches!(self.method, Method::DeepSpace { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ISS_LINE1: &str =
        "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    const ISS_LINE2: &str =
        "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    // TDRS 3, a geosynchronous satellite.
    const GEO_LINE1: &str =
        "1 19548U 88091B   20000.50000000  .00000092  00000-0  00000+0 0  9994";
    const GEO_LINE2: &str =
        "2 19548  13.8000  14.5000 0030000 100.0000 260.0000  1.00270000110000";

    #[test]
    fn parses_iss_elements() {
        let tle = Tle::from_lines("ISS (ZARYA)", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(tle.norad, 25_544);
        assert_eq!(tle.name, "ISS (ZARYA)");
        assert_abs_diff_eq!(tle.xincl.to_degrees(), 51.6461, epsilon = 1e-10);
        assert_abs_diff_eq!(tle.eo, 0.0001413, epsilon = 1e-12);
        assert_abs_diff_eq!(tle.bstar, -0.31515e-4, epsilon = 1e-12);
        assert_abs_diff_eq!(
            tle.xno,
            15.49507896 * TAU / 1440.0,
            epsilon = 1e-10
        );
        // 2020 day 194.886 is July 12.
        let civil = Time::from_julian_date(tle.epoch_jd).to_civil();
        assert_eq!(civil.year, 2020);
        assert_eq!(civil.month, 7);
        assert!(!tle.is_deep_space());
    }

    #[test]
    fn implied_exponent_fields() {
        assert_abs_diff_eq!(
            parse_implied_exponent("-31515-4").unwrap(),
            -0.31515e-4,
            epsilon = 1e-14
        );
        assert_abs_diff_eq!(
            parse_implied_exponent("00000-0").unwrap(),
            0.0,
            epsilon = 1e-14
        );
        assert_abs_diff_eq!(
            parse_implied_exponent("12345-3").unwrap(),
            0.12345e-3,
            epsilon = 1e-14
        );
    }

    #[test]
    fn checksum_matches_published_lines() {
        let line = ISS_LINE1;
        let expect = line.as_bytes()[68] - b'0';
        assert_eq!(Tle::checksum(line), expect);
    }

    #[test]
    fn iss_orbit_radius_and_speed_at_epoch() {
        let tle = Tle::from_lines("ISS", ISS_LINE1, ISS_LINE2).unwrap();
        let prop = Sgp4::new(&tle).unwrap();
        let (pos, vel) = prop.propagate(0.0).unwrap();
        let r = pos.norm();
        let v = vel.norm();
        assert!((6_650.0..6_830.0).contains(&r), "|r| = {r} km");
        assert!((7.5..7.8).contains(&v), "|v| = {v} km/s");
    }

    #[test]
    fn iss_returns_near_start_after_one_period() {
        let tle = Tle::from_lines("ISS", ISS_LINE1, ISS_LINE2).unwrap();
        let prop = Sgp4::new(&tle).unwrap();
        let (p0, _) = prop.propagate(0.0).unwrap();
        let period = tle.period_minutes();
        let (p1, _) = prop.propagate(period).unwrap();
        // Nodal regression and drag shift the track slightly per revolution.
        assert!((p1 - p0).norm() < 150.0, "drift {} km", (p1 - p0).norm());
    }

    #[test]
    fn geosynchronous_satellite_selects_deep_space() {
        let tle = Tle::from_lines("TDRS 3", GEO_LINE1, GEO_LINE2).unwrap();
        assert!(tle.is_deep_space());
        let prop = Sgp4::new(&tle).unwrap();
        assert!(prop.is_deep_space());
        for minutes in [0.0, 360.0, 1440.0] {
            let (pos, vel) = prop.propagate(minutes).unwrap();
            let r = pos.norm();
            assert!((41_600.0..42_700.0).contains(&r), "|r| = {r} km");
            let v = vel.norm();
            assert!((2.9..3.2).contains(&v), "|v| = {v} km/s");
        }
    }

    #[test]
    fn rejects_nonsense_elements() {
        let mut tle = Tle::from_lines("ISS", ISS_LINE1, ISS_LINE2).unwrap();
        tle.eo = 1.5;
        assert!(Sgp4::new(&tle).is_err());
    }
}
