/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Per-catalog string ↔ packed-integer codecs. Each codec is the inverse of
//! its formatter for every identifier the catalog actually contains.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Greek letters of the Bayer designations, in Bayer's order.
pub(crate) const GREEK_LETTERS: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

/// The 88 IAU constellation abbreviations, alphabetical by Latin name.
pub(crate) const CONSTELLATIONS: [&str; 88] = [
    "And", "Ant", "Aps", "Aqr", "Aql", "Ara", "Ari", "Aur", "Boo", "Cae", "Cam", "Cnc", "CVn",
    "CMa", "CMi", "Cap", "Car", "Cas", "Cen", "Cep", "Cet", "Cha", "Cir", "Col", "Com", "CrA",
    "CrB", "Crv", "Crt", "Cru", "Cyg", "Del", "Dor", "Dra", "Equ", "Eri", "For", "Gem", "Gru",
    "Her", "Hor", "Hya", "Hyi", "Ind", "Lac", "Leo", "LMi", "Lep", "Lib", "Lup", "Lyn", "Lyr",
    "Men", "Mic", "Mon", "Mus", "Nor", "Oct", "Oph", "Ori", "Pav", "Peg", "Per", "Phe", "Pic",
    "Psc", "PsA", "Pup", "Pyx", "Ret", "Sge", "Sgr", "Sco", "Scl", "Sct", "Ser", "Sex", "Tau",
    "Tel", "Tri", "TrA", "Tuc", "UMa", "UMi", "Vel", "Vir", "Vol", "Vul",
];

// Lazily-built lookup tables; immutable after first use.
static CONSTELLATION_INDEX: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    CONSTELLATIONS
        .iter()
        .enumerate()
        .map(|(i, &abbr)| (abbr, (i + 1) as u8))
        .collect()
});

static GREEK_INDEX: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    GREEK_LETTERS
        .iter()
        .enumerate()
        .map(|(i, &name)| (name, (i + 1) as i64))
        .collect()
});

/// One-based constellation index (1 = Andromeda … 88 = Vulpecula) of an IAU
/// abbreviation; `None` when not recognized. Matching is case-sensitive: many
/// star identifiers depend on letter case.
pub fn constellation_index(abbr: &str) -> Option<u8> {
    CONSTELLATION_INDEX.get(abbr).copied()
}

/// The IAU abbreviation for a one-based constellation index.
pub fn constellation_abbreviation(index: usize) -> Option<&'static str> {
    if (1..=88).contains(&index) {
        Some(CONSTELLATIONS[index - 1])
    } else {
        None
    }
}

/// Bayer letter codes: 1–24 are the Greek letters, 25–50 the Latin lowercase
/// letters a–z, 51+ the Latin uppercase letters A–Q.
pub(crate) fn bayer_from_str(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    if bytes.len() == 1 {
        match bytes[0] {
            b'a'..=b'z' => return Some(i64::from(bytes[0] - b'a') + 25),
            b'A'..=b'Q' => return Some(i64::from(bytes[0] - b'A') + 51),
            _ => return None,
        }
    }
    // An abbreviated Greek letter matches by prefix ("alp" is alpha).
    if let Some(&exact) = GREEK_INDEX.get(s) {
        return Some(exact);
    }
    if s.len() >= 2 {
        for (i, name) in GREEK_LETTERS.iter().enumerate() {
            if name.starts_with(s) {
                return Some((i + 1) as i64);
            }
        }
    }
    None
}

pub(crate) fn bayer_to_string(bay: i64) -> String {
    if bay > 50 {
        ((b'A' + (bay - 51) as u8) as char).to_string()
    } else if bay > 24 {
        ((b'a' + (bay - 25) as u8) as char).to_string()
    } else {
        GREEK_LETTERS[(bay - 1) as usize].to_string()
    }
}

/// Encodes the historical GCVS letter sequence R, S, … Z, RR, RS, … ZZ,
/// AA, AB, … QZ (J is skipped), then V335, V336, … to a single integer.
pub(crate) fn gcvs_from_str(s: &str) -> Option<i64> {
    let b = s.as_bytes();
    match b.len() {
        // R, S, T ... Z
        1 if (b'R'..=b'Z').contains(&b[0]) => Some(i64::from(b[0] - b'R') + 1),
        2 => {
            // RR, RS, ... RZ, SS, ST, ... ZZ
            if (b'R'..=b'Z').contains(&b[0]) && b[1] >= b[0] && b[1] <= b'Z' {
                let n1 = i64::from(b[0] - b'R');
                let n2 = i64::from(b[1] - b'R');
                Some(n1 * 9 - (n1 - 1) * n1 / 2 + (n2 - n1) + 10)
            }
            // AA, AB, ... AZ, BB, ... QZ; the letter J never appears.
            else if (b'A'..b'R').contains(&b[0])
                && b[0] != b'J'
                && b[1] >= b[0]
                && b[1] <= b'Z'
                && b[1] != b'J'
            {
                let mut n1 = i64::from(b[0] - b'A');
                let mut n2 = i64::from(b[1] - b'A');
                if b[0] > b'J' {
                    n1 -= 1;
                }
                if b[1] > b'J' {
                    n2 -= 1;
                }
                Some(n1 * 25 - (n1 - 1) * n1 / 2 + (n2 - n1) + 55)
            } else {
                None
            }
        }
        // V335, V336, ...
        len if len > 3 && b[0] == b'V' && b[1].is_ascii_digit() => {
            let n = s[1..].parse::<i64>().ok()?;
            if n >= 335 {
                Some(n)
            } else {
                None
            }
        }
        _ => None,
    }
}

pub(crate) fn gcvs_to_string(n: i64) -> String {
    if n < 10 {
        // R, S, T, ... Z
        (((b'R' + (n - 1) as u8)) as char).to_string()
    } else if n < 55 {
        // RR, RS, ... ZZ
        let n0 = n - 10;
        let mut n1 = 0_i64;
        let mut n2 = 9_i64;
        while n2 <= n0 {
            n1 += 1;
            n2 += 9 - n1;
        }
        let n2 = n0 - n2 + 9;
        format!(
            "{}{}",
            (b'R' + n1 as u8) as char,
            (b'R' + n2 as u8) as char
        )
    } else if n < 335 {
        // AA, AB, ... QZ; J is skipped.
        let n0 = n - 55;
        let mut n1 = 0_i64;
        let mut n2 = 25_i64;
        while n2 <= n0 {
            n1 += 1;
            n2 += 25 - n1;
        }
        let mut n2 = n0 - n2 + 25;
        if n1 >= i64::from(b'J' - b'A') {
            n1 += 1;
        }
        if n2 >= i64::from(b'J' - b'A') {
            n2 += 1;
        }
        format!(
            "{}{}",
            (b'A' + n1 as u8) as char,
            (b'A' + n2 as u8) as char
        )
    } else {
        // V335, V336, ...
        format!("V{n}")
    }
}

/// Durchmusterung designations pack sign, declination zone, star number, and
/// an optional suffix letter: `sign·10⁸ + zone·10⁶ + number·10 + suffix`.
pub(crate) fn dm_from_str(s: &str) -> Option<i64> {
    let mut chars = s.chars().peekable();
    let sign = match chars.next()? {
        '+' => 1_i64,
        '-' => 0_i64,
        _ => return None,
    };

    let mut zone = 0_i64;
    let mut saw_zone = false;
    while let Some(c) = chars.peek().copied() {
        if let Some(d) = c.to_digit(10) {
            zone = zone * 10 + i64::from(d);
            saw_zone = true;
            chars.next();
        } else {
            break;
        }
    }
    while matches!(chars.peek(), Some(' ')) {
        chars.next();
    }
    let mut num = 0_i64;
    let mut saw_num = false;
    while let Some(c) = chars.peek().copied() {
        if let Some(d) = c.to_digit(10) {
            num = num * 10 + i64::from(d);
            saw_num = true;
            chars.next();
        } else {
            break;
        }
    }
    if !saw_zone || !saw_num || zone > 99 {
        return None;
    }

    let suffix = match chars.next() {
        Some('a') | Some('A') => 1,
        Some('b') | Some('B') => 2,
        Some('n') | Some('N') => 3,
        Some('p') | Some('P') => 4,
        Some('s') | Some('S') => 5,
        _ => 0,
    };

    Some(sign * 100_000_000 + zone * 1_000_000 + num * 10 + suffix)
}

pub(crate) fn dm_to_string(dm: i64) -> String {
    let sign = if dm / 100_000_000 > 0 { '+' } else { '-' };
    let zone = (dm / 1_000_000) % 100;
    let num = (dm % 1_000_000) / 10;
    let suffix = match dm % 10 {
        1 => "a",
        2 => "b",
        3 => "n",
        4 => "p",
        5 => "s",
        _ => "",
    };
    format!("{sign}{zone:02} {num}{suffix}")
}

/// Washington Double Star positional identifiers: RA to 0.1 min and Dec to
/// 1 arcmin, packed as `ra·10⁵ + sign·10⁴ + dec`.
pub(crate) fn wds_from_str(s: &str) -> Option<i64> {
    let sign_at = s.find(['+', '-'])?;
    let ra: i64 = s[..sign_at].parse().ok()?;
    let sign = if s.as_bytes()[sign_at] == b'+' { 1 } else { 0 };
    let dec: i64 = s[sign_at + 1..].parse().ok()?;
    if (0..24_000).contains(&ra) && (0..9_000).contains(&dec) {
        Some(ra * 100_000 + sign * 10_000 + dec)
    } else {
        None
    }
}

pub(crate) fn wds_to_string(wds: i64) -> String {
    let ra = wds / 100_000;
    let sign = if (wds / 10_000) % 10 > 0 { '+' } else { '-' };
    let dec = wds % 10_000;
    format!("{ra:05}{sign}{dec:04}")
}

/// NGC/IC numbers with an optional component letter A–I packed in the low
/// decimal digit.
pub(crate) fn ngcic_from_str(s: &str) -> Option<i64> {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let num: i64 = s[..split].parse().ok()?;
    let ext = match s[split..].chars().next() {
        Some(c @ 'A'..='I') => i64::from(c as u8 - b'A') + 1,
        Some(c @ 'a'..='i') => i64::from(c as u8 - b'a') + 1,
        Some(_) => return None,
        None => 0,
    };
    if (0..=7_840).contains(&num) {
        Some(num * 10 + ext)
    } else {
        None
    }
}

pub(crate) fn ngcic_to_string(ngcic: i64) -> String {
    let num = ngcic / 10;
    let ext = ngcic % 10;
    if ext > 0 {
        format!("{num}{}", (b'A' + (ext - 1) as u8) as char)
    } else {
        format!("{num}")
    }
}

/// PNG/PK planetary-nebula positional codes: packed galactic longitude and
/// latitude to one-tenth degree, `lon10·10⁴ + sign·10³ + lat10`.
pub(crate) fn pngpk_from_str(s: &str) -> Option<i64> {
    // Some historical PK listings put a space where the latitude decimal
    // point belongs; patch it before parsing.
    let mut s = s.to_owned();
    if s.len() >= 2 {
        let at = s.len() - 2;
        if s.as_bytes()[at] == b' ' {
            s.replace_range(at..at + 1, ".");
        }
    }
    let sign_at = s[1..].find(['+', '-']).map(|p| p + 1)?;
    let lon: f64 = s[..sign_at].parse().ok()?;
    let sign = if s.as_bytes()[sign_at] == b'+' { 1_i64 } else { 0 };
    let lat: f64 = s[sign_at + 1..].parse().ok()?;

    let londec = (lon * 10.0 + 0.1) as i64;
    let latdec = (lat * 10.0 + 0.1) as i64;
    if (0..3_600).contains(&londec) && (0..900).contains(&latdec) {
        Some(londec * 10_000 + sign * 1_000 + latdec)
    } else {
        None
    }
}

pub(crate) fn pngpk_to_string(pngpk: i64, is_png: bool) -> String {
    let londec = pngpk / 10_000;
    let sign = if (pngpk / 1_000) % 10 > 0 { '+' } else { '-' };
    let latdec = pngpk % 1_000;
    if is_png {
        format!(
            "{:05.1}{}{:04.1}",
            londec as f64 / 10.0,
            sign,
            latdec as f64 / 10.0
        )
    } else {
        format!(
            "{:03.0}{}{:04.1}",
            londec as f64 / 10.0,
            sign,
            latdec as f64 / 10.0
        )
    }
}

/// Gliese-Jahreiss numbers carry one decimal digit and an optional component
/// letter A–D: `number10·10 + component`.
pub(crate) fn gj_from_str(s: &str) -> Option<i64> {
    let comp_at = s.find(['A', 'B', 'C', 'D']).unwrap_or(s.len());
    let num: f64 = s[..comp_at].trim().parse().ok()?;
    let comp = match s[comp_at..].chars().next() {
        Some('A') => 1,
        Some('B') => 2,
        Some('C') => 3,
        Some('D') => 4,
        _ => 0,
    };
    let d = (num * 10.0 + 0.1) as i64;
    Some(d * 10 + comp)
}

pub(crate) fn gj_to_string(gj: i64) -> String {
    let d = gj / 10;
    let comp = match gj % 10 {
        1 => "A",
        2 => "B",
        3 => "C",
        4 => "D",
        _ => "",
    };
    if d % 10 == 0 {
        format!("{}{comp}", d / 10)
    } else {
        format!("{:.1}{comp}", d as f64 / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn gcvs_sequence_is_a_bijection() {
        // Every code from R (1) up to V999 must survive the round trip.
        for n in 1..1_000 {
            let s = gcvs_to_string(n);
            assert_eq!(
                gcvs_from_str(&s),
                Some(n),
                "GCVS {n} formatted as {s} did not round-trip"
            );
        }
    }

    #[rstest]
    #[case("R", 1)]
    #[case("Z", 9)]
    #[case("RR", 10)]
    #[case("RZ", 18)]
    #[case("SS", 19)]
    #[case("ZZ", 54)]
    #[case("AA", 55)]
    #[case("QZ", 334)]
    #[case("V335", 335)]
    fn gcvs_known_codes(#[case] s: &str, #[case] n: i64) {
        assert_eq!(gcvs_from_str(s), Some(n));
        assert_eq!(gcvs_to_string(n), s);
    }

    #[test]
    fn gcvs_never_emits_the_letter_j() {
        for n in 55..335 {
            let s = gcvs_to_string(n);
            assert!(!s.contains('J'), "GCVS {n} rendered as {s}");
        }
    }

    #[rstest]
    #[case("+38 3238", "+38 3238")]
    #[case("-24 12010", "-24 12010")]
    #[case("+00 1234a", "+00 1234a")]
    #[case("-0 989", "-00 989")]
    fn dm_round_trip(#[case] input: &str, #[case] canonical: &str) {
        let dm = dm_from_str(input).unwrap();
        assert_eq!(dm_to_string(dm), canonical);
    }

    #[test]
    fn dm_preserves_sign_of_zone_zero() {
        let north = dm_from_str("+00 30").unwrap();
        let south = dm_from_str("-00 30").unwrap();
        assert_ne!(north, south);
        assert!(dm_to_string(north).starts_with('+'));
        assert!(dm_to_string(south).starts_with('-'));
    }

    #[test]
    fn bayer_letters_cover_greek_latin_lower_and_upper() {
        assert_eq!(bayer_from_str("alpha"), Some(1));
        assert_eq!(bayer_from_str("alp"), Some(1));
        assert_eq!(bayer_from_str("omega"), Some(24));
        assert_eq!(bayer_from_str("b"), Some(26));
        assert_eq!(bayer_from_str("G"), Some(57));
        assert_eq!(bayer_from_str("R"), None, "R belongs to the GCVS sequence");
        for bay in 1..=67 {
            let s = bayer_to_string(bay);
            assert_eq!(bayer_from_str(&s), Some(bay));
        }
    }

    #[test]
    fn ngcic_component_letters() {
        assert_eq!(ngcic_from_str("2070"), Some(20_700));
        assert_eq!(ngcic_from_str("2070A"), Some(20_701));
        assert_eq!(ngcic_to_string(20_701), "2070A");
        assert_eq!(ngcic_from_str("9999"), None);
    }

    #[test]
    fn wds_positional_codes() {
        let wds = wds_from_str("06451-1643").unwrap();
        assert_eq!(wds_to_string(wds), "06451-1643");
        let north = wds_from_str("00084+2905").unwrap();
        assert_eq!(wds_to_string(north), "00084+2905");
    }

    #[test]
    fn pngpk_tenth_degree_packing() {
        let png = pngpk_from_str("036.1-57.1").unwrap();
        assert_eq!(png, 361 * 10_000 + 571);
        assert_eq!(pngpk_to_string(png, true), "036.1-57.1");
        // The historical space-for-decimal-point quirk.
        assert_eq!(pngpk_from_str("036.1-57 1"), Some(png));
    }

    #[test]
    fn gj_decimal_and_component() {
        assert_eq!(gj_to_string(gj_from_str("559A").unwrap()), "559A");
        assert_eq!(gj_to_string(gj_from_str("411").unwrap()), "411");
        assert_eq!(gj_to_string(gj_from_str("234.1").unwrap()), "234.1");
    }

    #[test]
    fn constellation_tables_agree() {
        assert_eq!(constellation_index("And"), Some(1));
        assert_eq!(constellation_index("Vul"), Some(88));
        assert_eq!(constellation_index("Ori"), Some(60));
        for i in 1..=88 {
            let abbr = constellation_abbreviation(i).unwrap();
            assert_eq!(constellation_index(abbr), Some(i as u8));
        }
    }
}
