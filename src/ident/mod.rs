/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The identifier algebra: every common astronomical catalog number packed
//! into a single totally-ordered 64-bit integer, with bidirectional string
//! conversion.
//!
//! The packing is `catalog · 10¹⁶ + ident`. Comparing packed values agrees
//! with `(catalog, ident)` lexicographic order because every per-catalog
//! identifier is smaller than 10¹⁶.

mod codec;

use crate::objects::ObjectKind;
use codec::{
    bayer_from_str, bayer_to_string, dm_from_str, dm_to_string, gcvs_from_str, gcvs_to_string,
    gj_from_str, gj_to_string, ngcic_from_str, ngcic_to_string, pngpk_from_str, pngpk_to_string,
    wds_from_str, wds_to_string, CONSTELLATIONS,
};
use core::fmt;
use serde_derive::{Deserialize, Serialize};

pub use codec::{constellation_abbreviation, constellation_index};

const CATALOG_FACTOR: i64 = 10_000_000_000_000_000;

/// Astronomical catalogs known to the identifier algebra. The discriminants
/// are the packed catalog codes and must never be renumbered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum Catalog {
    Unknown = 0,

    /// JPL NAIF planet/moon identifiers (Mercury = 1, Venus = 2, etc.)
    JplPlanet = 1,
    /// Numbered asteroids (Ceres = 1, Pallas = 2, etc.)
    AsteroidNumber = 2,
    /// Numbered periodic comets (Halley = 1, Encke = 2, etc.)
    CometNumber = 3,
    /// NORAD satellite catalog (ISS = 25544, HST = 20580, etc.)
    NoradSatellite = 4,

    /// Bayer star letters (alpha CMa, etc.)
    Bayer = 10,
    /// Flamsteed star numbers (9 CMa, etc.)
    Flamsteed = 11,
    /// General Catalog of Variable Stars (R And, etc.)
    Gcvs = 12,
    /// Harvard Revised (Yale Bright Star) catalog
    Hr = 13,
    /// Gliese-Jahreiss Catalog of Nearby Stars
    Gj = 14,
    /// Henry Draper star catalog
    Hd = 15,
    /// Smithsonian Astrophysical Observatory star catalog
    Sao = 16,
    /// Bonner Durchmusterung star catalog
    Bd = 17,
    /// Cordoba Durchmusterung star catalog
    Cd = 18,
    /// Cape Photographic Durchmusterung star catalog
    Cp = 19,
    /// Hipparcos star catalog
    Hip = 20,
    /// Washington Double Star catalog
    Wds = 21,

    /// Messier deep sky objects
    Messier = 30,
    /// Caldwell deep sky objects
    Caldwell = 31,
    /// New General Catalog of deep sky objects
    Ngc = 32,
    /// Index Catalog of deep sky objects
    Ic = 33,
    /// Melotte Catalog of open clusters
    Melotte = 34,
    /// Lynds Bright Nebula catalog
    Lbn = 35,
    /// Galactic Planetary Nebulae (Strasbourg-ESO)
    Png = 36,
    /// Perek-Kohoutek Catalog (planetary nebulae)
    Pk = 37,
    /// Principal Galaxy Catalog
    Pgc = 38,
    /// Uppsala Galaxy Catalog
    Ugc = 39,
    /// Uppsala Galaxy Catalog Appendix
    Ugca = 40,
}

impl Catalog {
    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn from_code(code: i64) -> Catalog {
        match code {
            1 => Catalog::JplPlanet,
            2 => Catalog::AsteroidNumber,
            3 => Catalog::CometNumber,
            4 => Catalog::NoradSatellite,
            10 => Catalog::Bayer,
            11 => Catalog::Flamsteed,
            12 => Catalog::Gcvs,
            13 => Catalog::Hr,
            14 => Catalog::Gj,
            15 => Catalog::Hd,
            16 => Catalog::Sao,
            17 => Catalog::Bd,
            18 => Catalog::Cd,
            19 => Catalog::Cp,
            20 => Catalog::Hip,
            21 => Catalog::Wds,
            30 => Catalog::Messier,
            31 => Catalog::Caldwell,
            32 => Catalog::Ngc,
            33 => Catalog::Ic,
            34 => Catalog::Melotte,
            35 => Catalog::Lbn,
            36 => Catalog::Png,
            37 => Catalog::Pk,
            38 => Catalog::Pgc,
            39 => Catalog::Ugc,
            40 => Catalog::Ugca,
            _ => Catalog::Unknown,
        }
    }
}

/// A packed catalog identifier. The null identifier (zero) is the sentinel
/// for "no identifier"; it formats as the empty string.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Identifier(i64);

impl Identifier {
    pub const NULL: Identifier = Identifier(0);

    /// Packs a catalog and a per-catalog identifier.
    pub const fn new(catalog: Catalog, ident: i64) -> Self {
        Self(catalog.code() * CATALOG_FACTOR + ident)
    }

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> i64 {
        self.0
    }

    pub const fn catalog(self) -> Catalog {
        Catalog::from_code(self.0 / CATALOG_FACTOR)
    }

    pub const fn ident(self) -> i64 {
        self.0 % CATALOG_FACTOR
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Parses an identifier string (`"M 42"`, `"alpha CMa"`, `"HR 7001"`,
    /// `"NGC 7992"`, …). Returns `None` when no catalog recognizes the
    /// string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::parse_with_kind(s, None)
    }

    /// Parses an identifier string, using the object kind (when known) to
    /// resolve bare numbers: `"4"` is Mars for a planet but asteroid (4) Vesta
    /// for an asteroid and NORAD 4 for a satellite.
    pub fn parse_with_kind(s: &str, kind: Option<ObjectKind>) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Messier and Caldwell numbers: a bare prefix letter then digits.
        if let Some(rest) = s.strip_prefix('M') {
            if let Ok(m) = rest.trim().parse::<i64>() {
                if (1..=110).contains(&m) {
                    return Some(Self::new(Catalog::Messier, m));
                }
            }
        }
        if let Some(rest) = s.strip_prefix('C') {
            if let Ok(c) = rest.trim().parse::<i64>() {
                if (1..=109).contains(&c) {
                    return Some(Self::new(Catalog::Caldwell, c));
                }
            }
        }

        // Deep-sky catalogs with dedicated codecs.
        if let Some(rest) = s.strip_prefix("NGC") {
            if let Some(n) = ngcic_from_str(rest.trim()) {
                return Some(Self::new(Catalog::Ngc, n));
            }
        }
        if let Some(rest) = s.strip_prefix("IC") {
            if let Some(n) = ngcic_from_str(rest.trim()) {
                return Some(Self::new(Catalog::Ic, n));
            }
        }
        if let Some(rest) = s.strip_prefix("Mel") {
            if let Ok(n) = rest.trim().parse::<i64>() {
                return Some(Self::new(Catalog::Melotte, n));
            }
        }
        if let Some(rest) = s.strip_prefix("LBN") {
            if let Ok(n) = rest.trim().parse::<i64>() {
                return Some(Self::new(Catalog::Lbn, n));
            }
        }
        if let Some(rest) = s.strip_prefix("PNG") {
            if let Some(n) = pngpk_from_str(rest.trim()) {
                return Some(Self::new(Catalog::Png, n));
            }
        }
        if let Some(rest) = s.strip_prefix("PK") {
            if let Some(n) = pngpk_from_str(rest.trim()) {
                return Some(Self::new(Catalog::Pk, n));
            }
        }
        if let Some(rest) = s.strip_prefix("PGC") {
            if let Ok(n) = rest.trim().parse::<i64>() {
                return Some(Self::new(Catalog::Pgc, n));
            }
        }
        // UGCA before UGC: the longer prefix must win.
        if let Some(rest) = s.strip_prefix("UGCA") {
            if let Ok(n) = rest.trim().parse::<i64>() {
                return Some(Self::new(Catalog::Ugca, n));
            }
        }
        if let Some(rest) = s.strip_prefix("UGC") {
            if let Ok(n) = rest.trim().parse::<i64>() {
                return Some(Self::new(Catalog::Ugc, n));
            }
        }

        // Star catalogs with plain numbers after the prefix.
        for (prefix, catalog) in [
            ("HR", Catalog::Hr),
            ("HD", Catalog::Hd),
            ("SAO", Catalog::Sao),
            ("HIP", Catalog::Hip),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                if let Ok(n) = rest.trim().parse::<i64>() {
                    return Some(Self::new(catalog, n));
                }
            }
        }

        // Durchmusterungs. "SD" (Southern Durchmusterung) maps onto BD.
        for (prefix, catalog) in [
            ("BD", Catalog::Bd),
            ("SD", Catalog::Bd),
            ("CD", Catalog::Cd),
            ("CP", Catalog::Cp),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                if let Some(dm) = dm_from_str(rest.trim()) {
                    return Some(Self::new(catalog, dm));
                }
            }
        }

        if let Some(rest) = s.strip_prefix("WDS") {
            if let Some(wds) = wds_from_str(rest.trim()) {
                return Some(Self::new(Catalog::Wds, wds));
            }
        }

        // Gliese-Jahreiss, under its several historical prefixes.
        for prefix in ["GJ", "Gl", "NN", "Wo"] {
            if let Some(rest) = s.strip_prefix(prefix) {
                if let Some(gj) = gj_from_str(rest.trim()) {
                    return Some(Self::new(Catalog::Gj, gj));
                }
            }
        }

        // Two tokens where the second is a constellation abbreviation:
        // GCVS variable designation, Flamsteed number, or Bayer letter.
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() >= 2 {
            if let Some(con) = constellation_index(tokens[1]) {
                let con = i64::from(con);
                if let Some(var) = gcvs_from_str(tokens[0]) {
                    return Some(Self::new(Catalog::Gcvs, var * 100 + con));
                }
                let first = tokens[0];
                if first.starts_with(|c: char| c.is_ascii_digit()) {
                    if let Ok(num) = first.parse::<i64>() {
                        return Some(Self::new(Catalog::Flamsteed, num * 100 + con));
                    }
                }
                // Bayer letter with an optional numeric superscript.
                let digit_at = first.find(|c: char| c.is_ascii_digit());
                let (letter, num) = match digit_at {
                    Some(pos) => (&first[..pos], first[pos..].parse::<i64>().unwrap_or(0)),
                    None => (first, 0),
                };
                if let Some(bay) = bayer_from_str(letter) {
                    return Some(Self::new(Catalog::Bayer, (bay * 100 + num) * 100 + con));
                }
            }
        }

        // Asteroid number in parentheses: "(4)".
        if s.starts_with('(') && s.ends_with(')') {
            if let Ok(n) = s[1..s.len() - 1].parse::<i64>() {
                if n > 0 {
                    return Some(Self::new(Catalog::AsteroidNumber, n));
                }
            }
        }

        // Periodic comet number: "1P".
        if let Some(body) = s.strip_suffix('P') {
            if let Ok(n) = body.parse::<i64>() {
                if n > 0 {
                    return Some(Self::new(Catalog::CometNumber, n));
                }
            }
        }

        // A bare number is resolved by the object kind.
        if let Ok(n) = s.parse::<i64>() {
            match kind {
                Some(ObjectKind::Planet) | Some(ObjectKind::Moon) if n >= 0 => {
                    return Some(Self::new(Catalog::JplPlanet, n));
                }
                Some(ObjectKind::Asteroid) if n > 0 => {
                    return Some(Self::new(Catalog::AsteroidNumber, n));
                }
                Some(ObjectKind::Comet) if n > 0 => {
                    return Some(Self::new(Catalog::CometNumber, n));
                }
                Some(ObjectKind::Satellite) if n > 0 => {
                    return Some(Self::new(Catalog::NoradSatellite, n));
                }
                _ => {}
            }
        }

        None
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id = self.ident();
        match self.catalog() {
            Catalog::Unknown => Ok(()),
            Catalog::Bayer => {
                let bay = id / 10_000;
                let num = (id % 10_000) / 100;
                let con = (id % 100) as usize;
                let con = CONSTELLATIONS[con - 1];
                if num > 0 {
                    write!(f, "{}{} {}", bayer_to_string(bay), num, con)
                } else {
                    write!(f, "{} {}", bayer_to_string(bay), con)
                }
            }
            Catalog::Flamsteed => {
                write!(f, "{} {}", id / 100, CONSTELLATIONS[(id % 100) as usize - 1])
            }
            Catalog::Gcvs => write!(
                f,
                "{} {}",
                gcvs_to_string(id / 100),
                CONSTELLATIONS[(id % 100) as usize - 1]
            ),
            Catalog::Hr => write!(f, "HR {id}"),
            Catalog::Hd => write!(f, "HD {id}"),
            Catalog::Sao => write!(f, "SAO {id}"),
            Catalog::Hip => write!(f, "HIP {id}"),
            Catalog::Bd => write!(f, "BD {}", dm_to_string(id)),
            Catalog::Cd => write!(f, "CD {}", dm_to_string(id)),
            Catalog::Cp => write!(f, "CP {}", dm_to_string(id)),
            Catalog::Wds => write!(f, "WDS {}", wds_to_string(id)),
            Catalog::Gj => write!(f, "GJ {}", gj_to_string(id)),
            Catalog::Messier => write!(f, "M {id}"),
            Catalog::Caldwell => write!(f, "C {id}"),
            Catalog::Ngc => write!(f, "NGC {}", ngcic_to_string(id)),
            Catalog::Ic => write!(f, "IC {}", ngcic_to_string(id)),
            Catalog::Melotte => write!(f, "Mel {id}"),
            Catalog::Lbn => write!(f, "LBN {id}"),
            Catalog::Png => write!(f, "PNG {}", pngpk_to_string(id, true)),
            Catalog::Pk => write!(f, "PK {}", pngpk_to_string(id, false)),
            Catalog::Pgc => write!(f, "PGC {id}"),
            Catalog::Ugc => write!(f, "UGC {id}"),
            Catalog::Ugca => write!(f, "UGCA {id}"),
            Catalog::AsteroidNumber => write!(f, "({id})"),
            Catalog::CometNumber => write!(f, "{id}P"),
            Catalog::JplPlanet | Catalog::NoradSatellite => write!(f, "{id}"),
        }
    }
}

/// Adds an identifier to a list when it is non-null and not already present.
/// Returns whether it was added.
pub fn add_identifier(ident: Identifier, idents: &mut Vec<Identifier>) -> bool {
    if !ident.is_null() && !idents.contains(&ident) {
        idents.push(ident);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn pack_unpack_preserves_catalog_and_ident() {
        for catalog in [
            Catalog::JplPlanet,
            Catalog::Bayer,
            Catalog::Hip,
            Catalog::Ugca,
        ] {
            for ident in [0, 1, 42, 9_999_999_999_999_999] {
                let packed = Identifier::new(catalog, ident);
                assert_eq!(packed.catalog(), catalog);
                assert_eq!(packed.ident(), ident);
            }
        }
    }

    #[test]
    fn order_agrees_with_catalog_then_ident() {
        let a = Identifier::new(Catalog::Hr, 9_999);
        let b = Identifier::new(Catalog::Hd, 1);
        assert!(a < b, "HR (13) sorts before HD (15) regardless of ident");
        let c = Identifier::new(Catalog::Hd, 2);
        assert!(b < c);
    }

    #[rstest]
    #[case("HR 7001")]
    #[case("HD 48915")]
    #[case("SAO 151881")]
    #[case("HIP 32349")]
    #[case("alpha CMa")]
    #[case("alpha2 Cen")]
    #[case("61 Cyg")]
    #[case("R And")]
    #[case("RR Lyr")]
    #[case("V335 Sgr")]
    #[case("BD +38 3238")]
    #[case("CD -24 12010")]
    #[case("WDS 06451-1643")]
    #[case("GJ 559A")]
    #[case("M 42")]
    #[case("C 14")]
    #[case("NGC 7000")]
    #[case("NGC 2070A")]
    #[case("IC 434")]
    #[case("Mel 25")]
    #[case("LBN 974")]
    #[case("PNG 036.1-57.1")]
    #[case("PGC 17223")]
    #[case("UGC 12591")]
    #[case("UGCA 281")]
    #[case("(4)")]
    #[case("1P")]
    fn parse_format_round_trip(#[case] text: &str) {
        let id = Identifier::parse(text).unwrap_or_else(|| panic!("could not parse {text}"));
        let formatted = id.to_string();
        let reparsed = Identifier::parse(&formatted)
            .unwrap_or_else(|| panic!("could not reparse {formatted}"));
        assert_eq!(id, reparsed, "{text} -> {formatted} -> {reparsed}");
    }

    #[test]
    fn bare_numbers_resolve_by_kind() {
        assert_eq!(
            Identifier::parse_with_kind("4", Some(ObjectKind::Planet)),
            Some(Identifier::new(Catalog::JplPlanet, 4))
        );
        assert_eq!(
            Identifier::parse_with_kind("25544", Some(ObjectKind::Satellite)),
            Some(Identifier::new(Catalog::NoradSatellite, 25_544))
        );
        assert_eq!(Identifier::parse_with_kind("25544", None), None);
    }

    #[test]
    fn null_identifier_formats_empty() {
        assert_eq!(Identifier::NULL.to_string(), "");
        assert!(Identifier::NULL.is_null());
    }

    #[test]
    fn add_identifier_dedups_and_rejects_null() {
        let mut v = Vec::new();
        let sirius = Identifier::parse("HR 2491").unwrap();
        assert!(add_identifier(sirius, &mut v));
        assert!(!add_identifier(sirius, &mut v));
        assert!(!add_identifier(Identifier::NULL, &mut v));
        assert_eq!(v.len(), 1);
    }
}
