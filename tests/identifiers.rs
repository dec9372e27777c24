/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Identifier-algebra properties: for every catalog and every valid
//! identifier, `parse(format(id)) == id`, the packed value recovers its
//! parts, and the total order agrees with `(catalog, ident)`.

use skycore::ident::{Catalog, Identifier};

fn assert_round_trip(id: Identifier) {
    let formatted = id.to_string();
    let reparsed = Identifier::parse(&formatted)
        .unwrap_or_else(|| panic!("{formatted:?} did not reparse"));
    assert_eq!(id, reparsed, "{formatted} reparsed as {reparsed}");
}

#[test]
fn plain_numeric_catalogs_round_trip() {
    for catalog in [
        Catalog::Hr,
        Catalog::Hd,
        Catalog::Sao,
        Catalog::Hip,
        Catalog::Melotte,
        Catalog::Lbn,
        Catalog::Pgc,
        Catalog::Ugc,
        Catalog::Ugca,
    ] {
        for ident in [1_i64, 7, 42, 7001, 48_915, 151_881] {
            assert_round_trip(Identifier::new(catalog, ident));
        }
    }
}

#[test]
fn messier_and_caldwell_round_trip_over_their_full_ranges() {
    for m in 1..=110 {
        assert_round_trip(Identifier::new(Catalog::Messier, m));
    }
    for c in 1..=109 {
        assert_round_trip(Identifier::new(Catalog::Caldwell, c));
    }
}

#[test]
fn bayer_identifiers_with_superscripts_round_trip() {
    // Greek letters 1..24, lowercase 25..50, uppercase 51..67; superscripts
    // 0..4; a sample of constellations.
    for bay in (1..=67).step_by(3) {
        for num in 0..=4 {
            for con in [1_i64, 14, 19, 60, 88] {
                let id = Identifier::new(Catalog::Bayer, (bay * 100 + num) * 100 + con);
                assert_round_trip(id);
            }
        }
    }
}

#[test]
fn alpha2_centauri_is_distinct_from_alpha_centauri() {
    let plain = Identifier::parse("alpha Cen").unwrap();
    let component = Identifier::parse("alpha2 Cen").unwrap();
    assert_ne!(plain, component);
    assert_eq!(component.to_string(), "alpha2 Cen");
}

#[test]
fn flamsteed_round_trips() {
    for num in [1_i64, 9, 61, 95] {
        for con in [5_i64, 31, 60] {
            assert_round_trip(Identifier::new(Catalog::Flamsteed, num * 100 + con));
        }
    }
}

#[test]
fn gcvs_round_trips_across_the_letter_sequence() {
    // R..Z, RR..ZZ, AA..QZ, V335 onward, in several constellations.
    for var in (1..=334).chain([335, 336, 1000, 5000]) {
        for con in [1_i64, 52, 72] {
            assert_round_trip(Identifier::new(Catalog::Gcvs, var * 100 + con));
        }
    }
}

#[test]
fn durchmusterung_catalogs_round_trip_with_suffixes() {
    for catalog in [Catalog::Bd, Catalog::Cd, Catalog::Cp] {
        for sign in [0_i64, 1] {
            for zone in [0_i64, 5, 38, 89] {
                for num in [1_i64, 989, 3238, 12_010] {
                    for suffix in 0..=5 {
                        let packed =
                            sign * 100_000_000 + zone * 1_000_000 + num * 10 + suffix;
                        assert_round_trip(Identifier::new(catalog, packed));
                    }
                }
            }
        }
    }
}

#[test]
fn wds_round_trips_all_quadrants() {
    for ra in [0_i64, 84, 6_451, 12_345, 23_595] {
        for sign in [0_i64, 1] {
            for dec in [0_i64, 905, 1_643, 8_959] {
                let packed = ra * 100_000 + sign * 10_000 + dec;
                assert_round_trip(Identifier::new(Catalog::Wds, packed));
            }
        }
    }
}

#[test]
fn ngc_ic_round_trip_with_component_letters() {
    for catalog in [Catalog::Ngc, Catalog::Ic] {
        for num in [1_i64, 224, 2070, 7000, 7840] {
            for ext in 0..=9 {
                assert_round_trip(Identifier::new(catalog, num * 10 + ext));
            }
        }
    }
}

#[test]
fn png_positional_codes_round_trip() {
    for lon10 in [0_i64, 5, 361, 1_800, 3_599] {
        for sign in [0_i64, 1] {
            for lat10 in [0_i64, 9, 571, 899] {
                let packed = lon10 * 10_000 + sign * 1_000 + lat10;
                assert_round_trip(Identifier::new(Catalog::Png, packed));
            }
        }
    }
}

#[test]
fn gliese_numbers_round_trip_with_components() {
    for d in [110_i64, 2340, 5590, 9999] {
        for comp in 0..=4 {
            assert_round_trip(Identifier::new(Catalog::Gj, d * 10 + comp));
        }
    }
}

#[test]
fn solar_system_designations_round_trip() {
    for n in [1_i64, 4, 433, 101_955] {
        assert_round_trip(Identifier::new(Catalog::AsteroidNumber, n));
    }
    for n in [1_i64, 2, 67] {
        assert_round_trip(Identifier::new(Catalog::CometNumber, n));
    }
}

#[test]
fn spec_examples_preserve_their_strings() {
    for text in ["alpha CMa", "NGC 7000", "BD +38 3238"] {
        let id = Identifier::parse(text).unwrap();
        assert_eq!(id.to_string(), text);
    }
}

#[test]
fn packed_order_is_catalog_then_ident() {
    let mut ids = vec![
        Identifier::new(Catalog::Ugca, 1),
        Identifier::new(Catalog::Hr, 9_000),
        Identifier::new(Catalog::Hr, 10),
        Identifier::new(Catalog::JplPlanet, 4),
        Identifier::new(Catalog::Messier, 42),
    ];
    ids.sort();
    let catalogs: Vec<Catalog> = ids.iter().map(|id| id.catalog()).collect();
    assert_eq!(
        catalogs,
        [
            Catalog::JplPlanet,
            Catalog::Hr,
            Catalog::Hr,
            Catalog::Messier,
            Catalog::Ugca
        ]
    );
    assert!(ids[1].ident() < ids[2].ident());
}

#[test]
fn case_matters_for_star_letters() {
    // "mu Cep" is a Bayer star; "MU Cep" is a GCVS variable.
    let bayer = Identifier::parse("mu Cep").unwrap();
    let gcvs = Identifier::parse("MU Cep").unwrap();
    assert_eq!(bayer.catalog(), Catalog::Bayer);
    assert_eq!(gcvs.catalog(), Catalog::Gcvs);
    assert_ne!(bayer, gcvs);
}
