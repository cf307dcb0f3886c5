//! Tests d'intégration sur un extrait VFK réaliste (tests/fixtures/parcels.json)
//!
//! Contenu du fixture :
//! - PAR 1001 : carré de 20 m avec un trou de 5 m (la parcelle 1004)
//! - PAR 1002 : carré voisin qui partage la ligne HP 202
//! - PAR 1003 : chaîne de lignes ouverte (invalide)
//! - BUD 5001 : bâtiment rectangulaire, BUD 5002 : demi-disque (arc)
//! - DPM 401 : ligne dont un point est hors de l'emprise S-JTSK
//!
//! L'emprise n'est contrôlée que si le layout la déclare (`sjtsk_layout`).

use std::path::{Path, PathBuf};

use geo::{Area, Geometry, Polygon};
use vfk::{build, build_store, Extent, GeometryState, Layout, Reader, RecordStore, VfkError};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/parcels.json")
}

fn sjtsk_layout() -> Layout {
    Layout {
        extent: Some(Extent::SJTSK),
        ..Layout::default()
    }
}

fn polygon<'a>(result: &'a vfk::BuildResult, block: &str, fid: u64) -> &'a Polygon {
    match result
        .block(block)
        .and_then(|b| b.feature(fid))
        .and_then(|f| f.geometry())
    {
        Some(Geometry::Polygon(p)) => p,
        other => panic!("{block}:{fid} should be a polygon, got {other:?}"),
    }
}

#[test]
fn test_build_fixture() {
    let result = build(&fixture_path(), &sjtsk_layout()).unwrap();

    for stats in &result.stats {
        println!(
            "{}: {} features, {} valid, {} invalid",
            stats.block, stats.features, stats.valid, stats.invalid
        );
    }

    let stats = |name: &str| {
        result
            .stats
            .iter()
            .find(|s| s.block == name)
            .unwrap_or_else(|| panic!("no stats for {name}"))
            .clone()
    };

    assert_eq!((stats("SOBR").valid, stats("SOBR").invalid), (18, 1));
    assert_eq!((stats("SBP").valid, stats("SBP").invalid), (18, 1));
    assert_eq!((stats("HP").valid, stats("HP").invalid), (12, 0));
    assert_eq!((stats("OB").valid, stats("OB").invalid), (6, 0));
    assert_eq!((stats("DPM").valid, stats("DPM").invalid), (0, 1));
    assert_eq!((stats("PAR").valid, stats("PAR").invalid), (3, 1));
    assert_eq!((stats("BUD").valid, stats("BUD").invalid), (2, 0));

    // les blocs absents du fichier ne sont pas dans les statistiques
    assert!(result.stats.iter().all(|s| s.block != "SBPG"));
    assert_eq!(result.invalid_count(), 4);
}

#[test]
fn test_build_fixture_without_extent() {
    let result = build(&fixture_path(), &Layout::default()).unwrap();

    let stats = |name: &str| {
        result
            .stats
            .iter()
            .find(|s| s.block == name)
            .unwrap_or_else(|| panic!("no stats for {name}"))
            .clone()
    };

    // sans emprise, le point 19 est conservé et la ligne DPM 401 construite
    assert_eq!((stats("SOBR").valid, stats("SOBR").invalid), (19, 0));
    assert_eq!((stats("SBP").valid, stats("SBP").invalid), (19, 0));
    assert_eq!((stats("DPM").valid, stats("DPM").invalid), (1, 0));
    assert_eq!((stats("PAR").valid, stats("PAR").invalid), (3, 1));
    assert_eq!(result.invalid_count(), 1);
    assert!(result
        .errors
        .iter()
        .all(|e| !matches!(e.error, VfkError::PointNotFound { .. })));
}

#[test]
fn test_parcel_with_hole() {
    let result = build(&fixture_path(), &Layout::default()).unwrap();

    let parcel = polygon(&result, "PAR", 1001);
    assert_eq!(parcel.interiors().len(), 1);
    assert!((parcel.unsigned_area() - 375.0).abs() < 1e-3);

    // la parcelle enclavée est construite à partir des mêmes lignes
    let enclave = polygon(&result, "PAR", 1004);
    assert!(enclave.interiors().is_empty());
    assert!((enclave.unsigned_area() - 25.0).abs() < 1e-3);

    let neighbour = polygon(&result, "PAR", 1002);
    assert!((neighbour.unsigned_area() - 400.0).abs() < 1e-3);
}

#[test]
fn test_coordinates_are_negated() {
    let result = build(&fixture_path(), &Layout::default()).unwrap();
    let point = result
        .block("SOBR")
        .and_then(|b| b.feature(1))
        .and_then(|f| f.geometry());
    match point {
        Some(Geometry::Point(p)) => {
            assert_eq!(p.x(), -745000.0);
            assert_eq!(p.y(), -1045000.0);
        }
        other => panic!("expected a point, got {other:?}"),
    }
}

#[test]
fn test_invalid_features_are_reported() {
    let result = build(&fixture_path(), &sjtsk_layout()).unwrap();

    for error in &result.errors {
        println!("  {error}");
    }

    let open_parcel = result
        .errors
        .iter()
        .find(|e| e.block == "PAR" && e.fid == 1003)
        .expect("PAR 1003 should be reported");
    assert!(matches!(open_parcel.error, VfkError::MalformedTopology { .. }));

    // le point 19 n'est signalé que par le bloc de lignes
    let not_found: Vec<_> = result
        .errors
        .iter()
        .filter(|e| matches!(e.error, VfkError::PointNotFound { point_id: 19 }))
        .collect();
    assert_eq!(not_found.len(), 1);
    assert_eq!(not_found[0].block, "DPM");
    assert!(result
        .errors
        .iter()
        .any(|e| e.block == "DPM" && matches!(e.error, VfkError::LineTooShort { line_id: 401, .. })));

    let par = result.block("PAR").unwrap();
    assert_eq!(par.feature(1003).unwrap().geometry_state(), &GeometryState::Missing);
    // les attributs restent disponibles
    assert!(par.feature(1003).unwrap().property("KMENOVE_CISLO_PAR").is_some());
}

#[test]
fn test_arc_building() {
    let result = build(&fixture_path(), &Layout::default()).unwrap();

    let building = polygon(&result, "BUD", 5002);
    // demi-disque de rayon 5 m
    let expected = std::f64::consts::PI * 25.0 / 2.0;
    assert!((building.unsigned_area() - expected).abs() < 0.1);
    assert!(building.exterior().0.len() > 40);

    let rectangle = polygon(&result, "BUD", 5001);
    assert!((rectangle.unsigned_area() - 100.0).abs() < 1e-3);
}

#[test]
fn test_storage_order_does_not_matter() {
    let reference = build(&fixture_path(), &Layout::default()).unwrap();

    let mut store = RecordStore::from_path(&fixture_path()).unwrap();
    for name in ["SOBR", "HP", "OB", "PAR", "BUD"] {
        store.blocks.get_mut(name).unwrap().reverse();
    }
    let shuffled = build_store(store, &Layout::default()).unwrap();

    for (block, fid) in [("PAR", 1001), ("PAR", 1002), ("PAR", 1004), ("BUD", 5001), ("BUD", 5002)] {
        let a = polygon(&reference, block, fid);
        let b = polygon(&shuffled, block, fid);
        assert!((a.unsigned_area() - b.unsigned_area()).abs() < 1e-3, "{block}:{fid}");
        assert_eq!(a.interiors().len(), b.interiors().len(), "{block}:{fid}");
    }
    assert_eq!(reference.invalid_count(), shuffled.invalid_count());
}

#[test]
fn test_lazy_building_geometry() {
    let store = RecordStore::from_path(&fixture_path()).unwrap();
    let mut reader = Reader::new(store, Layout::default()).unwrap();

    let geometry = reader.feature_geometry("BUD", 5001).unwrap();
    assert!(matches!(geometry, Some(Geometry::Polygon(_))));

    assert!(reader.block("OB").unwrap().is_geometry_loaded());
    assert!(!reader.block("BUD").unwrap().is_geometry_loaded());
    assert!(!reader.block("HP").unwrap().is_geometry_loaded());
    assert!(!reader.block("PAR").unwrap().is_geometry_loaded());
}

#[test]
fn test_attribute_blocks_are_kept() {
    let result = build(&fixture_path(), &Layout::default()).unwrap();
    let katuze = result.block("KATUZE").expect("attribute block should be kept");
    assert_eq!(katuze.len(), 1);
    assert_eq!(
        katuze.features()[0].geometry_state(),
        &GeometryState::Pending
    );
}

#[test]
fn test_missing_file() {
    let err = build(Path::new("does-not-exist.json"), &Layout::default()).unwrap_err();
    assert!(matches!(err, VfkError::Io(_)));
}
