//! Export vers GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use vfk::Feature;

/// CRS des données VFK (S-JTSK / Krovak East North)
pub const CRS_NAME: &str = "urn:ogc:def:crs:EPSG::5514";

/// Exporte des features en GeoJSON, retourne le nombre de features écrites.
///
/// Les features sans géométrie sont écrites avec `"geometry":null`.
pub fn export_to_geojson(features: &[Feature], output_path: &Path) -> Result<usize> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"{}"}}}},"features":["#,
        CRS_NAME
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, feature)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(features.len())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, feature: &Feature) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":{},"geometry":"#, feature.fid())?;

    match feature.geometry() {
        Some(geometry) => {
            let mut geom_buf = Vec::new();
            let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
            geometry.process_geom(&mut geom_writer)?;
            writer.write_all(&geom_buf)?;
        }
        None => write!(writer, "null")?,
    }

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, feature.properties())?;
    write!(writer, "}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use std::io::Cursor;
    use vfk::{Record, Value};

    fn feature(fid: u64, geometry: Option<Geometry>) -> Feature {
        let properties: Record = [
            ("ID".to_string(), Value::Integer(fid as i64)),
            ("NAZEV".to_string(), Value::Text("Lhota \"u\" Brna".to_string())),
            ("VYMERA".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let mut feature = Feature::new(fid, properties);
        feature.set_geometry(geometry);
        feature
    }

    fn to_json(feature: &Feature) -> serde_json::Value {
        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, feature).unwrap();
        serde_json::from_slice(&buffer.into_inner()).unwrap()
    }

    #[test]
    fn test_write_feature() {
        let json = to_json(&feature(
            12,
            Some(Geometry::Point(Point::new(-745000.0, -1045000.0))),
        ));

        assert_eq!(json["type"], "Feature");
        assert_eq!(json["id"], 12);
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["properties"]["NAZEV"], "Lhota \"u\" Brna");
        assert!(json["properties"]["VYMERA"].is_null());
    }

    #[test]
    fn test_write_feature_without_geometry() {
        let json = to_json(&feature(3, None));
        assert!(json["geometry"].is_null());
        assert_eq!(json["properties"]["ID"], 3);
    }

    #[test]
    fn test_properties_in_column_order() {
        let properties: Record = [
            ("VYMERA".to_string(), Value::Integer(120)),
            ("ID".to_string(), Value::Integer(5)),
            ("KMENOVE_CISLO_PAR".to_string(), Value::Integer(18)),
        ]
        .into_iter()
        .collect();
        let feature = Feature::new(5, properties);

        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &feature).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(text.ends_with(r#""properties":{"ID":5,"KMENOVE_CISLO_PAR":18,"VYMERA":120}}"#));
    }

    #[test]
    fn test_export_to_geojson() {
        let features = vec![
            feature(1, Some(Geometry::Point(Point::new(-745000.0, -1045000.0)))),
            feature(2, None),
        ];

        let output_path = std::env::temp_dir().join("vfk_export_test_geozero.geojson");
        let written = export_to_geojson(&features, &output_path).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&output_path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["crs"]["properties"]["name"], CRS_NAME);
        assert_eq!(json["features"].as_array().unwrap().len(), 2);

        std::fs::remove_file(output_path).ok();
    }
}
