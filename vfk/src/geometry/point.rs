//! Résolution des points (SOBR, OBBP, SPOL)

use geo::{Coord, Geometry};

use crate::block::DataBlock;
use crate::layout::Extent;
use crate::types::Record;
use crate::VfkError;

/// Colonne Y source (devient -X)
pub const COLUMN_Y: &str = "SOURADNICE_Y";
/// Colonne X source (devient -Y)
pub const COLUMN_X: &str = "SOURADNICE_X";

/// Construit la coordonnée d'un enregistrement de point.
///
/// Le système local (Křovák) a ses axes orientés sud/ouest : x = -Y, y = -X.
pub fn load_point(record: &Record, extent: Option<&Extent>) -> Result<Coord, VfkError> {
    let y = record
        .get(COLUMN_Y)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| VfkError::degenerate(format!("missing {}", COLUMN_Y)))?;
    let x = record
        .get(COLUMN_X)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| VfkError::degenerate(format!("missing {}", COLUMN_X)))?;

    let coord = Coord { x: -y, y: -x };

    if let Some(extent) = extent {
        if !extent.contains(coord) {
            return Err(VfkError::degenerate(format!(
                "point ({}, {}) outside extent",
                coord.x, coord.y
            )));
        }
    }

    Ok(coord)
}

/// Retrouve les coordonnées d'un point déjà chargé
pub fn resolve_point(points: &DataBlock, id: u64) -> Result<Coord, VfkError> {
    match points.feature(id).and_then(|f| f.geometry()) {
        Some(Geometry::Point(p)) => Ok(p.0),
        _ => Err(VfkError::PointNotFound { point_id: id }),
    }
}
