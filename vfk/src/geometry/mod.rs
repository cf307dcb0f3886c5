//! Reconstruction des géométries : points -> lignes -> rings -> polygones

pub mod arc;
pub mod line;
pub mod point;
pub mod polygon;
pub mod ring;

use geo::{Coord, Polygon};

use crate::VfkError;

pub use line::{build_line, split_sequences, BoundaryRecord, Line};
pub use point::{load_point, resolve_point};
pub use polygon::build_polygon;
pub use ring::{assemble_rings, Ring};

/// Assemble les segments d'une feature et construit son polygone
pub fn polygon_from_segments(segments: &[Vec<Coord>]) -> Result<Polygon, VfkError> {
    if segments.is_empty() {
        return Err(VfkError::degenerate("no boundary line"));
    }
    let rings = assemble_rings(segments)?;
    build_polygon(rings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    #[test]
    fn test_polygon_from_segments() {
        let segments = vec![
            seg(&[(1.0, 1.0), (1.0, 0.0)]),
            seg(&[(0.0, 0.0), (0.0, 1.0)]),
            seg(&[(1.0, 0.0), (0.0, 0.0)]),
            seg(&[(0.0, 1.0), (1.0, 1.0)]),
        ];
        let polygon = polygon_from_segments(&segments).unwrap();
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn test_no_segment() {
        assert!(matches!(
            polygon_from_segments(&[]),
            Err(VfkError::EmptyOrDegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_missing_line_geometry() {
        let segments = vec![seg(&[(0.0, 0.0), (1.0, 0.0)]), Vec::new()];
        assert!(matches!(
            polygon_from_segments(&segments),
            Err(VfkError::MalformedTopology { .. })
        ));
    }
}
