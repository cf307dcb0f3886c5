//! Construction des lignes depuis les points de limite (SBP)

use std::ops::Range;

use geo::{Coord, LineString};
use tracing::{debug, warn};

use crate::block::DataBlock;
use crate::feature::Feature;
use crate::geometry::arc::{self, Connection};
use crate::geometry::point::resolve_point;
use crate::layout::BoundaryLayout;
use crate::VfkError;

/// Un point de limite : référence de point et numéro d'ordre dans la ligne
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRecord {
    pub point_id: u64,
    pub sequence: u64,
    pub connection: Option<String>,
}

impl BoundaryRecord {
    /// Lit un point de limite, `None` si l'ID du point ou le numéro d'ordre manque
    pub fn from_feature(feature: &Feature, layout: &BoundaryLayout) -> Option<Self> {
        let point_id = feature.property(&layout.point_key)?.as_u64()?;
        let sequence = feature.property(&layout.sequence)?.as_u64()?;
        let connection = layout
            .connection
            .as_deref()
            .and_then(|column| feature.property(column))
            .and_then(|v| v.as_text());
        Some(Self {
            point_id,
            sequence,
            connection,
        })
    }
}

/// Ligne construite, avec les points qui n'ont pas pu être résolus
#[derive(Debug, Clone)]
pub struct Line {
    pub line_id: u64,
    pub coords: Vec<Coord>,
    pub unresolved: Vec<u64>,
}

impl Line {
    pub fn is_valid(&self) -> bool {
        self.coords.len() >= 2
    }

    pub fn check(&self) -> Result<(), VfkError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(VfkError::LineTooShort {
                line_id: self.line_id,
                points: self.coords.len(),
            })
        }
    }

    pub fn into_line_string(self) -> LineString {
        LineString::new(self.coords)
    }
}

/// Construit la ligne `line_id` à partir de ses points de limite.
///
/// Les enregistrements sont triés par numéro d'ordre, l'ordre de stockage
/// n'a pas d'importance. Les points introuvables sont ignorés ; une ligne
/// de moins de 2 points est retournée quand même (voir [`Line::check`]).
pub fn build_line(line_id: u64, records: &[BoundaryRecord], points: &DataBlock) -> Line {
    let mut ordered: Vec<&BoundaryRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.sequence);

    let mut coords = Vec::with_capacity(ordered.len());
    let mut unresolved = Vec::new();
    for record in &ordered {
        match resolve_point(points, record.point_id) {
            Ok(c) => coords.push(c),
            Err(_) => {
                debug!(line_id, point_id = record.point_id, "Point not found");
                unresolved.push(record.point_id);
            }
        }
    }

    let connection = Connection::from_code(
        ordered
            .first()
            .and_then(|r| r.connection.as_deref()),
    );
    if connection != Connection::Straight && unresolved.is_empty() {
        match arc::linearize(&coords, connection) {
            Some(curve) => coords = curve,
            None => warn!(
                line_id,
                ?connection,
                points = coords.len(),
                "Cannot build curve, keeping straight segments"
            ),
        }
    }

    let line = Line {
        line_id,
        coords,
        unresolved,
    };
    if !line.is_valid() {
        warn!(line_id, points = line.coords.len(), "Line is too short");
    }
    line
}

/// Découpe un parcours séquentiel de points de limite en lignes.
///
/// Un numéro d'ordre égal à 1 ouvre une nouvelle ligne. Les enregistrements
/// qui précèdent le premier 1 forment leur propre ligne.
pub fn split_sequences(records: &[BoundaryRecord]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for (i, record) in records.iter().enumerate() {
        if record.sequence == 1 && i > start {
            runs.push(start..i);
            start = i;
        }
    }
    if start < records.len() {
        runs.push(start..records.len());
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockRole, GeometryOutcome};
    use crate::types::Record;
    use geo::{Geometry, Point};

    fn points_block(points: &[(u64, f64, f64)]) -> DataBlock {
        let records: Vec<Record> = points
            .iter()
            .map(|(id, _, _)| {
                [("ID".to_string(), crate::types::Value::Integer(*id as i64))]
                    .into_iter()
                    .collect()
            })
            .collect();
        let mut block = DataBlock::new("SOBR", BlockRole::Point, records);
        for (i, (_, x, y)) in points.iter().enumerate() {
            block.apply(i, GeometryOutcome::Valid(Geometry::Point(Point::new(*x, *y))));
        }
        block
    }

    fn rec(point_id: u64, sequence: u64) -> BoundaryRecord {
        BoundaryRecord {
            point_id,
            sequence,
            connection: None,
        }
    }

    #[test]
    fn test_build_line_sorted_by_sequence() {
        let points = points_block(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0)]);
        let records = vec![rec(3, 3), rec(1, 1), rec(2, 2)];

        let line = build_line(10, &records, &points);
        assert!(line.check().is_ok());
        assert_eq!(
            line.coords,
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 }
            ]
        );
    }

    #[test]
    fn test_build_line_too_short() {
        let points = points_block(&[(1, 0.0, 0.0)]);
        let line = build_line(10, &[rec(1, 1), rec(99, 2)], &points);
        assert_eq!(line.coords.len(), 1);
        assert_eq!(line.unresolved, vec![99]);
        assert!(matches!(
            line.check(),
            Err(VfkError::LineTooShort {
                line_id: 10,
                points: 1
            })
        ));
    }

    #[test]
    fn test_build_line_arc() {
        let points = points_block(&[(1, 1.0, 0.0), (2, 0.0, 1.0), (3, -1.0, 0.0)]);
        let mut records = vec![rec(1, 1), rec(2, 2), rec(3, 3)];
        records[0].connection = Some("12".to_string());

        let line = build_line(1, &records, &points);
        assert!(line.coords.len() > 3);
        assert_eq!(line.coords[0], Coord { x: 1.0, y: 0.0 });
        assert_eq!(*line.coords.last().unwrap(), Coord { x: -1.0, y: 0.0 });
    }

    #[test]
    fn test_split_sequences() {
        let records = vec![rec(1, 1), rec(2, 2), rec(3, 3), rec(3, 1), rec(4, 2)];
        assert_eq!(split_sequences(&records), vec![0..3, 3..5]);
    }

    #[test]
    fn test_split_sequences_leading_orphans() {
        let records = vec![rec(1, 4), rec(2, 5), rec(3, 1), rec(4, 2)];
        assert_eq!(split_sequences(&records), vec![0..2, 2..4]);
        assert!(split_sequences(&[]).is_empty());
    }
}
