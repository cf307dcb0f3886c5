//! Classement des rings en contour extérieur et trous

use geo::{Area, LineString, Polygon};
use tracing::debug;

use crate::geometry::ring::Ring;
use crate::VfkError;

/// Construit un polygone à partir des rings assemblés.
///
/// - ring non fermé de plus de 2 points : topologie invalide ;
/// - ring non fermé de 2 points : pont, ignoré ;
/// - le ring fermé de plus grande surface devient le contour extérieur,
///   les autres des trous (ordre d'entrée conservé).
///
/// Il faut `trous + ponts == rings - 1`.
pub fn build_polygon(rings: Vec<Ring>) -> Result<Polygon, VfkError> {
    let total = rings.len();
    if total == 0 {
        return Err(VfkError::degenerate("no ring"));
    }

    let mut bridges = 0;
    let mut closed: Vec<LineString> = Vec::with_capacity(total);
    for ring in rings {
        if ring.is_closed() {
            closed.push(ring.into_line_string());
        } else if ring.is_bridge() {
            bridges += 1;
        } else {
            return Err(VfkError::malformed(format!(
                "unclosed ring with {} points",
                ring.len()
            )));
        }
    }
    if bridges > 0 {
        debug!(bridges, "Bridges dropped");
    }

    let Some(exterior_idx) = largest_ring(&closed) else {
        return Err(VfkError::InconsistentRingCount {
            rings: total,
            holes: 0,
            bridges,
        });
    };

    let exterior = closed.remove(exterior_idx);
    let holes = closed;

    if holes.len() + bridges != total - 1 {
        return Err(VfkError::InconsistentRingCount {
            rings: total,
            holes: holes.len(),
            bridges,
        });
    }

    if exterior.0.len() < 4 {
        return Err(VfkError::degenerate(format!(
            "exterior ring with {} points",
            exterior.0.len()
        )));
    }

    Ok(Polygon::new(exterior, holes))
}

/// Indice du ring de plus grande surface (le premier en cas d'égalité)
fn largest_ring(rings: &[LineString]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, ring) in rings.iter().enumerate() {
        let area = Polygon::new(ring.clone(), vec![]).unsigned_area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((i, area)),
        }
    }
    best.map(|(i, _)| i)
}
