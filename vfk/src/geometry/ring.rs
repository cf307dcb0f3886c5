//! Assemblage des rings à partir de segments non ordonnés

use std::collections::VecDeque;

use geo::{Coord, LineString};
use tracing::debug;

use crate::VfkError;

/// Ring en cours de construction (liste ordonnée de points avec un début et une fin)
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: VecDeque<Coord>,
}

impl Ring {
    fn from_segment(segment: &[Coord]) -> Self {
        Self {
            points: segment.iter().copied().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub fn front(&self) -> Option<Coord> {
        self.points.front().copied()
    }

    pub fn back(&self) -> Option<Coord> {
        self.points.back().copied()
    }

    /// Fermé si le premier et le dernier point sont égaux
    pub fn is_closed(&self) -> bool {
        self.len() >= 2 && self.front() == self.back()
    }

    /// Pont : artefact de 2 points non fermé
    pub fn is_bridge(&self) -> bool {
        self.len() == 2 && !self.is_closed()
    }

    pub fn into_line_string(self) -> LineString {
        LineString::new(self.points.into_iter().collect())
    }

    /// Tente d'accrocher un segment à une extrémité du ring (point commun non dupliqué)
    fn try_attach(&mut self, segment: &[Coord]) -> bool {
        let (Some(&first_new), Some(&last_new)) = (segment.first(), segment.last()) else {
            return false;
        };
        let (Some(front), Some(back)) = (self.front(), self.back()) else {
            return false;
        };

        if first_new == back {
            // à la suite
            self.points.extend(segment[1..].iter().copied());
        } else if first_new == front {
            // au début, inversé
            for &c in &segment[1..] {
                self.points.push_front(c);
            }
        } else if last_new == back {
            // à la suite, inversé
            self.points
                .extend(segment[..segment.len() - 1].iter().rev().copied());
        } else if last_new == front {
            // au début
            for &c in segment[..segment.len() - 1].iter().rev() {
                self.points.push_front(c);
            }
        } else {
            return false;
        }
        true
    }
}

/// Place un segment : nouveau ring si demandé, sinon sur le premier ring ouvert qui le prolonge
fn append_to_rings(rings: &mut Vec<Ring>, segment: &[Coord], new_ring: bool) -> bool {
    if segment.len() < 2 {
        return false;
    }
    if new_ring {
        rings.push(Ring::from_segment(segment));
        return true;
    }
    rings
        .iter_mut()
        .filter(|r| !r.is_closed())
        .any(|r| r.try_attach(segment))
}

/// Assemble des segments non ordonnés en rings.
///
/// Chaque passe parcourt les segments restants dans leur ordre d'origine et
/// place le premier qui prolonge un ring ouvert. Après une passe sans
/// succès, la passe suivante ouvre un nouveau ring avec le premier segment
/// restant. Les segments qui restent à la fin (moins de 2 points) rendent
/// la topologie invalide.
pub fn assemble_rings(segments: &[Vec<Coord>]) -> Result<Vec<Ring>, VfkError> {
    let mut pending: Vec<&[Coord]> = segments.iter().map(|s| s.as_slice()).collect();
    let mut rings: Vec<Ring> = Vec::new();

    let max_passes = 2 * segments.len();
    let mut passes = 0;
    let mut found = false;

    while !pending.is_empty() && passes < max_passes {
        let new_ring = !found;
        found = false;

        if let Some(i) = pending
            .iter()
            .position(|s| append_to_rings(&mut rings, s, new_ring))
        {
            pending.remove(i);
            found = true;
        }
        passes += 1;

        if new_ring && !found {
            // plus aucun segment ne peut ouvrir de ring
            break;
        }
    }

    debug!(
        segments = segments.len(),
        passes,
        rings = rings.len(),
        "Rings assembled"
    );

    if !pending.is_empty() {
        return Err(VfkError::malformed(format!(
            "{} of {} segments could not be placed",
            pending.len(),
            segments.len()
        )));
    }

    Ok(rings)
}
