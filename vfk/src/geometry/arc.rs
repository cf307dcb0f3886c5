//! Linéarisation des arcs et cercles (PARAMETRY_SPOJENI)

use std::f64::consts::TAU;

use geo::Coord;

/// Pas angulaire maximal de la linéarisation, en degrés
pub const MAX_STEP_DEGREES: f64 = 4.0;

/// Type de liaison entre les points d'une ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// Segments droits (code 11 ou absent)
    Straight,
    /// Arc de cercle passant par 3 points (code 12)
    Arc,
    /// Cercle complet passant par 3 points (code 15)
    Circle,
}

impl Connection {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("12") => Connection::Arc,
            Some("15") => Connection::Circle,
            _ => Connection::Straight,
        }
    }
}

/// Linéarise `points` selon le type de liaison.
///
/// Retourne `None` si les points ne décrivent pas un arc (nombre de points
/// différent de 3, points alignés).
pub fn linearize(points: &[Coord], connection: Connection) -> Option<Vec<Coord>> {
    match connection {
        Connection::Straight => Some(points.to_vec()),
        Connection::Arc => {
            let [a, b, c] = three(points)?;
            let (center, radius, ccw) = circle_through(a, b, c)?;
            let start = angle(center, a);
            let end = angle(center, c);
            let sweep = if ccw {
                (end - start).rem_euclid(TAU)
            } else {
                -(start - end).rem_euclid(TAU)
            };
            let mut coords = sample(center, radius, start, sweep);
            // extrémités exactes pour l'assemblage des rings
            if let Some(first) = coords.first_mut() {
                *first = a;
            }
            if let Some(last) = coords.last_mut() {
                *last = c;
            }
            Some(coords)
        }
        Connection::Circle => {
            let [a, b, c] = three(points)?;
            let (center, radius, ccw) = circle_through(a, b, c)?;
            let sweep = if ccw { TAU } else { -TAU };
            let mut coords = sample(center, radius, angle(center, a), sweep);
            if let Some(first) = coords.first_mut() {
                *first = a;
            }
            if let Some(last) = coords.last_mut() {
                *last = a;
            }
            Some(coords)
        }
    }
}

fn three(points: &[Coord]) -> Option<[Coord; 3]> {
    match points {
        [a, b, c] => Some([*a, *b, *c]),
        _ => None,
    }
}

/// Centre, rayon et sens (vrai = anti-horaire) du cercle passant par a, b, c
fn circle_through(a: Coord, b: Coord, c: Coord) -> Option<(Coord, f64, bool)> {
    // Calcul relatif à `a` pour limiter la perte de précision sur les grandes coordonnées
    let b = b - a;
    let c = c - a;
    let cross = b.x * c.y - b.y * c.x;
    if cross == 0.0 {
        return None;
    }

    let d = 2.0 * cross;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (c.y * b2 - b.y * c2) / d;
    let uy = (b.x * c2 - c.x * b2) / d;
    if !ux.is_finite() || !uy.is_finite() {
        return None;
    }

    let radius = (ux * ux + uy * uy).sqrt();
    Some((Coord { x: a.x + ux, y: a.y + uy }, radius, cross > 0.0))
}

fn angle(center: Coord, p: Coord) -> f64 {
    (p.y - center.y).atan2(p.x - center.x)
}

fn sample(center: Coord, radius: f64, start: f64, sweep: f64) -> Vec<Coord> {
    let step = MAX_STEP_DEGREES.to_radians();
    let n = ((sweep.abs() / step).ceil() as usize).max(2);
    (0..=n)
        .map(|i| {
            let t = start + sweep * (i as f64) / (n as f64);
            Coord {
                x: center.x + radius * t.cos(),
                y: center.y + radius * t.sin(),
            }
        })
        .collect()
}
