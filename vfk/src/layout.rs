//! Rôles des blocs VFK : quels blocs portent des points, des lignes, des polygones

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::block::BlockRole;
use crate::VfkError;

/// Configuration des blocs géométriques
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Blocs de points (coordonnées SOURADNICE_Y / SOURADNICE_X)
    #[serde(default)]
    pub points: Vec<String>,

    /// Blocs de points de limite
    #[serde(default)]
    pub boundaries: BTreeMap<String, BoundaryLayout>,

    /// Blocs de lignes
    #[serde(default)]
    pub lines: BTreeMap<String, LineLayout>,

    /// Blocs de polygones
    #[serde(default)]
    pub polygons: BTreeMap<String, PolygonLayout>,

    /// Emprise de validité des points, désactivée par défaut
    #[serde(default)]
    pub extent: Option<Extent>,
}

/// Bloc de points de limite (SBP)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLayout {
    /// Bloc de points référencé
    pub points: String,

    /// Colonne contenant l'ID du point
    #[serde(default = "default_point_key")]
    pub point_key: String,

    /// Colonne du numéro d'ordre
    #[serde(default = "default_sequence")]
    pub sequence: String,

    /// Colonne du type de liaison (droite, arc, cercle)
    #[serde(default = "default_connection")]
    pub connection: Option<String>,
}

/// Bloc de lignes (HP, DPM, OB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLayout {
    /// Bloc de points de limite dont la ligne est issue
    pub boundary: String,

    /// Colonne du bloc de limite qui référence la ligne (HP_ID, ...)
    pub key: String,
}

/// Bloc de polygones (PAR, BUD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonLayout {
    /// Bloc de lignes formant le contour
    pub lines: String,

    /// Colonnes du bloc de lignes qui référencent le polygone
    pub keys: Vec<String>,
}

/// Emprise rectangulaire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    /// Emprise S-JTSK (EPSG:5514) après inversion des axes
    pub const SJTSK: Extent = Extent {
        min_x: -910_000.0,
        max_x: -430_000.0,
        min_y: -1_230_000.0,
        max_y: -930_000.0,
    };

    pub fn contains(&self, c: Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }
}

fn default_point_key() -> String {
    "BP_ID".to_string()
}

fn default_sequence() -> String {
    "PORADOVE_CISLO_BODU".to_string()
}

fn default_connection() -> Option<String> {
    Some("PARAMETRY_SPOJENI".to_string())
}

impl Default for Layout {
    /// Layout cadastral complet
    fn default() -> Self {
        let boundary = |points: &str| BoundaryLayout {
            points: points.to_string(),
            point_key: default_point_key(),
            sequence: default_sequence(),
            connection: default_connection(),
        };
        let line = |key: &str| LineLayout {
            boundary: "SBP".to_string(),
            key: key.to_string(),
        };

        Self {
            points: vec!["SOBR".to_string(), "OBBP".to_string(), "SPOL".to_string()],
            boundaries: [
                ("SBP".to_string(), boundary("SOBR")),
                ("SBPG".to_string(), boundary("SOBR")),
            ]
            .into_iter()
            .collect(),
            lines: [
                ("HP".to_string(), line("HP_ID")),
                ("DPM".to_string(), line("DPM_ID")),
                ("OB".to_string(), line("OB_ID")),
            ]
            .into_iter()
            .collect(),
            polygons: [
                (
                    "PAR".to_string(),
                    PolygonLayout {
                        lines: "HP".to_string(),
                        keys: vec!["PAR_ID_1".to_string(), "PAR_ID_2".to_string()],
                    },
                ),
                (
                    "BUD".to_string(),
                    PolygonLayout {
                        lines: "OB".to_string(),
                        keys: vec!["BUD_ID".to_string()],
                    },
                ),
            ]
            .into_iter()
            .collect(),
            extent: None,
        }
    }
}

impl Layout {
    /// Rôle d'un bloc selon ce layout
    pub fn role(&self, name: &str) -> BlockRole {
        if self.points.iter().any(|p| p == name) {
            BlockRole::Point
        } else if self.boundaries.contains_key(name) {
            BlockRole::Boundary
        } else if self.lines.contains_key(name) {
            BlockRole::Line
        } else if self.polygons.contains_key(name) {
            BlockRole::Polygon
        } else {
            BlockRole::Attribute
        }
    }

    /// Vérifie que chaque dépendance est déclarée avec le bon rôle
    pub fn validate(&self) -> Result<(), VfkError> {
        let mut seen = std::collections::HashSet::new();
        let names = self
            .points
            .iter()
            .chain(self.boundaries.keys())
            .chain(self.lines.keys())
            .chain(self.polygons.keys());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(VfkError::Layout(format!(
                    "block {} is declared with several roles",
                    name
                )));
            }
        }

        for (name, boundary) in &self.boundaries {
            if self.role(&boundary.points) != BlockRole::Point {
                return Err(VfkError::Layout(format!(
                    "{}: {} is not a point block",
                    name, boundary.points
                )));
            }
        }
        for (name, line) in &self.lines {
            if self.role(&line.boundary) != BlockRole::Boundary {
                return Err(VfkError::Layout(format!(
                    "{}: {} is not a boundary block",
                    name, line.boundary
                )));
            }
        }
        for (name, polygon) in &self.polygons {
            if self.role(&polygon.lines) != BlockRole::Line {
                return Err(VfkError::Layout(format!(
                    "{}: {} is not a line block",
                    name, polygon.lines
                )));
            }
            if polygon.keys.is_empty() {
                return Err(VfkError::Layout(format!("{}: no key column", name)));
            }
        }
        Ok(())
    }

    /// Blocs dont dépend `name`, du plus bas niveau jusqu'à `name` inclus.
    ///
    /// Ex: PAR -> [SOBR, SBP, HP, PAR]
    pub fn dependency_chain(&self, name: &str) -> Vec<String> {
        let mut chain = vec![name.to_string()];
        let mut current = name.to_string();
        loop {
            let next = match self.role(&current) {
                BlockRole::Polygon => self.polygons.get(&current).map(|p| p.lines.clone()),
                BlockRole::Line => self.lines.get(&current).map(|l| l.boundary.clone()),
                BlockRole::Boundary => self.boundaries.get(&current).map(|b| b.points.clone()),
                BlockRole::Point | BlockRole::Attribute => None,
            };
            match next {
                Some(dep) if !chain.contains(&dep) => {
                    chain.push(dep.clone());
                    current = dep;
                }
                _ => break,
            }
        }
        chain.reverse();
        chain
    }

    /// Tous les blocs géométriques, dans l'ordre points -> limites -> lignes -> polygones
    pub fn load_order(&self) -> Vec<String> {
        self.points
            .iter()
            .chain(self.boundaries.keys())
            .chain(self.lines.keys())
            .chain(self.polygons.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = Layout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.role("SOBR"), BlockRole::Point);
        assert_eq!(layout.role("SBP"), BlockRole::Boundary);
        assert_eq!(layout.role("HP"), BlockRole::Line);
        assert_eq!(layout.role("BUD"), BlockRole::Polygon);
        assert_eq!(layout.role("KATUZE"), BlockRole::Attribute);
    }

    #[test]
    fn test_dependency_chain() {
        let layout = Layout::default();
        assert_eq!(layout.dependency_chain("PAR"), vec!["SOBR", "SBP", "HP", "PAR"]);
        assert_eq!(layout.dependency_chain("OB"), vec!["SOBR", "SBP", "OB"]);
        assert_eq!(layout.dependency_chain("SOBR"), vec!["SOBR"]);
    }

    #[test]
    fn test_load_order_points_first() {
        let order = Layout::default().load_order();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("SOBR") < pos("SBP"));
        assert!(pos("SBP") < pos("HP"));
        assert!(pos("HP") < pos("PAR"));
        assert!(pos("OB") < pos("BUD"));
    }

    #[test]
    fn test_validate_rejects_wrong_dependency() {
        let mut layout = Layout::default();
        layout.lines.get_mut("HP").unwrap().boundary = "SOBR".to_string();
        assert!(matches!(layout.validate(), Err(VfkError::Layout(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_role() {
        let mut layout = Layout::default();
        layout.points.push("HP".to_string());
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "points": ["SOBR"],
            "boundaries": {"SBP": {"points": "SOBR"}},
            "lines": {"HP": {"boundary": "SBP", "key": "HP_ID"}},
            "polygons": {"PAR": {"lines": "HP", "keys": ["PAR_ID_1", "PAR_ID_2"]}}
        }"#;
        let layout: Layout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.boundaries["SBP"].point_key, "BP_ID");
        assert_eq!(layout.boundaries["SBP"].sequence, "PORADOVE_CISLO_BODU");
        assert_eq!(layout.extent, None);
        assert!(layout.validate().is_ok());

        let sjtsk: Layout = serde_json::from_str(
            r#"{"extent": {"min_x": -910000.0, "max_x": -430000.0, "min_y": -1230000.0, "max_y": -930000.0}}"#,
        )
        .unwrap();
        assert_eq!(sjtsk.extent, Some(Extent::SJTSK));
    }

    #[test]
    fn test_default_layout_has_no_extent() {
        assert_eq!(Layout::default().extent, None);
    }

    #[test]
    fn test_extent_contains() {
        assert!(Extent::SJTSK.contains(Coord {
            x: -700_000.0,
            y: -1_100_000.0
        }));
        assert!(!Extent::SJTSK.contains(Coord {
            x: 700_000.0,
            y: 1_100_000.0
        }));
    }
}
