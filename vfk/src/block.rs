//! Blocs de données VFK (SOBR, SBP, HP, PAR, ...)

use std::collections::HashMap;

use tracing::warn;

use crate::feature::{Feature, GeometryState};
use crate::types::{BlockStats, Record};

/// Colonne portant l'identifiant d'une feature
pub const ID_COLUMN: &str = "ID";

/// Rôle géométrique d'un bloc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    /// Points (SOBR, OBBP, SPOL)
    Point,
    /// Points de limite ordonnés (SBP, SBPG)
    Boundary,
    /// Lignes construites depuis les points de limite (HP, DPM, OB)
    Line,
    /// Polygones construits depuis les lignes (PAR, BUD)
    Polygon,
    /// Bloc attributaire sans géométrie
    Attribute,
}

/// Un bloc de données : features en ordre de stockage, indexées par ID
#[derive(Debug, Clone)]
pub struct DataBlock {
    name: String,
    role: BlockRole,
    features: Vec<Feature>,
    index: HashMap<u64, usize>,
    geometry_loaded: bool,
    invalid: usize,
}

impl DataBlock {
    /// Crée un bloc depuis ses enregistrements.
    ///
    /// L'ID vient de la colonne `ID`, à défaut de la position (base 1).
    pub fn new(name: impl Into<String>, role: BlockRole, records: Vec<Record>) -> Self {
        let name = name.into();
        let mut features = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let fid = record
                .get(ID_COLUMN)
                .and_then(|v| v.as_u64())
                .unwrap_or(position as u64 + 1);

            if index.contains_key(&fid) {
                warn!(block = %name, fid, "Duplicate feature id, keeping the first one");
            } else {
                index.insert(fid, features.len());
            }
            features.push(Feature::new(fid, record));
        }

        Self {
            name,
            role,
            features,
            index,
            geometry_loaded: false,
            invalid: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> BlockRole {
        self.role
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, fid: u64) -> Option<&Feature> {
        self.index.get(&fid).map(|&i| &self.features[i])
    }

    pub fn position(&self, fid: u64) -> Option<usize> {
        self.index.get(&fid).copied()
    }

    /// Indexe les features par valeur d'une colonne (ordre de stockage conservé)
    pub fn group_by(&self, column: &str) -> HashMap<u64, Vec<usize>> {
        self.group_by_any(&[column])
    }

    /// Indexe les features par valeur de plusieurs colonnes.
    ///
    /// Une feature dont plusieurs colonnes ont la même valeur n'apparaît
    /// qu'une fois sous cette valeur.
    pub fn group_by_any<S: AsRef<str>>(&self, columns: &[S]) -> HashMap<u64, Vec<usize>> {
        let mut groups: HashMap<u64, Vec<usize>> = HashMap::new();
        for (i, feature) in self.features.iter().enumerate() {
            let keys: Vec<u64> = columns
                .iter()
                .filter_map(|c| feature.property(c.as_ref()))
                .filter_map(|v| v.as_u64())
                .collect();
            for (n, key) in keys.iter().enumerate() {
                if keys[..n].contains(key) {
                    continue;
                }
                groups.entry(*key).or_default().push(i);
            }
        }
        groups
    }

    pub fn is_geometry_loaded(&self) -> bool {
        self.geometry_loaded
    }

    pub(crate) fn mark_geometry_loaded(&mut self) {
        self.geometry_loaded = true;
    }

    /// Enregistre le résultat du calcul pour une feature
    pub(crate) fn apply(&mut self, index: usize, outcome: GeometryOutcome) {
        let Some(feature) = self.features.get_mut(index) else {
            return;
        };
        match outcome {
            GeometryOutcome::Valid(g) => feature.set_geometry(Some(g)),
            GeometryOutcome::Empty => feature.set_geometry(None),
            GeometryOutcome::Invalid => {
                feature.set_geometry(None);
                self.invalid += 1;
            }
        }
    }

    /// Statistiques courantes du bloc
    pub fn stats(&self) -> BlockStats {
        BlockStats {
            block: self.name.clone(),
            features: self.features.len(),
            valid: self
                .features
                .iter()
                .filter(|f| matches!(f.geometry_state(), GeometryState::Present(_)))
                .count(),
            invalid: self.invalid,
        }
    }
}

/// Résultat du calcul de géométrie d'une feature
#[derive(Debug, Clone)]
pub(crate) enum GeometryOutcome {
    Valid(geo::Geometry),
    /// Pas de géométrie, sans que ce soit une erreur
    Empty,
    Invalid,
}
