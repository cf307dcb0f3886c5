//! Feature VFK et son état géométrique

use geo::Geometry;

use crate::types::{Record, Value};

/// État de la géométrie d'une feature
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GeometryState {
    /// Pas encore calculée
    #[default]
    Pending,
    /// Calcul tenté, pas de géométrie (invalide ou volontairement vide)
    Missing,
    /// Géométrie calculée
    Present(Geometry),
}

/// Une feature d'un bloc de données
#[derive(Debug, Clone)]
pub struct Feature {
    fid: u64,
    properties: Record,
    geometry: GeometryState,
}

impl Feature {
    pub fn new(fid: u64, properties: Record) -> Self {
        Self {
            fid,
            properties,
            geometry: GeometryState::Pending,
        }
    }

    /// Identifiant de la feature (colonne ID)
    pub fn fid(&self) -> u64 {
        self.fid
    }

    pub fn properties(&self) -> &Record {
        &self.properties
    }

    pub fn property(&self, column: &str) -> Option<&Value> {
        self.properties.get(column).filter(|v| !v.is_null())
    }

    pub fn geometry_state(&self) -> &GeometryState {
        &self.geometry
    }

    /// Géométrie calculée, `None` si absente ou pas encore calculée
    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.geometry {
            GeometryState::Present(g) => Some(g),
            _ => None,
        }
    }

    /// Vrai si le calcul de la géométrie a déjà été tenté
    pub fn is_geometry_loaded(&self) -> bool {
        !matches!(self.geometry, GeometryState::Pending)
    }

    /// Fixe la géométrie. `None` marque la feature comme traitée sans géométrie.
    pub fn set_geometry(&mut self, geometry: Option<Geometry>) {
        self.geometry = match geometry {
            Some(g) => GeometryState::Present(g),
            None => GeometryState::Missing,
        };
    }
}
