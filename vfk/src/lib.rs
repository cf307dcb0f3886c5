//! # vfk
//!
//! Reconstruction des géométries du format d'échange cadastral tchèque VFK.
//!
//! Les blocs VFK ne contiennent pas de géométries : seulement des points
//! (SOBR), des références ordonnées de points de limite (SBP), des lignes
//! (HP, DPM, OB) et des objets surfaciques (PAR, BUD) qui référencent leurs
//! lignes. Ce crate reconstruit points, lignes et polygones à partir de ces
//! références.
//!
//! ## Features
//!
//! - Chargement paresseux, bloc par bloc ou feature par feature
//! - Assemblage déterministe des rings, indépendant de l'ordre de stockage
//! - Linéarisation des arcs et cercles (PARAMETRY_SPOJENI)
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vfk::{build, Layout};
//! use std::path::Path;
//!
//! let result = build(Path::new("export.json"), &Layout::default())?;
//! for stats in &result.stats {
//!     println!("{}: {}/{} features", stats.block, stats.valid, stats.features);
//! }
//! ```

pub mod block;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod layout;
pub mod reader;
pub mod store;
pub mod types;

pub use block::{BlockRole, DataBlock};
pub use error::VfkError;
pub use feature::{Feature, GeometryState};
pub use layout::{BoundaryLayout, Extent, Layout, LineLayout, PolygonLayout};
pub use reader::Reader;
pub use store::RecordStore;
pub use types::{BlockStats, BuildResult, FeatureError, Record, Value};

use std::path::Path;

use tracing::info;

/// Charge un fichier d'enregistrements et construit toutes ses géométries
pub fn build(path: &Path, layout: &Layout) -> Result<BuildResult, VfkError> {
    let store = RecordStore::from_path(path)?;
    info!(file = %path.display(), blocks = store.len(), "Records loaded");
    build_store(store, layout)
}

/// Construit toutes les géométries d'un ensemble d'enregistrements déjà chargé
pub fn build_store(store: RecordStore, layout: &Layout) -> Result<BuildResult, VfkError> {
    let mut reader = Reader::new(store, layout.clone())?;
    let stats = reader.load_all()?;
    Ok(reader.into_result(stats))
}
