//! # vfk-export
//!
//! Export des géométries cadastrales VFK vers GeoJSON, avec rapport.
//!
//! ## Features
//!
//! - Traitement parallèle d'un dossier de fichiers d'échange
//! - Layouts embarqués (full, parcels) ou fichier JSON
//! - Rapport par fichier et par bloc, sauvegardable en JSON
//!
//! ## Usage CLI
//!
//! ```bash
//! # Export GeoJSON, un fichier par bloc
//! vfk-export export --path ./600016.json --output ./geojson/
//! vfk-export export --path ./folder/ --output ./geojson/ --config parcels
//!
//! # Vérification sans écriture
//! vfk-export check --path ./folder/ --report report.json
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod report;

pub use config::Config;
pub use report::{ExportReport, ExportStatus};
