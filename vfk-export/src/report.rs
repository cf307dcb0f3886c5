//! Rapport d'export avec graceful degradation
//!
//! Collecte, par fichier et par bloc, le nombre de features et de
//! géométries construites, ainsi que les erreurs non fatales.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use vfk::{BlockStats, FeatureError};

/// Statut global de l'export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStatus {
    /// Toutes les géométries ont été construites
    Success,
    /// Des fichiers ou des features sont en erreur
    PartialSuccess,
    /// Aucune géométrie construite
    Failed,
}

/// Niveau de sévérité des erreurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorLevel {
    /// Erreur: fichier non traité ou erreur hors géométrie
    Error,
    /// Warning: feature exportée sans géométrie
    Warning,
}

/// Erreur d'export avec contexte
#[derive(Debug, Clone, Serialize)]
pub struct ExportError {
    /// Niveau de sévérité
    pub level: ErrorLevel,
    /// Fichier source
    pub file: String,
    /// Bloc VFK (optionnel)
    pub block: Option<String>,
    /// Identifiant de la feature (optionnel)
    pub fid: Option<u64>,
    /// Message d'erreur
    pub message: String,
}

/// Statistiques cumulées par bloc
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockTotals {
    pub features: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Résultat d'un fichier traité
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Nom du fichier source
    pub file: String,
    /// Statistiques par bloc géométrique
    pub blocks: Vec<BlockStats>,
    /// Nombre de features écrites (0 pour `check`)
    pub features_written: usize,
}

/// Rapport complet d'export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Layout utilisé (preset ou fichier)
    pub config: String,
    /// Durée de l'export
    pub duration_secs: f64,
    /// Statut global
    pub status: ExportStatus,

    /// Nombre de fichiers traités
    pub files_processed: usize,
    /// Nombre de fichiers en erreur
    pub files_failed: usize,
    /// Nombre de features écrites
    pub features_written: usize,

    /// Statistiques par bloc, tous fichiers confondus
    pub by_block: BTreeMap<String, BlockTotals>,

    /// Détail par fichier
    pub files: Vec<FileReport>,

    /// Liste des erreurs
    pub errors: Vec<ExportError>,
}

impl ExportReport {
    /// Crée un nouveau rapport pour une configuration
    pub fn new(config: &str) -> Self {
        Self {
            config: config.to_string(),
            duration_secs: 0.0,
            status: ExportStatus::Success,
            files_processed: 0,
            files_failed: 0,
            features_written: 0,
            by_block: BTreeMap::new(),
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Enregistre un fichier traité et ses erreurs de géométrie
    pub fn record_file(&mut self, file: FileReport, errors: Vec<FeatureError>) {
        self.files_processed += 1;
        self.features_written += file.features_written;

        for stats in &file.blocks {
            let totals = self.by_block.entry(stats.block.clone()).or_default();
            totals.features += stats.features;
            totals.valid += stats.valid;
            totals.invalid += stats.invalid;
        }

        for error in errors {
            // une erreur de géométrie n'empêche pas l'export de la feature
            let level = if error.error.is_geometry_error() {
                ErrorLevel::Warning
            } else {
                ErrorLevel::Error
            };
            self.errors.push(ExportError {
                level,
                file: file.file.clone(),
                block: Some(error.block),
                fid: Some(error.fid),
                message: error.error.to_string(),
            });
        }

        self.files.push(file);
    }

    /// Enregistre un fichier en échec
    pub fn record_file_failure(&mut self, file: &str, message: &str) {
        self.files_processed += 1;
        self.files_failed += 1;
        self.errors.push(ExportError {
            level: ErrorLevel::Error,
            file: file.to_string(),
            block: None,
            fid: None,
            message: message.to_string(),
        });
    }

    /// Définit la durée de l'export
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Nombre total de géométries construites
    pub fn total_valid(&self) -> usize {
        self.by_block.values().map(|t| t.valid).sum()
    }

    /// Nombre total de features invalides
    pub fn total_invalid(&self) -> usize {
        self.by_block.values().map(|t| t.invalid).sum()
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let has_errors = self.files_failed > 0 || self.total_invalid() > 0;
        let has_success = self.total_valid() > 0;

        self.status = if has_errors && has_success {
            ExportStatus::PartialSuccess
        } else if has_errors || (self.files_processed > 0 && !has_success) {
            ExportStatus::Failed
        } else {
            ExportStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXPORT REPORT - Config {}", self.config);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Files: {} processed, {} failed",
            self.files_processed, self.files_failed
        );
        println!(
            "Geometries: {} valid, {} invalid, {} features written",
            self.total_valid(),
            self.total_invalid(),
            self.features_written
        );

        if !self.by_block.is_empty() {
            println!("\n--- BY BLOCK ---");
            for (block, totals) in &self.by_block {
                println!(
                    "  {}: {} features, {} valid, {} invalid",
                    block, totals.features, totals.valid, totals.invalid
                );
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                let location = match (&e.block, e.fid) {
                    (Some(b), Some(fid)) => format!("[{}:{}:{}]", e.file, b, fid),
                    (Some(b), None) => format!("[{}:{}]", e.file, b),
                    _ => format!("[{}]", e.file),
                };
                println!("  {:?} {} {}", e.level, location, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} files, {} valid, {} invalid, {} errors",
            self.config,
            self.files_processed,
            self.total_valid(),
            self.total_invalid(),
            self.errors.len()
        )
    }
}
