//! Commandes CLI : export GeoJSON et vérification

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Subcommand;
use rayon::prelude::*;
use tracing::{info, warn};

use vfk::{BlockRole, FeatureError};

use crate::config::Config;
use crate::export::geojson::export_to_geojson;
use crate::report::{ExportReport, FileReport};

#[derive(Subcommand)]
pub enum Commands {
    /// Build VFK geometries and export them to GeoJSON (one file per block)
    Export {
        /// Path to a VFK exchange file (.json) or directory
        #[arg(short, long)]
        path: PathBuf,

        /// Output directory for GeoJSON files
        #[arg(short, long)]
        output: PathBuf,

        /// Config preset name (full/parcels) or path to a JSON layout
        #[arg(long, default_value = "full")]
        config: String,

        /// Save the report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Build VFK geometries without writing anything and print the report
    Check {
        /// Path to a VFK exchange file (.json) or directory
        #[arg(short, long)]
        path: PathBuf,

        /// Config preset name (full/parcels) or path to a JSON layout
        #[arg(long, default_value = "full")]
        config: String,

        /// Save the report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

pub fn cmd_export(
    path: &Path,
    output: &Path,
    config_name: &str,
    report_path: Option<&Path>,
) -> Result<ExportReport> {
    info!(path = %path.display(), output = %output.display(), config = config_name, "Export");

    std::fs::create_dir_all(output)
        .with_context(|| format!("Cannot create {}", output.display()))?;

    let config = Config::resolve(config_name)?;
    let report = run(path, Some(output), &config, config_name)?;

    println!(
        "Export complete: {}/{} files, {} features to {}",
        report.files_processed - report.files_failed,
        report.files_processed,
        report.features_written,
        output.display()
    );

    finish(report, report_path)
}

pub fn cmd_check(path: &Path, config_name: &str, report_path: Option<&Path>) -> Result<ExportReport> {
    info!(path = %path.display(), config = config_name, "Check");

    let config = Config::resolve(config_name)?;
    let report = run(path, None, &config, config_name)?;
    finish(report, report_path)
}

fn finish(report: ExportReport, report_path: Option<&Path>) -> Result<ExportReport> {
    report.display();
    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(report)
}

/// Traite tous les fichiers en parallèle, le rapport suit l'ordre des fichiers
fn run(path: &Path, output: Option<&Path>, config: &Config, config_name: &str) -> Result<ExportReport> {
    let start = Instant::now();
    let inputs = collect_inputs(path)?;

    if inputs.is_empty() {
        anyhow::bail!("No VFK exchange files found in {}", path.display());
    }

    info!("Found {} files to process", inputs.len());

    let outcomes: Vec<(PathBuf, Result<(FileReport, Vec<FeatureError>)>)> = inputs
        .par_iter()
        .map(|input| (input.clone(), process_file(input, output, config)))
        .collect();

    let mut report = ExportReport::new(config_name);
    for (input, outcome) in outcomes {
        match outcome {
            Ok((file, errors)) => report.record_file(file, errors),
            Err(e) => {
                warn!("Failed to process {}: {:#}", input.display(), e);
                report.record_file_failure(&input.display().to_string(), &format!("{:#}", e));
            }
        }
    }

    report.set_duration(start.elapsed());
    report.finalize();

    if report.files_failed > 0 {
        warn!("{} files failed", report.files_failed);
    }

    Ok(report)
}

/// Construit les géométries d'un fichier et, si demandé, écrit un GeoJSON par bloc
fn process_file(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
) -> Result<(FileReport, Vec<FeatureError>)> {
    let result = vfk::build(input, &config.layout)
        .with_context(|| format!("Failed to build {}", input.display()))?;

    let mut written = 0;
    if let Some(output) = output {
        let file_output = output.join(get_input_basename(input));
        std::fs::create_dir_all(&file_output)?;

        for block in &result.blocks {
            if block.role() == BlockRole::Attribute || block.stats().valid == 0 {
                continue;
            }
            let output_file = file_output.join(format!("{}.geojson", block.name().to_lowercase()));
            let count = export_to_geojson(block.features(), &output_file)?;
            info!(
                block = block.name(),
                features = count,
                file = %output_file.display(),
                "Block exported"
            );
            written += count;
        }
    }

    let file = FileReport {
        file: input.display().to_string(),
        blocks: result.stats,
        features_written: written,
    };
    Ok((file, result.errors))
}

/// Extrait le nom de base d'un fichier d'échange (sans .vfk.json, .json)
fn get_input_basename(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    let name = name
        .strip_suffix(".vfk.json")
        .or_else(|| name.strip_suffix(".json"))
        .unwrap_or(name);

    name.to_string()
}

fn is_exchange_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

/// Collecte récursivement les fichiers d'échange VFK (ordre trié)
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    if path.is_file() {
        if is_exchange_file(path) {
            inputs.push(path.to_path_buf());
        }
        return Ok(inputs);
    }

    for entry in std::fs::read_dir(path).with_context(|| format!("Cannot read {}", path.display()))? {
        let entry = entry?;
        let entry_path = entry.path();

        if entry_path.is_dir() {
            inputs.extend(collect_inputs(&entry_path)?);
        } else if is_exchange_file(&entry_path) {
            inputs.push(entry_path);
        }
    }

    inputs.sort();
    Ok(inputs)
}
