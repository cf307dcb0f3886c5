//! Configuration de l'export : layout des blocs VFK

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use vfk::Layout;

/// Configuration principale
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Rôles des blocs (points, limites, lignes, polygones)
    #[serde(flatten)]
    pub layout: Layout,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "full" => Self::load_embedded(include_str!("presets/full.json")),
            "parcels" => Self::load_embedded(include_str!("presets/parcels.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: full, parcels", preset),
        }
    }

    /// Preset si le nom est connu, sinon chemin vers un fichier JSON
    pub fn resolve(name: &str) -> Result<Self> {
        match name {
            "full" | "parcels" => Self::from_preset(name),
            path => Self::load(Path::new(path)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse embedded config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.layout.validate().context("Invalid layout")
    }
}
