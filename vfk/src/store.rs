//! Magasin d'enregistrements VFK au format d'échange JSON
//!
//! Format attendu :
//!
//! ```json
//! { "blocks": { "SOBR": [ { "ID": 1, "SOURADNICE_Y": 700000.0, "SOURADNICE_X": 1100000.0 } ] } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Record;
use crate::VfkError;

/// Enregistrements groupés par bloc, en ordre de stockage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStore {
    #[serde(default)]
    pub blocks: BTreeMap<String, Vec<Record>>,
}

impl RecordStore {
    /// Lit un fichier d'échange JSON
    pub fn from_path(path: &Path) -> Result<Self, VfkError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| VfkError::Json {
            file: path.display().to_string(),
            source,
        })
    }

    /// Lit un document JSON en mémoire
    pub fn from_json(json: &str) -> Result<Self, VfkError> {
        serde_json::from_str(json).map_err(|source| VfkError::Json {
            file: "<memory>".to_string(),
            source,
        })
    }

    pub fn block(&self, name: &str) -> Option<&[Record]> {
        self.blocks.get(name).map(|v| v.as_slice())
    }

    pub fn insert_block(&mut self, name: impl Into<String>, records: Vec<Record>) {
        self.blocks.insert(name.into(), records);
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(|k| k.as_str())
    }

    /// Nombre total d'enregistrements
    pub fn len(&self) -> usize {
        self.blocks.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_from_json() {
        let store = RecordStore::from_json(
            r#"{"blocks": {"SOBR": [{"ID": 1, "SOURADNICE_Y": 700000.5, "SOURADNICE_X": "1100000"}],
                           "PAR": []}}"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.block_names().collect::<Vec<_>>(), vec!["PAR", "SOBR"]);
        let sobr = store.block("SOBR").unwrap();
        assert_eq!(sobr[0]["SOURADNICE_Y"], Value::Real(700000.5));
        assert_eq!(sobr[0]["SOURADNICE_X"].as_f64(), Some(1_100_000.0));
    }

    #[test]
    fn test_from_json_invalid() {
        let err = RecordStore::from_json("{\"blocks\": [").unwrap_err();
        assert!(matches!(err, VfkError::Json { .. }));
    }

    #[test]
    fn test_missing_blocks_is_empty() {
        let store = RecordStore::from_json("{}").unwrap();
        assert!(store.is_empty());
        assert!(store.block("SOBR").is_none());
    }
}
