//! Types de données pour le crate vfk

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::DataBlock;
use crate::VfkError;

/// Un enregistrement VFK : nom de colonne -> valeur.
///
/// Les colonnes sont triées par nom, la sortie ne dépend pas de l'ordre du fichier source.
pub type Record = BTreeMap<String, Value>;

/// Valeur d'une colonne VFK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Interprète la valeur comme identifiant (entier positif)
    ///
    /// Les identifiants VFK sont souvent exportés sous forme de texte,
    /// on accepte donc `"12"` comme `12`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => u64::try_from(*i).ok(),
            Value::Real(r) if r.fract() == 0.0 && *r >= 0.0 && *r <= u64::MAX as f64 => {
                Some(*r as u64)
            }
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interprète la valeur comme réel
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Représentation texte (les nombres sont formatés)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Statistiques de chargement des géométries d'un bloc
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockStats {
    /// Nom du bloc (SOBR, HP, PAR, ...)
    pub block: String,

    /// Nombre de features du bloc
    pub features: usize,

    /// Nombre de features avec une géométrie
    pub valid: usize,

    /// Nombre de features dont la géométrie n'a pas pu être construite
    pub invalid: usize,
}

/// Erreur non fatale rattachée à une feature
#[derive(Debug)]
pub struct FeatureError {
    pub block: String,
    pub fid: u64,
    pub error: VfkError,
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.block, self.fid, self.error)
    }
}

/// Résultat de la reconstruction complète d'un fichier d'échange
#[derive(Debug)]
pub struct BuildResult {
    /// Blocs avec leurs features et géométries
    pub blocks: Vec<DataBlock>,

    /// Statistiques par bloc géométrique, dans l'ordre de chargement
    pub stats: Vec<BlockStats>,

    /// Erreurs non fatales rencontrées pendant la construction
    pub errors: Vec<FeatureError>,
}

impl BuildResult {
    /// Récupère un bloc par son nom
    pub fn block(&self, name: &str) -> Option<&DataBlock> {
        self.blocks.iter().find(|b| b.name() == name)
    }

    /// Nombre total de features invalides
    pub fn invalid_count(&self) -> usize {
        self.stats.iter().map(|s| s.invalid).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_untagged() {
        let record: Record =
            serde_json::from_str(r#"{"ID": 12, "X": 1.5, "NAME": "abc", "EMPTY": null}"#).unwrap();
        assert_eq!(record["ID"], Value::Integer(12));
        assert_eq!(record["X"], Value::Real(1.5));
        assert_eq!(record["NAME"], Value::Text("abc".to_string()));
        assert!(record["EMPTY"].is_null());
    }

    #[test]
    fn test_value_as_u64() {
        assert_eq!(Value::Integer(42).as_u64(), Some(42));
        assert_eq!(Value::Integer(-1).as_u64(), None);
        assert_eq!(Value::Text(" 17 ".to_string()).as_u64(), Some(17));
        assert_eq!(Value::Real(3.0).as_u64(), Some(3));
        assert_eq!(Value::Real(3.5).as_u64(), None);
        assert_eq!(Value::Null.as_u64(), None);
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::Text("745123.45".to_string()).as_f64(), Some(745123.45));
        assert_eq!(Value::Text("n/a".to_string()).as_f64(), None);
    }
}
