//! Types d'erreurs pour le crate vfk

use thiserror::Error;

/// Erreurs pouvant survenir lors de la reconstruction des géométries VFK
///
/// Les variantes géométriques (`PointNotFound` à `EmptyOrDegenerateGeometry`)
/// sont locales à une feature : elles ne font jamais échouer le bloc.
#[derive(Debug, Error)]
pub enum VfkError {
    /// Point référencé absent du bloc de points
    #[error("Point not found: {point_id}")]
    PointNotFound { point_id: u64 },

    /// Ligne avec moins de 2 points résolus
    #[error("Line {line_id} is too short ({points} points)")]
    LineTooShort { line_id: u64, points: usize },

    /// Segments impossibles à assembler en rings
    #[error("Malformed topology: {reason}")]
    MalformedTopology { reason: String },

    /// Le nombre de rings ne correspond pas au nombre de trous attendu
    #[error("Inconsistent ring count: {rings} rings, {holes} holes, {bridges} bridges")]
    InconsistentRingCount {
        rings: usize,
        holes: usize,
        bridges: usize,
    },

    /// Géométrie vide ou dégénérée
    #[error("Empty or degenerate geometry: {reason}")]
    EmptyOrDegenerateGeometry { reason: String },

    /// Erreur d'I/O lors de la lecture d'un fichier d'échange
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document JSON invalide
    #[error("Invalid JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration des blocs incohérente
    #[error("Invalid layout: {0}")]
    Layout(String),

    /// Bloc inconnu
    #[error("Unknown block: {0}")]
    UnknownBlock(String),
}

impl VfkError {
    /// Crée une erreur de topologie avec contexte
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTopology {
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie dégénérée
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::EmptyOrDegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Vrai pour les erreurs locales à une feature
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            Self::PointNotFound { .. }
                | Self::LineTooShort { .. }
                | Self::MalformedTopology { .. }
                | Self::InconsistentRingCount { .. }
                | Self::EmptyOrDegenerateGeometry { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VfkError::InconsistentRingCount {
            rings: 3,
            holes: 0,
            bridges: 1,
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent ring count: 3 rings, 0 holes, 1 bridges"
        );
        assert_eq!(
            VfkError::malformed("2 unplaced segments").to_string(),
            "Malformed topology: 2 unplaced segments"
        );
    }

    #[test]
    fn test_is_geometry_error() {
        assert!(VfkError::PointNotFound { point_id: 1 }.is_geometry_error());
        assert!(VfkError::degenerate("empty").is_geometry_error());
        assert!(!VfkError::Layout("x".to_string()).is_geometry_error());
        assert!(!VfkError::UnknownBlock("PAR".to_string()).is_geometry_error());
    }
}
