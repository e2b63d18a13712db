use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for exact-similarity operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Minimum Jaccard weight for an edge of the pairwise graph, in `[0, 1]`.
    #[serde(default = "MatchConfig::default_threshold")]
    pub threshold: f64,
    /// How many of the best exact matches count as true neighbors when
    /// judging LSH candidates.
    #[serde(default = "MatchConfig::default_top_n")]
    pub top_n: usize,
}

impl MatchConfig {
    pub(crate) fn default_threshold() -> f64 {
        0.3
    }

    pub(crate) fn default_top_n() -> usize {
        5
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MatchError> {
        validate_threshold(self.threshold)?;
        if self.top_n == 0 {
            return Err(MatchError::InvalidTopN);
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            top_n: Self::default_top_n(),
        }
    }
}

/// Reject thresholds outside `[0, 1]`, NaN included.
pub fn validate_threshold(threshold: f64) -> Result<(), MatchError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MatchError::InvalidThreshold { threshold });
    }
    Ok(())
}

/// One entry of an exact-similarity ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankedHit {
    pub doc_id: usize,
    /// Jaccard similarity with the query, in `(0, 1]`.
    pub score: f64,
}

/// Edge of the baseline similarity graph; always `source < target`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// How an LSH candidate set compares with the exact top-N neighbors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateEvaluation {
    /// Exact neighbors the index also returned, ascending.
    pub true_positives: Vec<usize>,
    /// Candidates outside the exact top-N, ascending.
    pub false_positives: Vec<usize>,
    /// Exact neighbors the index missed, ascending.
    pub false_negatives: Vec<usize>,
    /// `|tp| / |candidates|`, or 1.0 with no candidates.
    pub precision: f64,
    /// `|tp| / |neighbors|`, or 1.0 with no neighbors.
    pub recall: f64,
}

/// Errors returned by the exact-similarity layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid parameter: threshold must be within [0, 1] (got {threshold})")]
    InvalidThreshold { threshold: f64 },

    #[error("invalid parameter: top_n must be >= 1")]
    InvalidTopN,

    #[error("unknown document {doc_id} (collection has {documents} documents)")]
    UnknownDocument { doc_id: usize, documents: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.threshold, 0.3);
        assert_eq!(cfg.top_n, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn config_rejects_zero_top_n() {
        let cfg = MatchConfig::new().with_top_n(0);
        assert_eq!(cfg.validate(), Err(MatchError::InvalidTopN));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: MatchConfig = serde_json::from_str(r#"{"threshold":0.5}"#).unwrap();
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.top_n, 5);
    }

    #[test]
    fn error_display() {
        let err = MatchError::InvalidThreshold { threshold: 2.0 };
        assert!(err.to_string().starts_with("invalid parameter"));
        let err = MatchError::UnknownDocument {
            doc_id: 9,
            documents: 3,
        };
        assert!(err.to_string().contains("unknown document 9"));
    }
}
