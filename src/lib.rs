//! Workspace umbrella crate for docsim, a MinHash + LSH text similarity
//! pipeline.
//!
//! The layers live in their own crates (`perceptual` for shingles and
//! signatures, `index` for the band index, `matcher` for exact Jaccard).
//! This crate ties them into a [`Session`] that owns one consistent build
//! of a document collection and answers queries against it.
//!
//! ```
//! use docsim::{PipelineConfig, Session, SessionState};
//!
//! let docs = ["the cat sat", "the cat ran", "a dog barked"];
//! let cfg = PipelineConfig::new()
//!     .with_k(3)
//!     .with_num_hashes(20)
//!     .with_num_bands(10)
//!     .with_seed(42);
//!
//! let mut session = Session::new();
//! let report = session.process(&docs, &cfg)?;
//! assert!(report.status.is_ok());
//! assert_eq!(session.state(), SessionState::Built);
//!
//! let query = session.run_query(0)?;
//! assert!(!query.candidates.contains(&0));
//! assert_eq!(query.ranked[0].doc_id, 1);
//! # Ok::<(), docsim::PipelineError>(())
//! ```

pub mod config;
mod session;

pub use index::{
    collision_probability, rows_per_band_truncated, similarity_threshold, BandIndex,
    CandidatePair, IndexConfig, IndexError, IndexStats,
};
pub use matcher::{
    evaluate_candidates, jaccard, pairwise_graph, rank_by_similarity, rank_set,
    set_match_metrics, top_neighbors, CandidateEvaluation, MatchConfig, MatchError, MatchMetrics,
    RankedHit, SimilarityEdge,
};
pub use perceptual::{
    estimate_similarity, fingerprint_documents, shingle_documents, shingles, HashFamily,
    PerceptualConfig, PerceptualError, PerceptualFingerprints, ShingleSet, Signature, Vocabulary,
};

pub use crate::config::{ConfigLoadError, DocsimConfig};
pub use crate::session::{
    compute_pairwise_graph, ProcessReport, ProcessStatus, QueryReport, Session, SessionState,
    SharedSession, Snapshot, TextQueryReport,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A caller-supplied parameter was rejected before any work started.
    InvalidParameter,
    /// The signature length does not split into the requested bands.
    IncompatibleBanding,
    /// A document id outside the current collection.
    UnknownDocument,
    /// A query was issued while no valid build exists.
    NotBuilt,
}

/// Errors that can occur while building or querying a session.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Perceptual(PerceptualError),
    Index(IndexError),
    Match(MatchError),
    /// Queries are refused until a build succeeds. `stale` is set when an
    /// earlier build existed but the last rebuild failed banding.
    NotBuilt { stale: bool },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Perceptual(_) => ErrorKind::InvalidParameter,
            PipelineError::Index(err) => match err {
                IndexError::InvalidNumBands { .. } => ErrorKind::InvalidParameter,
                IndexError::IncompatibleBanding { .. }
                | IndexError::SignatureLengthMismatch { .. } => ErrorKind::IncompatibleBanding,
                IndexError::UnknownDocument { .. } => ErrorKind::UnknownDocument,
            },
            PipelineError::Match(err) => match err {
                MatchError::InvalidThreshold { .. } | MatchError::InvalidTopN => {
                    ErrorKind::InvalidParameter
                }
                MatchError::UnknownDocument { .. } => ErrorKind::UnknownDocument,
            },
            PipelineError::NotBuilt { .. } => ErrorKind::NotBuilt,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Perceptual(err) => write!(f, "perceptual stage failed: {err}"),
            PipelineError::Index(err) => write!(f, "index stage failed: {err}"),
            PipelineError::Match(err) => write!(f, "exact matching failed: {err}"),
            PipelineError::NotBuilt { stale: false } => {
                write!(f, "session has not been built; run process first")
            }
            PipelineError::NotBuilt { stale: true } => {
                write!(f, "session is stale after a failed rebuild; run process again")
            }
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Perceptual(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::NotBuilt { .. } => None,
        }
    }
}

impl From<PerceptualError> for PipelineError {
    fn from(value: PerceptualError) -> Self {
        PipelineError::Perceptual(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

/// Parameters for one build of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub perceptual: PerceptualConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub matcher: MatchConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.perceptual.k = k;
        self
    }

    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.perceptual.num_hashes = num_hashes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.perceptual.seed = Some(seed);
        self
    }

    pub fn with_num_bands(mut self, num_bands: usize) -> Self {
        self.index.num_bands = num_bands;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.matcher.threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.matcher.top_n = top_n;
        self
    }

    /// Check every parameter. Banding compatibility is not a parameter
    /// error and is reported by [`Session::process`] instead.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.perceptual.validate()?;
        self.index.validate()?;
        self.matcher.validate()?;
        Ok(())
    }

    /// Rows per band this configuration produces, or `None` when the
    /// signature length does not split into the requested bands.
    pub fn rows_per_band(&self) -> Option<usize> {
        self.index.rows_per_band(self.perceptual.num_hashes)
    }
}

/// Split raw input into documents, one per line. Lines that are empty or
/// whitespace-only are dropped; every other line is kept verbatim.
pub fn parse_documents(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

/// Rows per band for `num_hashes` split into `num_bands`, `None` when the
/// split leaves a remainder or an empty band.
pub fn rows_per_band(num_hashes: usize, num_bands: usize) -> Option<usize> {
    index::rows_per_band(num_hashes, num_bands)
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    /// Shingling, vocabulary and signatures for a whole collection.
    fn record_perceptual(&self, latency: Duration, result: Result<(), PerceptualError>);
    /// Band index construction.
    fn record_index(&self, latency: Duration, result: Result<(), IndexError>);
    /// One query against a built session.
    fn record_query(&self, latency: Duration, result: Result<(), PipelineError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_perceptual(self, result: Result<(), PerceptualError>) {
        self.recorder.record_perceptual(self.start.elapsed(), result);
    }

    pub(crate) fn record_index(self, result: Result<(), IndexError>) {
        self.recorder.record_index(self.start.elapsed(), result);
    }

    pub(crate) fn record_query(self, result: Result<(), PipelineError>) {
        self.recorder.record_query(self.start.elapsed(), result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    #[test]
    fn parse_documents_drops_blank_lines() {
        let text = "the cat sat\n\n   \nthe cat ran\n\t\na dog barked";
        assert_eq!(
            parse_documents(text),
            vec!["the cat sat", "the cat ran", "a dog barked"]
        );
    }

    #[test]
    fn parse_documents_keeps_lines_verbatim() {
        let text = "  padded  \r\nnext";
        assert_eq!(parse_documents(text), vec!["  padded  \r", "next"]);
    }

    #[test]
    fn parse_documents_of_empty_input() {
        assert!(parse_documents("").is_empty());
        assert!(parse_documents("\n\n").is_empty());
    }

    #[test]
    fn rows_per_band_preview() {
        assert_eq!(rows_per_band(100, 20), Some(5));
        assert_eq!(rows_per_band(20, 10), Some(2));
        assert_eq!(rows_per_band(5, 2), None);
        assert_eq!(rows_per_band(5, 10), None);
        assert_eq!(rows_per_band(5, 0), None);
    }

    #[test]
    fn pipeline_config_builders() {
        let cfg = PipelineConfig::new()
            .with_k(4)
            .with_num_hashes(60)
            .with_num_bands(12)
            .with_threshold(0.5)
            .with_top_n(3)
            .with_seed(9);
        assert_eq!(cfg.perceptual.k, 4);
        assert_eq!(cfg.perceptual.seed, Some(9));
        assert_eq!(cfg.rows_per_band(), Some(5));
        assert_eq!(cfg.matcher.top_n, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn pipeline_config_validation_kinds() {
        let cases = [
            PipelineConfig::new().with_k(0),
            PipelineConfig::new().with_num_hashes(0),
            PipelineConfig::new().with_num_bands(0),
            PipelineConfig::new().with_threshold(1.5),
            PipelineConfig::new().with_top_n(0),
        ];
        for cfg in cases {
            let err = cfg.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter, "{err}");
        }
    }

    #[test]
    fn incompatible_banding_is_not_a_parameter_error() {
        let cfg = PipelineConfig::new().with_num_hashes(5).with_num_bands(2);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.rows_per_band(), None);
    }

    #[test]
    fn error_kinds_map_crate_errors() {
        let banding: PipelineError = IndexError::IncompatibleBanding {
            signature_len: 5,
            num_bands: 2,
        }
        .into();
        assert_eq!(banding.kind(), ErrorKind::IncompatibleBanding);

        let unknown: PipelineError = IndexError::UnknownDocument {
            doc_id: 7,
            documents: 3,
        }
        .into();
        assert_eq!(unknown.kind(), ErrorKind::UnknownDocument);

        let unknown: PipelineError = MatchError::UnknownDocument {
            doc_id: 7,
            documents: 3,
        }
        .into();
        assert_eq!(unknown.kind(), ErrorKind::UnknownDocument);

        assert_eq!(
            PipelineError::NotBuilt { stale: true }.kind(),
            ErrorKind::NotBuilt
        );
    }

    #[test]
    fn error_display_and_source() {
        let err: PipelineError = PerceptualError::InvalidConfigK { k: 0 }.into();
        assert!(err.to_string().contains("k must be >= 1"));
        assert!(err.source().is_some());

        let err = PipelineError::NotBuilt { stale: true };
        assert!(err.to_string().contains("stale"));
        assert!(err.source().is_none());
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Arc<RwLock<Vec<&'static str>>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_perceptual(&self, _latency: Duration, result: Result<(), PerceptualError>) {
            let label = if result.is_ok() {
                "perceptual_ok"
            } else {
                "perceptual_err"
            };
            self.events.write().unwrap().push(label);
        }

        fn record_index(&self, _latency: Duration, result: Result<(), IndexError>) {
            let label = if result.is_ok() { "index_ok" } else { "index_err" };
            self.events.write().unwrap().push(label);
        }

        fn record_query(&self, _latency: Duration, result: Result<(), PipelineError>) {
            let label = if result.is_ok() { "query_ok" } else { "query_err" };
            self.events.write().unwrap().push(label);
        }
    }

    #[test]
    fn metrics_recorder_tracks_pipeline_outcome() {
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone() as Arc<dyn PipelineMetrics>));

        let cfg = PipelineConfig::new()
            .with_num_hashes(20)
            .with_num_bands(10)
            .with_seed(1);
        let mut session = Session::new();
        session
            .process(&["metrics validation", "metrics payload"], &cfg)
            .unwrap();
        session.run_query(0).unwrap();
        assert!(session.run_query(9).is_err());

        let events = metrics.snapshot();
        assert!(events.contains(&"perceptual_ok"));
        assert!(events.contains(&"index_ok"));
        assert!(events.contains(&"query_ok"));
        assert!(events.contains(&"query_err"));

        set_pipeline_metrics(None);
    }
}
