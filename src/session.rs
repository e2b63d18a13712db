//! Session state machine over one build of a document collection.
//!
//! A session is `Unbuilt` until [`Session::process`] succeeds. Every
//! successful rebuild replaces the whole [`Snapshot`] at once, so queries
//! never observe a mix of old and new shingles, signatures, or buckets. A
//! rebuild that fails banding leaves a previously built session `Stale`,
//! and queries are refused until the next successful rebuild.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use index::{BandIndex, CandidatePair, IndexError, IndexStats};
use matcher::{
    evaluate_candidates, pairwise_graph, rank_by_similarity, rank_set, top_neighbors,
    validate_threshold, CandidateEvaluation, RankedHit, SimilarityEdge,
};
use perceptual::{
    fingerprint_documents, shingle_documents, shingles, signature_for_known, PerceptualConfig,
    PerceptualFingerprints, ShingleSet, Signature,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::{MetricsSpan, PipelineConfig, PipelineError};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unbuilt,
    Built,
    /// A built session whose last rebuild failed banding.
    Stale,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessStatus {
    Ok,
    /// `num_hashes` does not split into `num_bands` bands; nothing from
    /// this rebuild is valid.
    IncompatibleBanding { num_hashes: usize, num_bands: usize },
}

impl ProcessStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProcessStatus::Ok)
    }
}

/// Result of [`Session::process`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub status: ProcessStatus,
    /// One signature per document, in collection order. Empty unless the
    /// status is `Ok`.
    pub signatures: Vec<Signature>,
    /// Document pairs sharing at least one bucket, ascending.
    pub candidate_edges: Vec<CandidatePair>,
    pub vocabulary_size: usize,
    pub index_stats: Option<IndexStats>,
}

impl ProcessReport {
    fn incompatible(cfg: &PipelineConfig) -> Self {
        Self {
            status: ProcessStatus::IncompatibleBanding {
                num_hashes: cfg.perceptual.num_hashes,
                num_bands: cfg.index.num_bands,
            },
            signatures: Vec::new(),
            candidate_edges: Vec::new(),
            vocabulary_size: 0,
            index_stats: None,
        }
    }

    /// Turn an `IncompatibleBanding` status into an error.
    pub fn into_result(self) -> Result<Self, PipelineError> {
        match self.status {
            ProcessStatus::Ok => Ok(self),
            ProcessStatus::IncompatibleBanding {
                num_hashes,
                num_bands,
            } => Err(PipelineError::Index(IndexError::IncompatibleBanding {
                signature_len: num_hashes,
                num_bands,
            })),
        }
    }
}

/// Result of a query by document id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub doc_id: usize,
    /// LSH candidates; never contains `doc_id`.
    pub candidates: BTreeSet<usize>,
    /// Exact Jaccard ranking of every other document with non-zero
    /// similarity.
    pub ranked: Vec<RankedHit>,
    /// The first `top_n` ids of `ranked`.
    pub top_neighbors: Vec<usize>,
    pub evaluation: CandidateEvaluation,
}

/// Result of a query by free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextQueryReport {
    /// Distinct shingles of the query text.
    pub total_shingles: usize,
    /// Shingles the collection vocabulary knows; only these are signed.
    pub known_shingles: usize,
    pub candidates: BTreeSet<usize>,
    pub ranked: Vec<RankedHit>,
}

/// Everything derived from one successful rebuild.
#[derive(Debug)]
pub struct Snapshot {
    documents: Vec<String>,
    fingerprints: PerceptualFingerprints,
    index: BandIndex,
    config: PipelineConfig,
}

impl Snapshot {
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn fingerprints(&self) -> &PerceptualFingerprints {
        &self.fingerprints
    }

    pub fn shingle_sets(&self) -> &[ShingleSet] {
        &self.fingerprints.shingle_sets
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.fingerprints.signatures
    }

    pub fn index(&self) -> &BandIndex {
        &self.index
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// LSH candidates for `doc_id` next to the exact ranking.
    pub fn run_query(&self, doc_id: usize) -> Result<QueryReport, PipelineError> {
        let candidates = self.index.query(doc_id, self.signatures())?;
        let ranked = rank_by_similarity(doc_id, self.shingle_sets())?;

        let top_n = self.config.matcher.top_n;
        let evaluation = evaluate_candidates(&candidates, &ranked, top_n);
        debug!(
            doc_id,
            candidates = candidates.len(),
            ranked = ranked.len(),
            precision = evaluation.precision,
            recall = evaluation.recall,
            "docsim.query"
        );

        Ok(QueryReport {
            doc_id,
            candidates: candidates.into_iter().collect(),
            top_neighbors: top_neighbors(&ranked, top_n),
            ranked,
            evaluation,
        })
    }

    /// Query with text outside the collection. Shingles the vocabulary has
    /// never seen are ignored; with none known there are no candidates.
    pub fn query_text(&self, text: &str) -> Result<TextQueryReport, PipelineError> {
        let set = shingles(text, self.config.perceptual.k)?;
        let (signature, known_shingles) = signature_for_known(
            &set,
            &self.fingerprints.vocabulary,
            &self.fingerprints.hash_family,
        );
        let candidates = if known_shingles == 0 {
            BTreeSet::new()
        } else {
            self.index
                .query_signature(&signature, None)
                .into_iter()
                .collect()
        };
        let ranked = rank_set(&set, self.shingle_sets(), None);
        debug!(
            total_shingles = set.len(),
            known_shingles,
            candidates = candidates.len(),
            "docsim.query_text"
        );

        Ok(TextQueryReport {
            total_shingles: set.len(),
            known_shingles,
            candidates,
            ranked,
        })
    }

    /// Exact similarity graph at the configured threshold.
    pub fn pairwise_graph(&self) -> Result<Vec<SimilarityEdge>, PipelineError> {
        Ok(pairwise_graph(
            self.shingle_sets(),
            self.config.matcher.threshold,
        )?)
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Unbuilt,
    Built(Arc<Snapshot>),
    Stale,
}

/// Owner of the current build of a document collection.
#[derive(Debug, Default)]
pub struct Session {
    state: State,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match self.state {
            State::Unbuilt => SessionState::Unbuilt,
            State::Built(_) => SessionState::Built,
            State::Stale => SessionState::Stale,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, State::Built(_))
    }

    /// Shared handle to the current build. It stays valid and internally
    /// consistent after later rebuilds.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        match &self.state {
            State::Built(snapshot) => Some(Arc::clone(snapshot)),
            State::Unbuilt | State::Stale => None,
        }
    }

    /// Rebuild from scratch: shingles, vocabulary, hash family, signatures,
    /// and band index.
    ///
    /// Invalid parameters are rejected before any work and leave the
    /// session untouched. A banding mismatch is reported through
    /// [`ProcessReport::status`] and marks a built session stale.
    pub fn process<S: AsRef<str>>(
        &mut self,
        documents: &[S],
        cfg: &PipelineConfig,
    ) -> Result<ProcessReport, PipelineError> {
        let process_span = info_span!(
            "docsim.process",
            documents = documents.len(),
            k = cfg.perceptual.k,
            num_hashes = cfg.perceptual.num_hashes,
            num_bands = cfg.index.num_bands,
        );
        let _guard = process_span.enter();

        if let Err(err) = cfg.validate() {
            warn!(error = %err, "docsim.process.invalid_parameter");
            return Err(err);
        }

        let start = Instant::now();
        if cfg.rows_per_band().is_none() {
            let metrics = MetricsSpan::start();
            if let Some(span) = metrics {
                span.record_index(Err(IndexError::IncompatibleBanding {
                    signature_len: cfg.perceptual.num_hashes,
                    num_bands: cfg.index.num_bands,
                }));
            }
            return Ok(self.mark_incompatible(cfg));
        }

        let metrics = MetricsSpan::start();
        let fingerprints = match fingerprint_documents(documents, &cfg.perceptual) {
            Ok(fingerprints) => {
                if let Some(span) = metrics {
                    span.record_perceptual(Ok(()));
                }
                fingerprints
            }
            Err(err) => {
                if let Some(span) = metrics {
                    span.record_perceptual(Err(err.clone()));
                }
                warn!(error = %err, "docsim.process.perceptual_failed");
                return Err(err.into());
            }
        };

        let metrics = MetricsSpan::start();
        let index = match BandIndex::build_with(&fingerprints.signatures, &cfg.index) {
            Ok(index) => {
                if let Some(span) = metrics {
                    span.record_index(Ok(()));
                }
                index
            }
            Err(err) => {
                if let Some(span) = metrics {
                    span.record_index(Err(err.clone()));
                }
                if matches!(err, IndexError::IncompatibleBanding { .. }) {
                    return Ok(self.mark_incompatible(cfg));
                }
                warn!(error = %err, "docsim.process.index_failed");
                return Err(err.into());
            }
        };

        let candidate_edges = index.candidate_pairs();
        let index_stats = index.stats();
        let report = ProcessReport {
            status: ProcessStatus::Ok,
            signatures: fingerprints.signatures.clone(),
            candidate_edges,
            vocabulary_size: fingerprints.vocabulary.len(),
            index_stats: Some(index_stats.clone()),
        };

        info!(
            vocabulary_size = report.vocabulary_size,
            buckets = index_stats.buckets,
            rows_per_band = index_stats.rows_per_band,
            candidate_edges = report.candidate_edges.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "docsim.process.built"
        );

        self.state = State::Built(Arc::new(Snapshot {
            documents: documents.iter().map(|d| d.as_ref().to_owned()).collect(),
            fingerprints,
            index,
            config: cfg.clone(),
        }));
        Ok(report)
    }

    fn mark_incompatible(&mut self, cfg: &PipelineConfig) -> ProcessReport {
        if !matches!(self.state, State::Unbuilt) {
            self.state = State::Stale;
        }
        warn!(
            num_hashes = cfg.perceptual.num_hashes,
            num_bands = cfg.index.num_bands,
            state = ?self.state(),
            "docsim.process.incompatible_banding"
        );
        ProcessReport::incompatible(cfg)
    }

    fn built(&self) -> Result<&Snapshot, PipelineError> {
        match &self.state {
            State::Built(snapshot) => Ok(snapshot),
            State::Unbuilt => Err(PipelineError::NotBuilt { stale: false }),
            State::Stale => Err(PipelineError::NotBuilt { stale: true }),
        }
    }

    /// LSH candidates and exact ranking for document `doc_id`.
    pub fn run_query(&self, doc_id: usize) -> Result<QueryReport, PipelineError> {
        let metrics = MetricsSpan::start();
        let result = self.built().and_then(|snapshot| snapshot.run_query(doc_id));
        if let Some(span) = metrics {
            span.record_query(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        if let Err(err) = &result {
            warn!(doc_id, error = %err, "docsim.query.failed");
        }
        result
    }

    /// See [`Snapshot::query_text`].
    pub fn query_text(&self, text: &str) -> Result<TextQueryReport, PipelineError> {
        let metrics = MetricsSpan::start();
        let result = self.built().and_then(|snapshot| snapshot.query_text(text));
        if let Some(span) = metrics {
            span.record_query(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        if let Err(err) = &result {
            warn!(error = %err, "docsim.query_text.failed");
        }
        result
    }

    /// Exact similarity graph of the current build.
    pub fn pairwise_graph(&self) -> Result<Vec<SimilarityEdge>, PipelineError> {
        self.built()?.pairwise_graph()
    }
}

/// Exact similarity graph straight from raw documents, without a session.
///
/// `k` and `threshold` are checked before any shingling.
pub fn compute_pairwise_graph<S: AsRef<str>>(
    documents: &[S],
    k: usize,
    threshold: f64,
) -> Result<Vec<SimilarityEdge>, PipelineError> {
    PerceptualConfig::new().with_k(k).validate()?;
    validate_threshold(threshold)?;

    let sets = shingle_documents(documents, k)?;
    Ok(pairwise_graph(&sets, threshold)?)
}

/// A [`Session`] shared between threads.
///
/// Rebuilds take the write lock and wait for in-flight queries; queries
/// take read locks and run concurrently.
#[derive(Debug, Default)]
pub struct SharedSession {
    inner: RwLock<Session>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.read().state()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.read().snapshot()
    }

    pub fn process<S: AsRef<str>>(
        &self,
        documents: &[S],
        cfg: &PipelineConfig,
    ) -> Result<ProcessReport, PipelineError> {
        self.write().process(documents, cfg)
    }

    pub fn run_query(&self, doc_id: usize) -> Result<QueryReport, PipelineError> {
        self.read().run_query(doc_id)
    }

    pub fn query_text(&self, text: &str) -> Result<TextQueryReport, PipelineError> {
        self.read().query_text(text)
    }

    pub fn pairwise_graph(&self) -> Result<Vec<SimilarityEdge>, PipelineError> {
        self.read().pairwise_graph()
    }
}
