//! # Docsim Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` is the exact-similarity layer of docsim. It computes Jaccard
//! similarity directly over shingle sets and is used two ways:
//! - as a brute-force ranking for a single query document, which serves as
//!   ground truth when judging LSH candidates;
//! - as a baseline pairwise similarity graph over a whole collection.
//!
//! Nothing here consults the band index; every operation is a full scan.
//!
//! ## Core Types
//!
//! - [`RankedHit`]: document id + exact Jaccard score.
//! - [`SimilarityEdge`]: `(source, target, weight)` with `source < target`.
//! - [`CandidateEvaluation`]: precision and recall of an LSH candidate set
//!   against the exact top-N neighbors.
//! - [`MatchConfig`]: graph threshold and top-N size.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::{pairwise_graph, rank_by_similarity};
//! use perceptual::shingle_documents;
//!
//! let sets = shingle_documents(&["the cat sat", "the cat ran", "a dog barked"], 3)?;
//!
//! let ranked = rank_by_similarity(0, &sets)?;
//! assert_eq!(ranked[0].doc_id, 1);
//!
//! let edges = pairwise_graph(&sets, 0.3)?;
//! assert!(edges.iter().all(|edge| edge.source < edge.target));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to
//! record latency and output sizes of rankings and graph builds.

pub mod engine;
pub mod metrics;
pub mod similarity;
pub mod types;

pub use crate::engine::{
    evaluate_candidates, pairwise_graph, rank_by_similarity, rank_set, top_neighbors,
};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::similarity::jaccard;
pub use crate::types::{
    validate_threshold, CandidateEvaluation, MatchConfig, MatchError, RankedHit, SimilarityEdge,
};
