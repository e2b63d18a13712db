use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use perceptual::ShingleSet;
use tracing::debug;

use crate::metrics::metrics_recorder;
use crate::similarity::jaccard;
use crate::types::{validate_threshold, CandidateEvaluation, MatchError, RankedHit, SimilarityEdge};


/// Rank every other document by exact Jaccard similarity with `query_id`.
///
/// Zero-similarity documents are left out. Scores are sorted descending;
/// ties keep collection order. This is a full O(documents × set size) scan
/// and does not consult any index.
pub fn rank_by_similarity(
    query_id: usize,
    shingle_sets: &[ShingleSet],
) -> Result<Vec<RankedHit>, MatchError> {
    let query = shingle_sets
        .get(query_id)
        .ok_or(MatchError::UnknownDocument {
            doc_id: query_id,
            documents: shingle_sets.len(),
        })?;
    let hits = rank_set(query, shingle_sets, Some(query_id));
    debug!(query_id, hits = hits.len(), "matcher.ranked");
    Ok(hits)
}

/// Rank documents by exact Jaccard similarity with an arbitrary shingle
/// set, leaving out `exclude`. Same ordering rules as
/// [`rank_by_similarity`].
pub fn rank_set(
    query: &ShingleSet,
    shingle_sets: &[ShingleSet],
    exclude: Option<usize>,
) -> Vec<RankedHit> {
    let start = Instant::now();
    let mut hits: Vec<RankedHit> = shingle_sets
        .iter()
        .enumerate()
        .filter(|&(doc_id, _)| Some(doc_id) != exclude)
        .filter_map(|(doc_id, set)| {
            let score = jaccard(query, set);
            (score > 0.0).then_some(RankedHit { doc_id, score })
        })
        .collect();

    // Stable sort: equal scores stay in document order.
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));

    let latency = start.elapsed();
    let compared = shingle_sets.len() - usize::from(exclude.is_some_and(|id| id < shingle_sets.len()));
    if let Some(recorder) = metrics_recorder() {
        recorder.record_rank(latency, compared, hits.len());
    }
    debug!(
        compared,
        hits = hits.len(),
        elapsed_micros = latency.as_micros(),
        "matcher.rank_set"
    );

    hits
}

/// Exact Jaccard similarity for every document pair with weight at least
/// `threshold`, ordered by `(source, target)`.
pub fn pairwise_graph(
    shingle_sets: &[ShingleSet],
    threshold: f64,
) -> Result<Vec<SimilarityEdge>, MatchError> {
    validate_threshold(threshold)?;

    let start = Instant::now();
    let mut edges = Vec::new();
    for (source, a) in shingle_sets.iter().enumerate() {
        for (offset, b) in shingle_sets[source + 1..].iter().enumerate() {
            let weight = jaccard(a, b);
            if weight >= threshold {
                edges.push(SimilarityEdge {
                    source,
                    target: source + 1 + offset,
                    weight,
                });
            }
        }
    }

    let n = shingle_sets.len();
    let pairs = n * n.saturating_sub(1) / 2;
    let latency = start.elapsed();
    if let Some(recorder) = metrics_recorder() {
        recorder.record_graph(latency, pairs, edges.len());
    }
    debug!(
        pairs,
        edges = edges.len(),
        threshold,
        elapsed_micros = latency.as_micros(),
        "matcher.graph"
    );

    Ok(edges)
}

/// The first `top_n` document ids of a ranking.
pub fn top_neighbors(ranked: &[RankedHit], top_n: usize) -> Vec<usize> {
    ranked.iter().take(top_n).map(|hit| hit.doc_id).collect()
}

/// Compare an LSH candidate set with the exact top-`top_n` neighbors.
pub fn evaluate_candidates(
    candidates: &HashSet<usize>,
    ranked: &[RankedHit],
    top_n: usize,
) -> CandidateEvaluation {
    let neighbors: BTreeSet<usize> = top_neighbors(ranked, top_n).into_iter().collect();
    let candidates: BTreeSet<usize> = candidates.iter().copied().collect();

    let true_positives: Vec<usize> = candidates.intersection(&neighbors).copied().collect();
    let false_positives: Vec<usize> = candidates.difference(&neighbors).copied().collect();
    let false_negatives: Vec<usize> = neighbors.difference(&candidates).copied().collect();

    let ratio = |num: usize, den: usize| if den == 0 { 1.0 } else { num as f64 / den as f64 };

    CandidateEvaluation {
        precision: ratio(true_positives.len(), candidates.len()),
        recall: ratio(true_positives.len(), neighbors.len()),
        true_positives,
        false_positives,
        false_negatives,
    }
}
