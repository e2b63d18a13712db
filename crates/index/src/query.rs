use std::collections::{BTreeSet, HashSet};

use perceptual::Signature;
use serde::{Deserialize, Serialize};

use crate::band::band_keys;
use crate::{BandIndex, IndexError};

/// Unordered pair of documents sharing at least one bucket; always
/// `source < target`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidatePair {
    pub source: usize,
    pub target: usize,
}

/// Candidate retrieval over a built index
impl BandIndex {
    /// Candidates for document `doc_id`: every other document sharing at
    /// least one bucket with it.
    ///
    /// `signatures` must be the collection the index was built from.
    pub fn query(
        &self,
        doc_id: usize,
        signatures: &[Signature],
    ) -> Result<HashSet<usize>, IndexError> {
        let signature = signatures
            .get(doc_id)
            .ok_or(IndexError::UnknownDocument {
                doc_id,
                documents: signatures.len(),
            })?;
        Ok(self.query_signature(signature, Some(doc_id)))
    }

    /// Candidates for an arbitrary signature, leaving out `exclude`.
    ///
    /// Returns an empty set when the index has no rows or the signature is
    /// too short for its band layout.
    pub fn query_signature(&self, signature: &Signature, exclude: Option<usize>) -> HashSet<usize> {
        let mut candidates = HashSet::new();
        for key in band_keys(signature.values(), self.num_bands, self.rows) {
            if let Some(members) = self.buckets.get(&key) {
                candidates.extend(members.iter().copied().filter(|&id| Some(id) != exclude));
            }
        }
        candidates
    }

    /// Every document pair that shares at least one bucket, ascending.
    pub fn candidate_pairs(&self) -> Vec<CandidatePair> {
        let mut pairs = BTreeSet::new();
        for members in self.buckets.values().filter(|m| m.len() > 1) {
            for (i, &source) in members.iter().enumerate() {
                for &target in &members[i + 1..] {
                    // Members are pushed in document order, so source < target.
                    pairs.insert(CandidatePair { source, target });
                }
            }
        }
        pairs.into_iter().collect()
    }
}
