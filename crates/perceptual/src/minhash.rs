//! MinHash signatures over vocabulary ids.
//!
//! Position `j` of a document's signature is the minimum of `h_j(id)` over
//! the ids of all its shingles, where `h_j` is the `j`-th function of the
//! [`HashFamily`]. Cost is O(documents × hashes × shingles per document).

use serde::{Deserialize, Serialize};

use crate::config::PerceptualError;
use crate::hash_family::{HashFamily, HashFunction};
use crate::shingles::ShingleSet;
use crate::vocabulary::Vocabulary;

/// Sentinel for a position that saw no shingle at all.
///
/// Every real hash value is below `2^32 - 1`, so this can never collide with
/// one.
pub const UNSET: u64 = u64::MAX;

/// Fixed-length MinHash signature of one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Signature(Vec<u64>);

impl Signature {
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any position is still [`UNSET`].
    pub fn has_unset(&self) -> bool {
        self.0.iter().any(|&v| v == UNSET)
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

impl From<Vec<u64>> for Signature {
    fn from(values: Vec<u64>) -> Self {
        Self(values)
    }
}

impl AsRef<[u64]> for Signature {
    fn as_ref(&self) -> &[u64] {
        &self.0
    }
}

/// Build one signature per shingle set, in collection order.
///
/// Every shingle must have an id in `vocabulary`; a missing one means the
/// vocabulary was built from a different collection and is reported as
/// [`PerceptualError::UnknownShingle`].
pub fn build_signatures(
    shingle_sets: &[ShingleSet],
    vocabulary: &Vocabulary,
    family: &HashFamily,
) -> Result<Vec<Signature>, PerceptualError> {
    shingle_sets
        .iter()
        .map(|set| signature_for(set, vocabulary, family))
        .collect()
}

/// Signature of a single shingle set. All shingles must be in `vocabulary`.
pub fn signature_for(
    set: &ShingleSet,
    vocabulary: &Vocabulary,
    family: &HashFamily,
) -> Result<Signature, PerceptualError> {
    let ids = set
        .iter()
        .map(|shingle| {
            vocabulary
                .id(shingle)
                .ok_or_else(|| PerceptualError::UnknownShingle {
                    shingle: shingle.to_owned(),
                })
        })
        .collect::<Result<Vec<u64>, _>>()?;
    Ok(signature_from_ids(&ids, family))
}

/// Signature of an ad-hoc shingle set, skipping shingles the vocabulary has
/// never seen. Returns the signature and the number of shingles used; with
/// zero known shingles every position is [`UNSET`].
pub fn signature_for_known(
    set: &ShingleSet,
    vocabulary: &Vocabulary,
    family: &HashFamily,
) -> (Signature, usize) {
    let ids: Vec<u64> = set.iter().filter_map(|s| vocabulary.id(s)).collect();
    (signature_from_ids(&ids, family), ids.len())
}

fn signature_from_ids(ids: &[u64], family: &HashFamily) -> Signature {
    let mut values = Vec::with_capacity(family.len());
    for f in family.iter() {
        values.push(compute_slot(ids, f));
    }
    Signature(values)
}

/// Minimum of `f` over `ids`, or [`UNSET`] for no ids.
#[inline]
pub(crate) fn compute_slot(ids: &[u64], f: &HashFunction) -> u64 {
    let mut minv = UNSET;
    for &id in ids {
        let h = f.apply(id);
        if h < minv {
            minv = h;
        }
    }
    minv
}

/// Fraction of positions where two signatures agree.
///
/// Under a shared hash family this estimates the Jaccard similarity of the
/// underlying shingle sets. Signatures of different length, empty ones, and
/// positions unset on both sides do not count as agreement.
pub fn estimate_similarity(a: &Signature, b: &Signature) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matches = a
        .values()
        .iter()
        .zip(b.values())
        .filter(|(x, y)| x == y && **x != UNSET)
        .count();
    matches as f64 / a.len() as f64
}
