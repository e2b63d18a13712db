//! Character k-shingling for the docsim perceptual layer.
//!
//! A document is read as a sequence of Unicode scalar values (`char`s), so a
//! shingle never splits a multi-byte character. Shingling is O(n) in the
//! number of characters.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::config::PerceptualError;

/// Set of distinct shingles drawn from one document.
///
/// Besides the membership set, the shingles are kept in first-occurrence
/// order. That order is what vocabulary assignment walks, so ids are
/// reproducible for the same input instead of depending on hash-set
/// iteration order. Equality only compares membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ShingleSet {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl ShingleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            ordered: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Add a shingle. Returns `false` when it was already present.
    pub fn insert(&mut self, shingle: &str) -> bool {
        if self.members.contains(shingle) {
            return false;
        }
        self.members.insert(shingle.to_owned());
        self.ordered.push(shingle.to_owned());
        true
    }

    pub fn contains(&self, shingle: &str) -> bool {
        self.members.contains(shingle)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterate shingles in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.ordered.iter().map(String::as_str)
    }

    /// Number of shingles present in both sets.
    pub fn intersection_len(&self, other: &ShingleSet) -> usize {
        // Probe the larger set with the smaller one.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().filter(|s| large.contains(s)).count()
    }

    /// Number of shingles present in either set.
    pub fn union_len(&self, other: &ShingleSet) -> usize {
        self.len() + other.len() - self.intersection_len(other)
    }
}

impl PartialEq for ShingleSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for ShingleSet {}

impl<S: AsRef<str>> FromIterator<S> for ShingleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ShingleSet::new();
        for shingle in iter {
            set.insert(shingle.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for ShingleSet {
    fn from(shingles: Vec<String>) -> Self {
        shingles.into_iter().collect()
    }
}

impl From<ShingleSet> for Vec<String> {
    fn from(set: ShingleSet) -> Self {
        set.ordered
    }
}

/// Split `document` into its set of k-character shingles.
///
/// A document shorter than `k` characters yields a single shingle: the whole
/// document (the empty string included), so no document ends up with an
/// empty set and an unset signature.
pub fn shingles(document: &str, k: usize) -> Result<ShingleSet, PerceptualError> {
    if k == 0 {
        return Err(PerceptualError::InvalidConfigK { k });
    }

    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = document
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(document.len()))
        .collect();
    let char_len = bounds.len() - 1;

    if char_len < k {
        let mut set = ShingleSet::with_capacity(1);
        set.insert(document);
        return Ok(set);
    }

    let mut set = ShingleSet::with_capacity(char_len - k + 1);
    for start in 0..=char_len - k {
        set.insert(&document[bounds[start]..bounds[start + k]]);
    }
    Ok(set)
}

/// Shingle every document in collection order.
pub fn shingle_documents<S: AsRef<str>>(
    documents: &[S],
    k: usize,
) -> Result<Vec<ShingleSet>, PerceptualError> {
    documents
        .iter()
        .map(|doc| shingles(doc.as_ref(), k))
        .collect()
}
