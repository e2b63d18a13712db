//! Shingle vocabulary: dense integer ids for every distinct shingle.
//!
//! Ids are handed out in first-encountered order, walking documents in
//! collection order and each [`ShingleSet`] in its first-occurrence order.
//! The exact id a shingle receives is an artifact of that walk; callers may
//! only rely on ids being unique and covering `[0, len)`.

use hashbrown::HashMap;

use crate::shingles::ShingleSet;

/// Mapping from shingle to its dense id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    ids: HashMap<String, u64>,
    shingles: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh vocabulary covering every shingle of every set.
    pub fn build(shingle_sets: &[ShingleSet]) -> Self {
        let mut vocab = Self::new();
        for set in shingle_sets {
            for shingle in set.iter() {
                vocab.intern(shingle);
            }
        }
        vocab
    }

    /// Return the id of `shingle`, assigning the next free id if it is new.
    pub fn intern(&mut self, shingle: &str) -> u64 {
        if let Some(&id) = self.ids.get(shingle) {
            return id;
        }
        let id = self.shingles.len() as u64;
        self.ids.insert(shingle.to_owned(), id);
        self.shingles.push(shingle.to_owned());
        id
    }

    /// Id of `shingle`, if it was seen while building.
    pub fn id(&self, shingle: &str) -> Option<u64> {
        self.ids.get(shingle).copied()
    }

    /// Shingle that owns `id`.
    pub fn shingle(&self, id: u64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.shingles.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shingles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shingles.is_empty()
    }

    /// Iterate `(shingle, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.shingles
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.as_str(), idx as u64))
    }
}
