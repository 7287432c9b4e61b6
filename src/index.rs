//! Document index abstraction consumed by the training and inference core.
//!
//! The core never tokenizes text. It sees documents only through a
//! [`DocumentIndex`], which resolves external document keys to internal ids
//! and hands out the `(term, frequency)` postings of each document over a
//! dense vocabulary `[0, vocabulary_size]`.

pub mod memory;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextCatError};

pub use memory::{MemoryIndex, MemoryIndexBuilder};

/// Internal numeric document identifier.
pub type DocId = u64;

/// Vocabulary term identifier.
pub type TermId = u32;

/// A single `(term, frequency)` entry of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The term id.
    pub term_id: TermId,
    /// Number of occurrences of the term in the document.
    pub freq: u32,
}

impl Posting {
    /// Create a new posting.
    pub fn new(term_id: TermId, freq: u32) -> Self {
        Posting { term_id, freq }
    }
}

impl From<(TermId, u32)> for Posting {
    fn from((term_id, freq): (TermId, u32)) -> Self {
        Posting { term_id, freq }
    }
}

/// Trait for document stores that expose per-document term frequencies.
pub trait DocumentIndex: Send + Sync + Debug {
    /// Resolve an external document key to its internal id.
    ///
    /// Fails with [`TextCatError::DocumentNotFound`] when the key is unknown.
    fn resolve(&self, key: &str) -> Result<DocId>;

    /// Get the postings of a document. Order is not significant.
    fn postings(&self, doc_id: DocId) -> Result<Vec<Posting>>;

    /// Get the largest valid term id. Term arrays have `vocabulary_size() + 1` slots.
    fn vocabulary_size(&self) -> TermId;

    /// Get the external key of a document.
    fn document_key(&self, doc_id: DocId) -> Option<&str>;

    /// Get the surface text of a term, if the index keeps it.
    fn term_text(&self, term_id: TermId) -> Option<&str> {
        let _ = term_id;
        None
    }

    /// Resolve a key and fetch its postings in one step.
    fn postings_for_key(&self, key: &str) -> Result<Vec<Posting>> {
        let doc_id = self.resolve(key)?;
        self.postings(doc_id)
    }

    /// Number of slots in a term-indexed array for this vocabulary.
    fn term_slots(&self) -> usize {
        self.vocabulary_size() as usize + 1
    }
}

/// Validate a term id against the vocabulary and return its array slot.
pub fn check_term(term_id: TermId, vocabulary_size: TermId) -> Result<usize> {
    if term_id > vocabulary_size {
        return Err(TextCatError::TermOutOfRange {
            term_id,
            vocabulary_size,
        });
    }
    Ok(term_id as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_term_bounds() {
        assert_eq!(check_term(0, 2).unwrap(), 0);
        assert_eq!(check_term(2, 2).unwrap(), 2);

        match check_term(3, 2) {
            Err(TextCatError::TermOutOfRange {
                term_id,
                vocabulary_size,
            }) => {
                assert_eq!(term_id, 3);
                assert_eq!(vocabulary_size, 2);
            }
            other => panic!("Expected TermOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_posting_from_tuple() {
        let posting: Posting = (4, 7).into();
        assert_eq!(posting, Posting::new(4, 7));
    }
}
