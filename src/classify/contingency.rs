//! Term/class contingency counts over the training set.
//!
//! For every term `t` the table holds the number of training documents in
//! each of the four cells of the presence-by-label table:
//!
//! | cell  | term present | label      |
//! |-------|--------------|------------|
//! | `n11` | yes          | relevant   |
//! | `n10` | yes          | irrelevant |
//! | `n01` | no           | relevant   |
//! | `n00` | no           | irrelevant |
//!
//! Presence is binary per document: a term posted twice in one document is
//! counted once. Absent cells are derived from the per-class document counts
//! when the accumulator finishes, so a document costs `O(postings)` rather
//! than a sweep over the whole vocabulary.

use bit_vec::BitVec;

use crate::error::Result;
use crate::index::{DocumentIndex, Posting, TermId, check_term};
use crate::record::{Label, RecordSource, TrainingRecord};

/// The four cells of one term's contingency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermCounts {
    pub n11: u64,
    pub n10: u64,
    pub n01: u64,
    pub n00: u64,
}

impl TermCounts {
    /// Total number of documents, `n00 + n01 + n10 + n11`.
    pub fn total(&self) -> u64 {
        self.n00 + self.n01 + self.n10 + self.n11
    }
}

/// Finalized contingency table, one entry per term slot.
#[derive(Debug, Clone)]
pub struct ContingencyTable {
    n11: Vec<u64>,
    n10: Vec<u64>,
    n01: Vec<u64>,
    n00: Vec<u64>,
    documents: u64,
    relevant_documents: u64,
}

impl ContingencyTable {
    /// Scan a training stream once and build its table.
    pub fn accumulate<S>(index: &dyn DocumentIndex, source: &S) -> Result<Self>
    where
        S: RecordSource<TrainingRecord> + ?Sized,
    {
        let mut accumulator = ContingencyAccumulator::new(index.vocabulary_size());
        for record in source.records()? {
            let record = record?;
            let postings = index.postings_for_key(&record.key)?;
            accumulator.add(&postings, record.label)?;
        }

        let table = accumulator.finish();
        log::debug!(
            "Contingency table: {} documents ({} relevant) over {} term slots",
            table.documents,
            table.relevant_documents,
            table.len()
        );
        Ok(table)
    }

    /// Get the counts of a term.
    pub fn counts(&self, term_id: TermId) -> TermCounts {
        let slot = term_id as usize;
        TermCounts {
            n11: self.n11[slot],
            n10: self.n10[slot],
            n01: self.n01[slot],
            n00: self.n00[slot],
        }
    }

    /// Number of term slots (`vocabulary_size + 1`).
    pub fn len(&self) -> usize {
        self.n11.len()
    }

    /// Check if the table has no term slots.
    pub fn is_empty(&self) -> bool {
        self.n11.is_empty()
    }

    /// Number of training documents scanned.
    pub fn documents(&self) -> u64 {
        self.documents
    }

    /// Number of relevant training documents scanned.
    pub fn relevant_documents(&self) -> u64 {
        self.relevant_documents
    }

    pub fn n11(&self) -> &[u64] {
        &self.n11
    }

    pub fn n10(&self) -> &[u64] {
        &self.n10
    }

    pub fn n01(&self) -> &[u64] {
        &self.n01
    }

    pub fn n00(&self) -> &[u64] {
        &self.n00
    }
}

/// Single-pass builder for a [`ContingencyTable`].
#[derive(Debug, Clone)]
pub struct ContingencyAccumulator {
    vocabulary_size: TermId,
    n11: Vec<u64>,
    n10: Vec<u64>,
    /// Presence marker for the current document; cleared after each document.
    seen: BitVec,
    touched: Vec<usize>,
    relevant_documents: u64,
    irrelevant_documents: u64,
}

impl ContingencyAccumulator {
    /// Create an accumulator over the vocabulary `[0, vocabulary_size]`.
    pub fn new(vocabulary_size: TermId) -> Self {
        let slots = vocabulary_size as usize + 1;
        ContingencyAccumulator {
            vocabulary_size,
            n11: vec![0; slots],
            n10: vec![0; slots],
            seen: BitVec::from_elem(slots, false),
            touched: Vec::new(),
            relevant_documents: 0,
            irrelevant_documents: 0,
        }
    }

    /// Add one labeled document.
    ///
    /// All term ids are validated before any count changes, so a rejected
    /// document leaves the accumulator untouched.
    pub fn add(&mut self, postings: &[Posting], label: Label) -> Result<()> {
        for posting in postings {
            check_term(posting.term_id, self.vocabulary_size)?;
        }

        for posting in postings {
            let slot = posting.term_id as usize;
            if self.seen[slot] {
                continue;
            }
            self.seen.set(slot, true);
            self.touched.push(slot);

            match label {
                Label::Relevant => self.n11[slot] += 1,
                Label::Irrelevant => self.n10[slot] += 1,
            }
        }

        for slot in self.touched.drain(..) {
            self.seen.set(slot, false);
        }

        match label {
            Label::Relevant => self.relevant_documents += 1,
            Label::Irrelevant => self.irrelevant_documents += 1,
        }
        Ok(())
    }

    /// Derive the absent cells and freeze the table.
    pub fn finish(self) -> ContingencyTable {
        let n01 = self
            .n11
            .iter()
            .map(|&present| self.relevant_documents - present)
            .collect();
        let n00 = self
            .n10
            .iter()
            .map(|&present| self.irrelevant_documents - present)
            .collect();

        ContingencyTable {
            n11: self.n11,
            n10: self.n10,
            n01,
            n00,
            documents: self.relevant_documents + self.irrelevant_documents,
            relevant_documents: self.relevant_documents,
        }
    }
}
