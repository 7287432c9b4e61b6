//! Mutual-information feature selection.

use std::cmp::Ordering;

use bit_vec::BitVec;
use rayon::prelude::*;
use serde::Serialize;

use crate::classify::contingency::{ContingencyTable, TermCounts};
use crate::index::TermId;

/// Scores at or below this value carry no information about the label.
pub const MIN_INFORMATIVE_SCORE: f64 = 1e-12;

/// Mutual information between a term's presence and the class label, in nats.
///
/// Cells with a zero joint count contribute `0` (the `0 * log 0 = 0`
/// convention), and so does any cell whose marginal product is zero. The
/// result is never NaN.
pub fn mutual_information(counts: TermCounts) -> f64 {
    let n = counts.total() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let n11 = counts.n11 as f64;
    let n10 = counts.n10 as f64;
    let n01 = counts.n01 as f64;
    let n00 = counts.n00 as f64;

    // Row marginals by presence, column marginals by label.
    let n1x = n10 + n11;
    let n0x = n00 + n01;
    let nx1 = n01 + n11;
    let nx0 = n00 + n10;

    let score = cell(n, n11, n1x, nx1)
        + cell(n, n01, n0x, nx1)
        + cell(n, n10, n1x, nx0)
        + cell(n, n00, n0x, nx0);

    score.max(0.0)
}

fn cell(n: f64, joint: f64, row: f64, col: f64) -> f64 {
    if joint == 0.0 || row == 0.0 || col == 0.0 {
        return 0.0;
    }
    (joint / n) * ((n * joint) / (row * col)).ln()
}

/// A term with its selection score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredTerm {
    pub term_id: TermId,
    pub score: f64,
}

/// Ranking order: score descending, then term id ascending.
fn by_score_then_id(a: &ScoredTerm, b: &ScoredTerm) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.term_id.cmp(&b.term_id))
}

/// Selects the `feature_count` terms with the highest mutual information.
#[derive(Debug, Clone, Copy)]
pub struct MutualInformationSelector {
    feature_count: usize,
}

impl MutualInformationSelector {
    /// Create a selector keeping at most `feature_count` terms.
    pub fn new(feature_count: usize) -> Self {
        MutualInformationSelector { feature_count }
    }

    /// Requested number of features.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Score every term slot of the table.
    pub fn score_terms(&self, table: &ContingencyTable) -> Vec<f64> {
        (0..table.len())
            .into_par_iter()
            .map(|slot| mutual_information(table.counts(slot as TermId)))
            .collect()
    }

    /// All informative terms, best first. Ties are broken by ascending term id.
    pub fn ranked_terms(&self, table: &ContingencyTable) -> Vec<ScoredTerm> {
        let mut ranked: Vec<ScoredTerm> = self
            .score_terms(table)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > MIN_INFORMATIVE_SCORE)
            .map(|(slot, score)| ScoredTerm {
                term_id: slot as TermId,
                score,
            })
            .collect();
        ranked.sort_by(by_score_then_id);
        ranked
    }

    /// The top `feature_count` informative terms.
    ///
    /// When fewer informative terms exist, all of them are returned.
    pub fn top_terms(&self, table: &ContingencyTable) -> Vec<ScoredTerm> {
        let mut ranked = self.ranked_terms(table);
        if ranked.len() < self.feature_count {
            log::warn!(
                "Only {} informative terms available, fewer than the {} requested",
                ranked.len(),
                self.feature_count
            );
        }
        ranked.truncate(self.feature_count);
        ranked
    }

    /// Select the feature set.
    pub fn select(&self, table: &ContingencyTable) -> FeatureSet {
        let top = self.top_terms(table);
        let features = FeatureSet::new(top.iter().map(|t| t.term_id), table.len());
        log::info!(
            "Selected {} of {} terms by mutual information",
            features.len(),
            table.len()
        );
        features
    }
}

/// An immutable set of selected term ids with O(1) membership.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Terms in selection order, without duplicates.
    terms: Vec<TermId>,
    lookup: BitVec,
}

impl FeatureSet {
    /// Build a feature set over `slots` term slots. Ids outside the slots and
    /// repeated ids are dropped.
    pub fn new<I>(terms: I, slots: usize) -> Self
    where
        I: IntoIterator<Item = TermId>,
    {
        let mut lookup = BitVec::from_elem(slots, false);
        let mut selected = Vec::new();
        for term_id in terms {
            let slot = term_id as usize;
            if slot < slots && !lookup[slot] {
                lookup.set(slot, true);
                selected.push(term_id);
            }
        }
        FeatureSet {
            terms: selected,
            lookup,
        }
    }

    /// Check if a term is selected.
    pub fn contains(&self, term_id: TermId) -> bool {
        self.lookup.get(term_id as usize).unwrap_or(false)
    }

    /// Selected terms in selection order.
    pub fn terms(&self) -> &[TermId] {
        &self.terms
    }

    /// Number of selected terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of term slots the set was built over.
    pub fn slots(&self) -> usize {
        self.lookup.len()
    }
}
