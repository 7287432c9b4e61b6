//! Ranked collection of classification results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Order in which results are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputOrder {
    /// Descending posterior; ties keep test-stream order.
    #[default]
    Ranked,
    /// Test-stream order.
    Insertion,
}

/// A classified test document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// External document key.
    pub key: String,
    /// P(relevant | document).
    pub posterior: f64,
    /// Position of the document in the test stream.
    pub seq: usize,
}

impl ScoredDocument {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .posterior
            .total_cmp(&self.posterior)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Insert-only collection of `(document, posterior)` pairs.
///
/// Each entry carries its position in the test stream, so results may be
/// inserted from several workers in any order and still read back
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct ResultRanker {
    entries: Vec<ScoredDocument>,
    next_seq: usize,
}

impl ResultRanker {
    /// Create an empty ranker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ranker with room for `capacity` results.
    pub fn with_capacity(capacity: usize) -> Self {
        ResultRanker {
            entries: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Append a result after everything inserted so far.
    pub fn insert<S: Into<String>>(&mut self, key: S, posterior: f64) -> usize {
        let seq = self.next_seq;
        self.insert_at(seq, key, posterior);
        seq
    }

    /// Insert a result at an explicit stream position.
    pub fn insert_at<S: Into<String>>(&mut self, seq: usize, key: S, posterior: f64) {
        self.next_seq = self.next_seq.max(seq + 1);
        self.entries.push(ScoredDocument {
            key: key.into(),
            posterior,
            seq,
        });
    }

    /// Results by descending posterior, ties in stream order.
    pub fn ranked(&self) -> impl Iterator<Item = &ScoredDocument> {
        let mut refs: Vec<&ScoredDocument> = self.entries.iter().collect();
        refs.sort_by(|a, b| a.rank_cmp(b));
        refs.into_iter()
    }

    /// Results in stream order.
    pub fn in_stream_order(&self) -> impl Iterator<Item = &ScoredDocument> {
        let mut refs: Vec<&ScoredDocument> = self.entries.iter().collect();
        refs.sort_by_key(|doc| doc.seq);
        refs.into_iter()
    }

    /// Results in the requested order.
    pub fn iter_in(&self, order: OutputOrder) -> Box<dyn Iterator<Item = &ScoredDocument> + '_> {
        match order {
            OutputOrder::Ranked => Box::new(self.ranked()),
            OutputOrder::Insertion => Box::new(self.in_stream_order()),
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no results.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<'a>(iter: impl Iterator<Item = &'a ScoredDocument>) -> Vec<&'a str> {
        iter.map(|doc| doc.key.as_str()).collect()
    }

    #[test]
    fn test_ranked_descending() {
        let mut ranker = ResultRanker::new();
        ranker.insert("a", 0.2);
        ranker.insert("b", 0.9);
        ranker.insert("c", 0.5);

        assert_eq!(keys(ranker.ranked()), vec!["b", "c", "a"]);
        assert_eq!(keys(ranker.in_stream_order()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_first_inserted_first() {
        let mut ranker = ResultRanker::new();
        ranker.insert("first", 0.5);
        ranker.insert("top", 0.7);
        ranker.insert("second", 0.5);
        ranker.insert("third", 0.5);

        assert_eq!(
            keys(ranker.ranked()),
            vec!["top", "first", "second", "third"]
        );
    }

    #[test]
    fn test_out_of_order_insertion() {
        let mut ranker = ResultRanker::with_capacity(3);
        ranker.insert_at(2, "c", 0.5);
        ranker.insert_at(0, "a", 0.5);
        ranker.insert_at(1, "b", 0.9);

        assert_eq!(keys(ranker.ranked()), vec!["b", "a", "c"]);
        assert_eq!(keys(ranker.iter_in(OutputOrder::Insertion)), vec!["a", "b", "c"]);

        // Appending continues after the highest position seen.
        assert_eq!(ranker.insert("d", 0.1), 3);
        assert_eq!(ranker.len(), 4);
    }

    #[test]
    fn test_empty() {
        let ranker = ResultRanker::new();
        assert!(ranker.is_empty());
        assert_eq!(ranker.ranked().count(), 0);
    }
}
