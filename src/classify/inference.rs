//! Posterior inference over unlabeled documents.

use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::classify::model::ClassModel;
use crate::classify::ranking::ResultRanker;
use crate::error::{Result, TextCatError};
use crate::index::{DocumentIndex, Posting, TermId, check_term};
use crate::record::{RecordSource, TestRecord};

/// Log-likelihoods of one document under each class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLikelihoods {
    pub relevant: f64,
    pub irrelevant: f64,
}

/// Applies a trained [`ClassModel`] to documents.
///
/// Probabilities are kept in the log domain. A term with zero probability in
/// either class (an unselected term under the exclude policy) contributes
/// nothing to either likelihood.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    log_relevant: Vec<f64>,
    log_irrelevant: Vec<f64>,
    log_prior: f64,
    log_complement_prior: f64,
    vocabulary_size: TermId,
}

impl NaiveBayesClassifier {
    /// Build a classifier from a trained model.
    pub fn new(model: &ClassModel) -> Self {
        NaiveBayesClassifier {
            log_relevant: model.relevant().iter().map(|p| p.ln()).collect(),
            log_irrelevant: model.irrelevant().iter().map(|p| p.ln()).collect(),
            log_prior: model.prior().ln(),
            log_complement_prior: (1.0 - model.prior()).ln(),
            vocabulary_size: model.vocabulary_size(),
        }
    }

    /// Sum of `freq * log P(term | class)` over the postings.
    pub fn log_likelihoods(&self, postings: &[Posting]) -> Result<LogLikelihoods> {
        let mut relevant = 0.0;
        let mut irrelevant = 0.0;

        for posting in postings {
            let slot = check_term(posting.term_id, self.vocabulary_size)?;
            let log_rel = self.log_relevant[slot];
            let log_irrel = self.log_irrelevant[slot];
            if log_rel == f64::NEG_INFINITY || log_irrel == f64::NEG_INFINITY {
                continue;
            }

            let freq = f64::from(posting.freq);
            relevant += freq * log_rel;
            irrelevant += freq * log_irrel;
        }

        Ok(LogLikelihoods {
            relevant,
            irrelevant,
        })
    }

    /// P(relevant | postings) by Bayes' rule in log-odds form.
    pub fn posterior(&self, postings: &[Posting]) -> Result<f64> {
        let ll = self.log_likelihoods(postings)?;
        Ok(self.posterior_from(ll))
    }

    /// Combine log-likelihoods with the prior.
    ///
    /// A degenerate prior of exactly 0 or 1 yields exactly 0 or 1.
    pub fn posterior_from(&self, ll: LogLikelihoods) -> f64 {
        let exponent =
            (self.log_complement_prior + ll.irrelevant) - (self.log_prior + ll.relevant);
        1.0 / (1.0 + exponent.exp())
    }

    /// Classify a document by key.
    pub fn classify_document(&self, index: &dyn DocumentIndex, key: &str) -> Result<f64> {
        let postings = index.postings_for_key(key)?;
        self.posterior(&postings)
    }

    /// Classify every document of a test stream on a dedicated thread pool.
    ///
    /// `thread_pool_size` of `None` uses one thread per CPU. The first failing
    /// document aborts the whole pass.
    pub fn classify_all<S>(
        &self,
        index: &dyn DocumentIndex,
        source: &S,
        thread_pool_size: Option<usize>,
    ) -> Result<ResultRanker>
    where
        S: RecordSource<TestRecord> + ?Sized,
    {
        let records: Vec<TestRecord> = source.records()?.collect::<Result<_>>()?;

        let threads = thread_pool_size.unwrap_or_else(num_cpus::get);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("textcat-infer-{i}"))
            .build()
            .map_err(|e| TextCatError::internal(format!("Failed to create thread pool: {e}")))?;

        let ranker = Mutex::new(ResultRanker::with_capacity(records.len()));
        pool.install(|| {
            records
                .par_iter()
                .enumerate()
                .try_for_each(|(seq, record)| -> Result<()> {
                    let posterior = self.classify_document(index, &record.key)?;
                    ranker.lock().insert_at(seq, record.key.as_str(), posterior);
                    Ok(())
                })
        })?;

        let ranker = ranker.into_inner();
        log::info!(
            "Classified {} test documents on {} threads",
            ranker.len(),
            threads
        );
        Ok(ranker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::model::{EstimatorConfig, ModelEstimator, UnselectedTermPolicy};
    use crate::classify::selection::FeatureSet;
    use crate::index::MemoryIndex;
    use crate::record::{Label, TrainingRecord};

    fn spam_index() -> MemoryIndex {
        MemoryIndex::builder(5)
            .document("s1", [(0, 2), (1, 1), (4, 3)])
            .unwrap()
            .document("s2", [(0, 1), (1, 2), (4, 1)])
            .unwrap()
            .document("h1", [(2, 2), (3, 1), (4, 4)])
            .unwrap()
            .document("h2", [(2, 1), (4, 2)])
            .unwrap()
            .document("t-spam", [(0, 3), (4, 1)])
            .unwrap()
            .document("t-ham", [(2, 1), (3, 2)])
            .unwrap()
            .document("t-empty", [])
            .unwrap()
            .document("t-bad", [(9, 1)])
            .unwrap()
            .build()
    }

    fn training() -> Vec<TrainingRecord> {
        vec![
            TrainingRecord::new("s1", Label::Relevant),
            TrainingRecord::new("s2", Label::Relevant),
            TrainingRecord::new("h1", Label::Irrelevant),
            TrainingRecord::new("h2", Label::Irrelevant),
        ]
    }

    fn classifier(index: &MemoryIndex, config: EstimatorConfig) -> NaiveBayesClassifier {
        let model = ModelEstimator::new(index, config)
            .estimate(&training())
            .unwrap();
        NaiveBayesClassifier::new(&model)
    }

    #[test]
    fn test_two_document_example() {
        let index = MemoryIndex::builder(2)
            .document("d1", [(0, 3)])
            .unwrap()
            .document("d2", [(1, 2)])
            .unwrap()
            .document("d3", [(0, 1)])
            .unwrap()
            .build();
        let training = vec![
            TrainingRecord::new("d1", Label::Relevant),
            TrainingRecord::new("d2", Label::Irrelevant),
        ];
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate(&training)
            .unwrap();
        let classifier = NaiveBayesClassifier::new(&model);

        let posterior = classifier.classify_document(&index, "d3").unwrap();
        // (4/6) / (4/6 + 1/5) with an even prior.
        assert!((posterior - (4.0 / 6.0) / (4.0 / 6.0 + 1.0 / 5.0)).abs() < 1e-12);
        assert!(posterior > 0.5);
    }

    #[test]
    fn test_posterior_in_open_interval() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());

        for key in ["t-spam", "t-ham", "t-empty", "s1", "h2"] {
            let posterior = classifier.classify_document(&index, key).unwrap();
            assert!(posterior > 0.0 && posterior < 1.0, "{key}: {posterior}");
        }
        assert!(classifier.classify_document(&index, "t-spam").unwrap() > 0.5);
        assert!(classifier.classify_document(&index, "t-ham").unwrap() < 0.5);
    }

    #[test]
    fn test_empty_document_gets_prior() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());
        let posterior = classifier.classify_document(&index, "t-empty").unwrap();
        assert!((posterior - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_long_document_does_not_underflow() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());

        let postings = vec![Posting::new(0, 50_000), Posting::new(2, 49_000)];
        let posterior = classifier.posterior(&postings).unwrap();
        assert!(posterior.is_finite());
        assert!((0.0..=1.0).contains(&posterior));
    }

    #[test]
    fn test_out_of_range_term_fails_loudly() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());
        assert!(matches!(
            classifier.classify_document(&index, "t-bad"),
            Err(TextCatError::TermOutOfRange { term_id: 9, .. })
        ));
    }

    #[test]
    fn test_excluded_terms_do_not_move_posterior() {
        let index = spam_index();
        let features = FeatureSet::new([0, 2], index.term_slots());
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate_with_features(&training(), Some(features))
            .unwrap();
        let classifier = NaiveBayesClassifier::new(&model);

        let base = classifier.posterior(&[Posting::new(0, 1)]).unwrap();
        let with_unselected = classifier
            .posterior(&[Posting::new(0, 1), Posting::new(3, 7), Posting::new(5, 2)])
            .unwrap();
        assert_eq!(base, with_unselected);
        assert!(!base.is_nan());
    }

    #[test]
    fn test_smoothed_floor_counts_unselected_terms() {
        let index = spam_index();
        let features = FeatureSet::new([0, 2], index.term_slots());
        let config =
            EstimatorConfig::default().with_unselected_terms(UnselectedTermPolicy::SmoothedFloor);
        let model = ModelEstimator::new(&index, config)
            .estimate_with_features(&training(), Some(features))
            .unwrap();
        let classifier = NaiveBayesClassifier::new(&model);

        let ll = classifier
            .log_likelihoods(&[Posting::new(3, 1)])
            .unwrap();
        assert!(ll.relevant.is_finite() && ll.relevant < 0.0);
        assert!(ll.irrelevant.is_finite() && ll.irrelevant < 0.0);
    }

    #[test]
    fn test_degenerate_prior() {
        let index = spam_index();
        let training = vec![TrainingRecord::new("s1", Label::Relevant)];
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate(&training)
            .unwrap();
        let classifier = NaiveBayesClassifier::new(&model);

        let posterior = classifier.classify_document(&index, "t-ham").unwrap();
        assert_eq!(posterior, 1.0);
    }

    #[test]
    fn test_parallel_matches_single_thread() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());
        let tests: Vec<TestRecord> = ["t-spam", "t-ham", "t-empty", "s1", "s2", "h1", "h2"]
            .into_iter()
            .map(TestRecord::new)
            .collect();

        let single = classifier.classify_all(&index, &tests, Some(1)).unwrap();
        let parallel = classifier.classify_all(&index, &tests, Some(4)).unwrap();

        let single: Vec<_> = single.ranked().cloned().collect();
        let parallel: Vec<_> = parallel.ranked().cloned().collect();
        assert_eq!(single, parallel);
        assert_eq!(single.len(), 7);
    }

    #[test]
    fn test_classify_all_propagates_unknown_key() {
        let index = spam_index();
        let classifier = classifier(&index, EstimatorConfig::default());
        let tests = vec![TestRecord::new("t-spam"), TestRecord::new("nope")];
        assert!(matches!(
            classifier.classify_all(&index, &tests, Some(2)),
            Err(TextCatError::DocumentNotFound(_))
        ));
    }
}
