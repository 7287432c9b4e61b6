//! Naive Bayes model estimation with additive smoothing.

use serde::{Deserialize, Serialize};

use crate::classify::contingency::ContingencyTable;
use crate::classify::selection::{FeatureSet, MutualInformationSelector};
use crate::error::{Result, TextCatError};
use crate::index::{DocumentIndex, TermId, check_term};
use crate::record::{Label, RecordSource, TrainingRecord};

/// How terms left out by feature selection are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnselectedTermPolicy {
    /// Unselected terms get probability 0 and are skipped at inference time.
    /// The selected probabilities then sum to less than 1.
    #[default]
    Exclude,
    /// Unselected terms share one smoothed "other" event, split evenly, so
    /// each class distribution still sums to 1.
    SmoothedFloor,
}

/// Parameters of model estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Additive smoothing constant (1.0 is Laplace smoothing).
    pub smoothing: f64,
    /// Number of terms to keep by mutual information; `None` uses the full vocabulary.
    pub feature_count: Option<usize>,
    /// Treatment of unselected terms when `feature_count` is set.
    pub unselected_terms: UnselectedTermPolicy,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            smoothing: 1.0,
            feature_count: None,
            unselected_terms: UnselectedTermPolicy::Exclude,
        }
    }
}

impl EstimatorConfig {
    /// Use mutual-information feature selection with `feature_count` terms.
    pub fn with_feature_selection(mut self, feature_count: usize) -> Self {
        self.feature_count = Some(feature_count);
        self
    }

    /// Set the smoothing constant.
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the unselected-term policy.
    pub fn with_unselected_terms(mut self, policy: UnselectedTermPolicy) -> Self {
        self.unselected_terms = policy;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(TextCatError::config(format!(
                "smoothing must be a positive number, got {}",
                self.smoothing
            )));
        }
        if self.feature_count == Some(0) {
            return Err(TextCatError::config(
                "feature count must be positive when feature selection is enabled",
            ));
        }
        Ok(())
    }
}

/// Counters gathered during the counting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub documents: u64,
    pub relevant_documents: u64,
    /// Total term occurrences in relevant documents, selected or not.
    pub relevant_words: u64,
    /// Total term occurrences in irrelevant documents, selected or not.
    pub irrelevant_words: u64,
}

impl TrainingStats {
    pub fn irrelevant_documents(&self) -> u64 {
        self.documents - self.relevant_documents
    }
}

/// Two class-conditional term distributions and the relevant-class prior.
#[derive(Debug, Clone)]
pub struct ClassModel {
    relevant: Vec<f64>,
    irrelevant: Vec<f64>,
    prior: f64,
    features: Option<FeatureSet>,
    policy: UnselectedTermPolicy,
    stats: TrainingStats,
}

impl ClassModel {
    /// P(term | relevant) by term slot.
    pub fn relevant(&self) -> &[f64] {
        &self.relevant
    }

    /// P(term | irrelevant) by term slot.
    pub fn irrelevant(&self) -> &[f64] {
        &self.irrelevant
    }

    /// Distribution of one class.
    pub fn distribution(&self, label: Label) -> &[f64] {
        match label {
            Label::Relevant => &self.relevant,
            Label::Irrelevant => &self.irrelevant,
        }
    }

    /// P(term | label). Out-of-vocabulary terms are an error.
    pub fn probability(&self, label: Label, term_id: TermId) -> Result<f64> {
        let slot = check_term(term_id, self.vocabulary_size())?;
        Ok(self.distribution(label)[slot])
    }

    /// P(relevant).
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// Selected features, when the model was trained with feature selection.
    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref()
    }

    pub fn unselected_terms(&self) -> UnselectedTermPolicy {
        self.policy
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Largest valid term id.
    pub fn vocabulary_size(&self) -> TermId {
        (self.relevant.len() - 1) as TermId
    }

    /// Total probability mass of one class.
    pub fn mass(&self, label: Label) -> f64 {
        self.distribution(label).iter().sum()
    }
}

/// Estimates a [`ClassModel`] from labeled training documents.
#[derive(Debug)]
pub struct ModelEstimator<'a> {
    index: &'a dyn DocumentIndex,
    config: EstimatorConfig,
}

impl<'a> ModelEstimator<'a> {
    /// Create an estimator reading postings from `index`.
    pub fn new(index: &'a dyn DocumentIndex, config: EstimatorConfig) -> Self {
        ModelEstimator { index, config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate a model. With feature selection enabled this makes two passes
    /// over `source`: one for the contingency table, one for the counts.
    pub fn estimate<S>(&self, source: &S) -> Result<ClassModel>
    where
        S: RecordSource<TrainingRecord> + ?Sized,
    {
        self.config.validate()?;

        let features = match self.config.feature_count {
            Some(feature_count) => {
                let table = ContingencyTable::accumulate(self.index, source)?;
                if table.documents() == 0 {
                    return Err(TextCatError::EmptyTrainingSet);
                }
                Some(MutualInformationSelector::new(feature_count).select(&table))
            }
            None => None,
        };

        self.estimate_with_features(source, features)
    }

    /// Estimate a model restricted to an explicit feature set, or over the
    /// full vocabulary when `features` is `None`.
    pub fn estimate_with_features<S>(
        &self,
        source: &S,
        features: Option<FeatureSet>,
    ) -> Result<ClassModel>
    where
        S: RecordSource<TrainingRecord> + ?Sized,
    {
        self.config.validate()?;

        let vocabulary_size = self.index.vocabulary_size();
        let slots = self.index.term_slots();
        if let Some(features) = &features
            && features.slots() != slots
        {
            return Err(TextCatError::config(format!(
                "feature set covers {} term slots, index has {}",
                features.slots(),
                slots
            )));
        }

        let mut relevant_counts = vec![0u64; slots];
        let mut irrelevant_counts = vec![0u64; slots];
        let mut stats = TrainingStats::default();

        for record in source.records()? {
            let record = record?;
            let postings = self.index.postings_for_key(&record.key)?;

            stats.documents += 1;
            let (counts, words) = match record.label {
                Label::Relevant => {
                    stats.relevant_documents += 1;
                    (&mut relevant_counts, &mut stats.relevant_words)
                }
                Label::Irrelevant => (&mut irrelevant_counts, &mut stats.irrelevant_words),
            };

            for posting in &postings {
                let slot = check_term(posting.term_id, vocabulary_size)?;
                let freq = u64::from(posting.freq);
                *words += freq;
                if features.as_ref().is_none_or(|f| f.contains(posting.term_id)) {
                    counts[slot] += freq;
                }
            }
        }

        if stats.documents == 0 {
            return Err(TextCatError::EmptyTrainingSet);
        }

        let smoothing = Smoothing {
            alpha: self.config.smoothing,
            features: features.as_ref(),
            policy: self.config.unselected_terms,
        };
        let relevant = smoothing.normalize(&relevant_counts, stats.relevant_words);
        let irrelevant = smoothing.normalize(&irrelevant_counts, stats.irrelevant_words);
        let prior = stats.relevant_documents as f64 / stats.documents as f64;

        if stats.relevant_documents == 0 || stats.relevant_documents == stats.documents {
            log::warn!(
                "All {} training documents carry the same label; posteriors will be {}",
                stats.documents,
                prior
            );
        }
        log::info!(
            "Trained on {} documents ({} relevant, prior {:.4}); {} relevant / {} irrelevant words",
            stats.documents,
            stats.relevant_documents,
            prior,
            stats.relevant_words,
            stats.irrelevant_words
        );

        Ok(ClassModel {
            relevant,
            irrelevant,
            prior,
            features,
            policy: self.config.unselected_terms,
            stats,
        })
    }
}

/// Turns raw per-class counts into a smoothed distribution.
struct Smoothing<'f> {
    alpha: f64,
    features: Option<&'f FeatureSet>,
    policy: UnselectedTermPolicy,
}

impl Smoothing<'_> {
    fn normalize(&self, counts: &[u64], total_words: u64) -> Vec<f64> {
        let alpha = self.alpha;
        let words = total_words as f64;

        let Some(features) = self.features else {
            // (alpha + c) / (alpha * |V| + W)
            let denominator = alpha * counts.len() as f64 + words;
            return counts
                .iter()
                .map(|&c| (alpha + c as f64) / denominator)
                .collect();
        };

        let selected = features.len() as f64;
        let unselected = counts.len() - features.len();

        match self.policy {
            UnselectedTermPolicy::Exclude => {
                let denominator = alpha * selected + words;
                counts
                    .iter()
                    .enumerate()
                    .map(|(slot, &c)| {
                        if features.contains(slot as TermId) {
                            (alpha + c as f64) / denominator
                        } else {
                            0.0
                        }
                    })
                    .collect()
            }
            UnselectedTermPolicy::SmoothedFloor if unselected == 0 => {
                let denominator = alpha * selected + words;
                counts
                    .iter()
                    .map(|&c| (alpha + c as f64) / denominator)
                    .collect()
            }
            UnselectedTermPolicy::SmoothedFloor => {
                let selected_words: u64 = features
                    .terms()
                    .iter()
                    .map(|&t| counts[t as usize])
                    .sum();
                let other_words = total_words.saturating_sub(selected_words) as f64;

                let denominator = alpha * (selected + 1.0) + words;
                let floor = (alpha + other_words) / denominator / unselected as f64;
                counts
                    .iter()
                    .enumerate()
                    .map(|(slot, &c)| {
                        if features.contains(slot as TermId) {
                            (alpha + c as f64) / denominator
                        } else {
                            floor
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;

    const EPS: f64 = 1e-12;

    fn two_document_setup() -> (MemoryIndex, Vec<TrainingRecord>) {
        let index = MemoryIndex::builder(2)
            .document("d1", [(0, 3)])
            .unwrap()
            .document("d2", [(1, 2)])
            .unwrap()
            .build();
        let training = vec![
            TrainingRecord::new("d1", Label::Relevant),
            TrainingRecord::new("d2", Label::Irrelevant),
        ];
        (index, training)
    }

    fn spam_setup() -> (MemoryIndex, Vec<TrainingRecord>) {
        // 0 "viagra", 1 "offer", 2 "meeting", 3 "agenda", 4 "the", 5 unused
        let index = MemoryIndex::builder(5)
            .document("s1", [(0, 2), (1, 1), (4, 3)])
            .unwrap()
            .document("s2", [(0, 1), (1, 2), (4, 1)])
            .unwrap()
            .document("h1", [(2, 2), (3, 1), (4, 4)])
            .unwrap()
            .document("h2", [(2, 1), (4, 2)])
            .unwrap()
            .document("h3", [(3, 2), (1, 1), (4, 1)])
            .unwrap()
            .build();
        let training = vec![
            TrainingRecord::new("s1", Label::Relevant),
            TrainingRecord::new("s2", Label::Relevant),
            TrainingRecord::new("h1", Label::Irrelevant),
            TrainingRecord::new("h2", Label::Irrelevant),
            TrainingRecord::new("h3", Label::Irrelevant),
        ];
        (index, training)
    }

    #[test]
    fn test_full_vocabulary_laplace() {
        let (index, training) = two_document_setup();
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate(&training)
            .unwrap();

        // Relevant: 3 words over 3 slots -> denominator 6.
        assert!((model.relevant()[0] - 4.0 / 6.0).abs() < EPS);
        assert!((model.relevant()[1] - 1.0 / 6.0).abs() < EPS);
        assert!((model.relevant()[2] - 1.0 / 6.0).abs() < EPS);
        // Irrelevant: 2 words over 3 slots -> denominator 5.
        assert!((model.irrelevant()[1] - 3.0 / 5.0).abs() < EPS);

        assert!((model.mass(Label::Relevant) - 1.0).abs() < EPS);
        assert!((model.mass(Label::Irrelevant) - 1.0).abs() < EPS);
        assert_eq!(model.prior(), 0.5);
        assert!(model.features().is_none());
    }

    #[test]
    fn test_distributions_sum_to_one() {
        let (index, training) = spam_setup();
        for smoothing in [0.1, 1.0, 2.5] {
            let model = ModelEstimator::new(
                &index,
                EstimatorConfig::default().with_smoothing(smoothing),
            )
            .estimate(&training)
            .unwrap();
            assert!((model.mass(Label::Relevant) - 1.0).abs() < 1e-9);
            assert!((model.mass(Label::Irrelevant) - 1.0).abs() < 1e-9);
            assert!((model.prior() - 0.4).abs() < EPS);
        }
    }

    #[test]
    fn test_stats() {
        let (index, training) = spam_setup();
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate(&training)
            .unwrap();
        let stats = model.stats();
        assert_eq!(stats.documents, 5);
        assert_eq!(stats.relevant_documents, 2);
        assert_eq!(stats.irrelevant_documents(), 3);
        assert_eq!(stats.relevant_words, 10);
        assert_eq!(stats.irrelevant_words, 14);
    }

    #[test]
    fn test_prior_extremes() {
        let (index, _) = spam_setup();
        let estimator = ModelEstimator::new(&index, EstimatorConfig::default());

        let all_relevant = vec![
            TrainingRecord::new("s1", Label::Relevant),
            TrainingRecord::new("s2", Label::Relevant),
        ];
        assert_eq!(estimator.estimate(&all_relevant).unwrap().prior(), 1.0);

        let none_relevant = vec![TrainingRecord::new("h1", Label::Irrelevant)];
        assert_eq!(estimator.estimate(&none_relevant).unwrap().prior(), 0.0);
    }

    #[test]
    fn test_feature_selection_exclude() {
        let (index, training) = spam_setup();
        let config = EstimatorConfig::default().with_feature_selection(2);
        let model = ModelEstimator::new(&index, config).estimate(&training).unwrap();

        let features = model.features().unwrap();
        assert_eq!(features.len(), 2);
        // "viagra" separates the classes perfectly.
        assert_eq!(features.terms()[0], 0);

        for slot in 0..=5u32 {
            let p = model.probability(Label::Relevant, slot).unwrap();
            if features.contains(slot) {
                assert!(p > 0.0);
            } else {
                assert_eq!(p, 0.0);
            }
        }
        // Denominator is K + total class words: s1+s2 have 10 words, 3 of them "viagra".
        assert!((model.relevant()[0] - 4.0 / 12.0).abs() < EPS);
        assert!(model.mass(Label::Relevant) < 1.0);
    }

    #[test]
    fn test_feature_selection_smoothed_floor_sums_to_one() {
        let (index, training) = spam_setup();
        let config = EstimatorConfig::default()
            .with_feature_selection(2)
            .with_unselected_terms(UnselectedTermPolicy::SmoothedFloor);
        let model = ModelEstimator::new(&index, config).estimate(&training).unwrap();

        assert!((model.mass(Label::Relevant) - 1.0).abs() < 1e-9);
        assert!((model.mass(Label::Irrelevant) - 1.0).abs() < 1e-9);
        assert!(model.relevant().iter().all(|&p| p > 0.0));
        assert!(model.irrelevant().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_smoothed_floor_with_every_term_selected() {
        let (index, training) = two_document_setup();
        let features = FeatureSet::new([0, 1, 2], 3);
        let config =
            EstimatorConfig::default().with_unselected_terms(UnselectedTermPolicy::SmoothedFloor);
        let model = ModelEstimator::new(&index, config)
            .estimate_with_features(&training, Some(features))
            .unwrap();

        // Same as full-vocabulary smoothing.
        assert!((model.relevant()[0] - 4.0 / 6.0).abs() < EPS);
        assert!((model.mass(Label::Irrelevant) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_empty_training_set() {
        let (index, _) = two_document_setup();
        let empty: Vec<TrainingRecord> = Vec::new();

        let estimator = ModelEstimator::new(&index, EstimatorConfig::default());
        assert!(matches!(
            estimator.estimate(&empty),
            Err(TextCatError::EmptyTrainingSet)
        ));

        let estimator =
            ModelEstimator::new(&index, EstimatorConfig::default().with_feature_selection(5));
        assert!(matches!(
            estimator.estimate(&empty),
            Err(TextCatError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_invalid_config() {
        let (index, training) = two_document_setup();
        for config in [
            EstimatorConfig::default().with_smoothing(0.0),
            EstimatorConfig::default().with_smoothing(f64::NAN),
            EstimatorConfig::default().with_feature_selection(0),
        ] {
            assert!(matches!(
                ModelEstimator::new(&index, config).estimate(&training),
                Err(TextCatError::Config(_))
            ));
        }
    }

    #[test]
    fn test_out_of_range_term() {
        let index = MemoryIndex::builder(1)
            .document("bad", [(0, 1), (4, 1)])
            .unwrap()
            .build();
        let training = vec![TrainingRecord::new("bad", Label::Relevant)];
        assert!(matches!(
            ModelEstimator::new(&index, EstimatorConfig::default()).estimate(&training),
            Err(TextCatError::TermOutOfRange { term_id: 4, .. })
        ));
    }

    #[test]
    fn test_probability_rejects_unknown_term() {
        let (index, training) = two_document_setup();
        let model = ModelEstimator::new(&index, EstimatorConfig::default())
            .estimate(&training)
            .unwrap();
        assert!(model.probability(Label::Relevant, 3).is_err());
    }
}
