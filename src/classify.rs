//! Binary Naive Bayes text categorization.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`ContingencyTable`] counts term presence against the label (only when
//!    feature selection is enabled).
//! 2. [`MutualInformationSelector`] keeps the top-K terms of the table.
//! 3. [`ModelEstimator`] turns smoothed term counts into a [`ClassModel`].
//! 4. [`NaiveBayesClassifier`] computes posteriors for test documents.
//! 5. [`ResultRanker`] orders the results by posterior.
//!
//! # Example
//!
//! ```
//! use textcat::classify::{EstimatorConfig, ModelEstimator, NaiveBayesClassifier};
//! use textcat::index::MemoryIndex;
//! use textcat::record::{Label, TrainingRecord};
//!
//! # fn main() -> textcat::error::Result<()> {
//! let index = MemoryIndex::builder(2)
//!     .document("d1", [(0, 3)])?
//!     .document("d2", [(1, 2)])?
//!     .document("d3", [(0, 1)])?
//!     .build();
//! let training = vec![
//!     TrainingRecord::new("d1", Label::Relevant),
//!     TrainingRecord::new("d2", Label::Irrelevant),
//! ];
//!
//! let model = ModelEstimator::new(&index, EstimatorConfig::default()).estimate(&training)?;
//! let classifier = NaiveBayesClassifier::new(&model);
//! assert!(classifier.classify_document(&index, "d3")? > 0.5);
//! # Ok(())
//! # }
//! ```

pub mod contingency;
pub mod inference;
pub mod model;
pub mod ranking;
pub mod selection;
pub mod summary;

pub use contingency::{ContingencyAccumulator, ContingencyTable, TermCounts};
pub use inference::{LogLikelihoods, NaiveBayesClassifier};
pub use model::{ClassModel, EstimatorConfig, ModelEstimator, TrainingStats, UnselectedTermPolicy};
pub use ranking::{OutputOrder, ResultRanker, ScoredDocument};
pub use selection::{FeatureSet, MutualInformationSelector, ScoredTerm, mutual_information};
pub use summary::{ModelSummary, TopTerm};
