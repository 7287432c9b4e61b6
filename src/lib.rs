//! # textcat
//!
//! Binary text categorization with a multinomial Naive Bayes model.
//!
//! ## Features
//!
//! - Mutual-information feature selection over a term/label contingency table
//! - Additive smoothing with a configurable constant
//! - Parallel posterior inference with deterministic ranked output
//! - Pluggable document index behind the [`index::DocumentIndex`] trait

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod record;

pub mod prelude {
    pub use crate::classify::{
        ClassModel, ContingencyTable, EstimatorConfig, FeatureSet, ModelEstimator,
        MutualInformationSelector, NaiveBayesClassifier, OutputOrder, ResultRanker,
        UnselectedTermPolicy,
    };
    pub use crate::config::PipelineConfig;
    pub use crate::error::{Result, TextCatError};
    pub use crate::index::{DocumentIndex, MemoryIndex, Posting, TermId};
    pub use crate::pipeline::{Pipeline, RunReport};
    pub use crate::record::{Label, TestRecord, TrainingRecord};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
