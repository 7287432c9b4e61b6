//! Run configuration.
//!
//! A parameter file is a JSON object whose keys mirror [`PipelineConfig`];
//! omitted keys take their defaults:
//!
//! ```json
//! {
//!   "index": "corpus/index.json",
//!   "train_docs": "corpus/train.txt",
//!   "test_docs": "corpus/test.txt",
//!   "result": "res",
//!   "feature_selection": true,
//!   "feature_count": 7000
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{EstimatorConfig, OutputOrder, UnselectedTermPolicy};
use crate::error::{Result, TextCatError};

/// Default number of features kept by mutual-information selection.
pub const DEFAULT_FEATURE_COUNT: usize = 7000;

/// Default number of top terms listed per class in the model summary.
pub const DEFAULT_TOP_WORDS: usize = 30;

/// Configuration of one train-and-classify run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path of the document index.
    pub index: PathBuf,

    /// Path of the `<documentKey> <label>` training file.
    pub train_docs: PathBuf,

    /// Path of the `<documentKey>` test file.
    pub test_docs: PathBuf,

    /// Path of the result file.
    pub result: PathBuf,

    /// Whether to restrict the model to mutual-information-selected terms.
    pub feature_selection: bool,

    /// Number of terms kept when feature selection is enabled.
    pub feature_count: usize,

    /// Additive smoothing constant.
    pub smoothing: f64,

    /// Treatment of unselected terms.
    pub unselected_terms: UnselectedTermPolicy,

    /// Order of the result file.
    pub output_order: OutputOrder,

    /// Inference thread pool size.
    /// If None, uses the number of CPU cores.
    pub thread_pool_size: Option<usize>,

    /// Number of top terms per class in the model summary.
    pub top_words: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index: PathBuf::new(),
            train_docs: PathBuf::new(),
            test_docs: PathBuf::new(),
            result: PathBuf::from("res"),
            feature_selection: false,
            feature_count: DEFAULT_FEATURE_COUNT,
            smoothing: 1.0,
            unselected_terms: UnselectedTermPolicy::Exclude,
            output_order: OutputOrder::Ranked,
            thread_pool_size: None,
            top_words: DEFAULT_TOP_WORDS,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON parameter file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TextCatError::config(format!("Can't open parameter file {}: {e}", path.display()))
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("index", &self.index),
            ("train_docs", &self.train_docs),
            ("test_docs", &self.test_docs),
            ("result", &self.result),
        ] {
            if path.as_os_str().is_empty() {
                return Err(TextCatError::config(format!("missing `{name}` path")));
            }
        }

        if self.thread_pool_size == Some(0) {
            return Err(TextCatError::config("thread pool size must be positive"));
        }

        self.estimator_config().validate()
    }

    /// Model estimation parameters derived from this configuration.
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            smoothing: self.smoothing,
            feature_count: self.feature_selection.then_some(self.feature_count),
            unselected_terms: self.unselected_terms,
        }
    }
}
