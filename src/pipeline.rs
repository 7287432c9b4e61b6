//! End-to-end train-and-classify run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::classify::{
    ClassModel, ModelEstimator, ModelSummary, NaiveBayesClassifier, OutputOrder, ResultRanker,
};
use crate::config::PipelineConfig;
use crate::error::{Result, TextCatError};
use crate::index::{DocumentIndex, MemoryIndex};
use crate::record::{TestFile, TrainingFile};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub training_documents: u64,
    pub relevant_documents: u64,
    /// Number of selected features, when feature selection ran.
    pub selected_features: Option<usize>,
    pub test_documents: usize,
    pub result_path: PathBuf,
    pub duration_ms: u64,
}

/// Writes `<documentKey> <posterior>` lines.
#[derive(Debug)]
pub struct ResultWriter<W: Write> {
    writer: W,
    written: usize,
}

impl ResultWriter<BufWriter<File>> {
    /// Create (or truncate) the result file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            TextCatError::config(format!("Can't open result file {}: {e}", path.display()))
        })?;
        Ok(ResultWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(writer: W) -> Self {
        ResultWriter { writer, written: 0 }
    }

    /// Write one result line.
    pub fn write_result(&mut self, key: &str, posterior: f64) -> Result<()> {
        writeln!(self.writer, "{key} {posterior}")?;
        self.written += 1;
        Ok(())
    }

    /// Write every result of `ranker` in the given order.
    pub fn write_all(&mut self, ranker: &ResultRanker, order: OutputOrder) -> Result<()> {
        for doc in ranker.iter_in(order) {
            self.write_result(&doc.key, doc.posterior)?;
        }
        Ok(())
    }

    /// Number of lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// A configured train-and-classify run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the index file named in the configuration.
    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;

        log::info!("Opening index {}", self.config.index.display());
        let index = MemoryIndex::open(&self.config.index)?;
        self.run_with_index(&index)
    }

    /// Run against an already opened index.
    pub fn run_with_index(&self, index: &dyn DocumentIndex) -> Result<RunReport> {
        let start = Instant::now();
        self.config.validate()?;

        let training = TrainingFile::open(&self.config.train_docs)?;
        let tests = TestFile::open(&self.config.test_docs)?;
        let mut writer = ResultWriter::create(&self.config.result)?;

        let model = self.train(index, &training)?;
        ModelSummary::new(&model, index, self.config.top_words).log();

        let classifier = NaiveBayesClassifier::new(&model);
        let ranker = classifier.classify_all(index, &tests, self.config.thread_pool_size)?;

        writer.write_all(&ranker, self.config.output_order)?;
        let test_documents = writer.written();
        writer.finish()?;

        let stats = model.stats();
        let report = RunReport {
            training_documents: stats.documents,
            relevant_documents: stats.relevant_documents,
            selected_features: model.features().map(|f| f.len()),
            test_documents,
            result_path: self.config.result.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        log::info!(
            "Wrote {} results to {} in {} ms",
            report.test_documents,
            report.result_path.display(),
            report.duration_ms
        );
        Ok(report)
    }

    /// Estimate the model only.
    pub fn train_model(&self, index: &dyn DocumentIndex) -> Result<ClassModel> {
        let training = TrainingFile::open(&self.config.train_docs)?;
        self.train(index, &training)
    }

    fn train(&self, index: &dyn DocumentIndex, training: &TrainingFile) -> Result<ClassModel> {
        let estimator = ModelEstimator::new(index, self.config.estimator_config());
        if let Some(k) = estimator.config().feature_count {
            log::info!("Training with mutual-information selection of {k} features");
        } else {
            log::info!("Training over the full vocabulary");
        }
        estimator.estimate(training)
    }
}
