//! Command line argument parsing for the textcat CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::classify::{OutputOrder, UnselectedTermPolicy};
use crate::config::PipelineConfig;
use crate::error::Result;

/// textcat - Naive Bayes binary text categorization
#[derive(Parser, Debug, Clone)]
#[command(name = "textcat")]
#[command(about = "Binary Naive Bayes text categorization with mutual-information feature selection")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TextCatArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TextCatArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model and classify the test documents
    Run(RunArgs),

    /// Train a model and print its summary
    Inspect(InspectArgs),

    /// Print the top terms by mutual information
    Select(SelectArgs),
}

/// Run parameters shared by every command.
#[derive(Parser, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// JSON parameter file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Document index file
    #[arg(long, value_name = "INDEX_FILE")]
    pub index: Option<PathBuf>,

    /// Training file of `<documentKey> <label>` lines
    #[arg(long = "train", value_name = "TRAIN_FILE")]
    pub train_docs: Option<PathBuf>,

    /// Test file of `<documentKey>` lines
    #[arg(long = "test", value_name = "TEST_FILE")]
    pub test_docs: Option<PathBuf>,

    /// Additive smoothing constant
    #[arg(long)]
    pub smoothing: Option<f64>,

    /// Restrict the model to the top terms by mutual information
    #[arg(long = "feature-select")]
    pub feature_selection: bool,

    /// Number of terms kept by feature selection
    #[arg(short = 'k', long)]
    pub feature_count: Option<usize>,

    /// Give unselected terms a pooled smoothed probability instead of dropping them
    #[arg(long)]
    pub floor_unselected: bool,
}

impl PipelineArgs {
    /// Load the parameter file, if any, and apply flag overrides.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(index) = &self.index {
            config.index = index.clone();
        }
        if let Some(train_docs) = &self.train_docs {
            config.train_docs = train_docs.clone();
        }
        if let Some(test_docs) = &self.test_docs {
            config.test_docs = test_docs.clone();
        }
        if let Some(smoothing) = self.smoothing {
            config.smoothing = smoothing;
        }
        if self.feature_selection {
            config.feature_selection = true;
        }
        if let Some(feature_count) = self.feature_count {
            config.feature_count = feature_count;
        }
        if self.floor_unselected {
            config.unselected_terms = UnselectedTermPolicy::SmoothedFloor;
        }

        Ok(config)
    }
}

/// Arguments for a full run
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Result file
    #[arg(short, long, value_name = "RESULT_FILE")]
    pub result: Option<PathBuf>,

    /// Order of the result file
    #[arg(long)]
    pub order: Option<OutputOrder>,

    /// Number of inference threads (default: one per CPU)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl RunArgs {
    /// Effective run configuration.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = self.pipeline.load_config()?;
        if let Some(result) = &self.result {
            config.result = result.clone();
        }
        if let Some(order) = self.order {
            config.output_order = order;
        }
        if self.threads.is_some() {
            config.thread_pool_size = self.threads;
        }
        Ok(config)
    }
}

/// Arguments for model inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Number of top terms per class
    #[arg(long)]
    pub top: Option<usize>,
}

/// Arguments for feature selection only
#[derive(Parser, Debug, Clone)]
pub struct SelectArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
