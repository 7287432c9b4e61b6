//! Command implementations for the textcat CLI.

use crate::classify::{ContingencyTable, ModelSummary, MutualInformationSelector};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::PipelineConfig;
use crate::error::{Result, TextCatError};
use crate::index::{DocumentIndex, MemoryIndex};
use crate::pipeline::Pipeline;
use crate::record::TrainingFile;

/// Execute a CLI command.
pub fn execute_command(args: TextCatArgs) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => run_pipeline(run_args, &args),
        Command::Inspect(inspect_args) => inspect_model(inspect_args, &args),
        Command::Select(select_args) => select_features(select_args, &args),
    }
}

/// Train and classify.
fn run_pipeline(args: &RunArgs, cli_args: &TextCatArgs) -> Result<()> {
    let config = args.load_config()?;
    let report = Pipeline::new(config).run()?;
    output_result("Classification finished", &report, cli_args)
}

/// Train and print the model summary.
fn inspect_model(args: &InspectArgs, cli_args: &TextCatArgs) -> Result<()> {
    let mut config = args.pipeline.load_config()?;
    if let Some(top) = args.top {
        config.top_words = top;
    }
    let index = open_training_index(&config)?;

    let model = Pipeline::new(config.clone()).train_model(&index)?;
    let summary = ModelSummary::new(&model, &index, config.top_words);

    match cli_args.output_format {
        OutputFormat::Human => {
            print!("{summary}");
            Ok(())
        }
        OutputFormat::Json => output_result("Model summary", &summary, cli_args),
    }
}

/// Print the top terms by mutual information.
fn select_features(args: &SelectArgs, cli_args: &TextCatArgs) -> Result<()> {
    let config = args.pipeline.load_config()?;
    let index = open_training_index(&config)?;
    let training = TrainingFile::open(&config.train_docs)?;

    let table = ContingencyTable::accumulate(&index, &training)?;
    if table.documents() == 0 {
        return Err(TextCatError::EmptyTrainingSet);
    }
    let selector = MutualInformationSelector::new(config.feature_count);

    let terms = selector
        .top_terms(&table)
        .into_iter()
        .enumerate()
        .map(|(i, scored)| SelectedTerm::new(i + 1, scored, index.term_text(scored.term_id)))
        .collect();

    output_result(
        "Top terms by mutual information",
        &SelectionResult {
            training_documents: table.documents(),
            relevant_documents: table.relevant_documents(),
            requested: selector.feature_count(),
            terms,
        },
        cli_args,
    )
}

/// Open the index for a command that needs no test or result file.
fn open_training_index(config: &PipelineConfig) -> Result<MemoryIndex> {
    if config.index.as_os_str().is_empty() {
        return Err(TextCatError::config("missing `index` path"));
    }
    if config.train_docs.as_os_str().is_empty() {
        return Err(TextCatError::config("missing `train_docs` path"));
    }
    config.estimator_config().validate()?;
    MemoryIndex::open(&config.index)
}
