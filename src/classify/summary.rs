//! Human-readable digest of a trained model.

use std::fmt;

use serde::Serialize;

use crate::classify::model::{ClassModel, TrainingStats};
use crate::index::{DocumentIndex, TermId};
use crate::record::Label;

/// A high-probability term of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTerm {
    pub term_id: TermId,
    /// Term text, when the index keeps it.
    pub text: Option<String>,
    pub probability: f64,
}

/// Priors, distribution masses and top terms of a model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub relevant_prior: f64,
    pub irrelevant_prior: f64,
    pub relevant_mass: f64,
    pub irrelevant_mass: f64,
    pub selected_features: Option<usize>,
    pub stats: TrainingStats,
    pub top_relevant: Vec<TopTerm>,
    pub top_irrelevant: Vec<TopTerm>,
}

impl ModelSummary {
    /// Summarize `model`, listing the `top_n` most probable terms per class.
    pub fn new(model: &ClassModel, index: &dyn DocumentIndex, top_n: usize) -> Self {
        ModelSummary {
            relevant_prior: model.prior(),
            irrelevant_prior: 1.0 - model.prior(),
            relevant_mass: model.mass(Label::Relevant),
            irrelevant_mass: model.mass(Label::Irrelevant),
            selected_features: model.features().map(|f| f.len()),
            stats: *model.stats(),
            top_relevant: top_terms(model.relevant(), index, top_n),
            top_irrelevant: top_terms(model.irrelevant(), index, top_n),
        }
    }

    /// Write the summary to the log at info level.
    pub fn log(&self) {
        for line in self.to_string().lines() {
            log::info!("{line}");
        }
    }
}

/// Most probable terms, ties by ascending term id. Zero-probability terms are skipped.
fn top_terms(distribution: &[f64], index: &dyn DocumentIndex, top_n: usize) -> Vec<TopTerm> {
    let mut slots: Vec<usize> = (0..distribution.len())
        .filter(|&slot| distribution[slot] > 0.0)
        .collect();
    slots.sort_by(|&a, &b| distribution[b].total_cmp(&distribution[a]).then(a.cmp(&b)));

    slots
        .into_iter()
        .take(top_n)
        .map(|slot| {
            let term_id = slot as TermId;
            TopTerm {
                term_id,
                text: index.term_text(term_id).map(str::to_string),
                probability: distribution[slot],
            }
        })
        .collect()
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[TopTerm]) -> fmt::Result {
    for (rank, term) in terms.iter().enumerate() {
        match &term.text {
            Some(text) => writeln!(f, "  {:>3}. {} {:.6}", rank + 1, text, term.probability)?,
            None => writeln!(f, "  {:>3}. #{} {:.6}", rank + 1, term.term_id, term.probability)?,
        }
    }
    Ok(())
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Prior: relevant {:.6}, irrelevant {:.6}",
            self.relevant_prior, self.irrelevant_prior
        )?;
        writeln!(
            f,
            "Probability mass: relevant {:.6}, irrelevant {:.6}",
            self.relevant_mass, self.irrelevant_mass
        )?;
        if let Some(selected) = self.selected_features {
            writeln!(f, "Selected features: {selected}")?;
        }
        writeln!(f, "Top terms of the relevant model:")?;
        write_terms(f, &self.top_relevant)?;
        writeln!(f, "Top terms of the irrelevant model:")?;
        write_terms(f, &self.top_irrelevant)
    }
}
