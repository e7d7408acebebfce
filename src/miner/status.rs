//! Per-page outcomes and the running mining status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mining result for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Page ID
    pub id: String,
    /// Page title (the word)
    pub title: String,
    /// The target language block was found
    pub found_block: bool,
    /// A transcription was found
    pub found_transcription: bool,
    /// The transcription, when found
    pub transcription: Option<String>,
}

impl ExtractionOutcome {
    /// Outcome for a page that could not be mined at all
    pub fn failed(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            found_block: false,
            found_transcription: false,
            transcription: None,
        }
    }
}

/// Outcomes for one batch of pages (a chunk or a chunk file)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionBatch {
    pub outcomes: Vec<ExtractionOutcome>,
    pub pages_with_language_block: usize,
    pub pages_with_transcription: usize,
    /// Pages whose extraction panicked
    pub pages_failed: usize,
}

impl ExtractionBatch {
    /// Append one outcome, updating the counters
    pub fn push(&mut self, outcome: ExtractionOutcome) {
        if outcome.found_block {
            self.pages_with_language_block += 1;
        }
        if outcome.found_transcription {
            self.pages_with_transcription += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn pages_total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Running totals over a whole dump, plus every outcome in fold order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningStatus {
    pub pages_seen: usize,
    pub pages_with_language_block: usize,
    pub pages_with_transcription: usize,
    /// Pages whose extraction panicked (counted as without transcription)
    pub pages_failed: usize,
    /// Number of batches folded in
    pub batches: usize,
    #[serde(default)]
    pub outcomes: Vec<ExtractionOutcome>,
}

impl MiningStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the totals
    pub fn fold(&mut self, batch: ExtractionBatch) {
        self.pages_seen += batch.pages_total();
        self.pages_with_language_block += batch.pages_with_language_block;
        self.pages_with_transcription += batch.pages_with_transcription;
        self.pages_failed += batch.pages_failed;
        self.batches += 1;
        self.outcomes.extend(batch.outcomes);
    }

    /// Combine with a status computed over a disjoint set of batches
    pub fn merge(mut self, other: MiningStatus) -> Self {
        self.pages_seen += other.pages_seen;
        self.pages_with_language_block += other.pages_with_language_block;
        self.pages_with_transcription += other.pages_with_transcription;
        self.pages_failed += other.pages_failed;
        self.batches += other.batches;
        self.outcomes.extend(other.outcomes);
        self
    }

    /// Percentage of pages with the target language block
    pub fn percent_with_language_block(&self) -> f64 {
        percentage(self.pages_with_language_block, self.pages_seen)
    }

    /// Percentage of pages with a transcription
    pub fn percent_with_transcription(&self) -> f64 {
        percentage(self.pages_with_transcription, self.pages_seen)
    }

    /// Outcomes with (`true`) or without (`false`) a transcription
    pub fn outcomes_where(&self, found_transcription: bool) -> impl Iterator<Item = &ExtractionOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.found_transcription == found_transcription)
    }

    /// Sort outcomes by title, then by page ID
    pub fn sort_outcomes(&mut self) {
        self.outcomes
            .sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    }

    /// One-line totals, e.g. for a progress message
    pub fn summary_line(&self) -> String {
        format!(
            "Total: {} | LB: {} ({:.1}%) | IPA: {} ({:.1}%)",
            self.pages_seen,
            self.pages_with_language_block,
            self.percent_with_language_block(),
            self.pages_with_transcription,
            self.percent_with_transcription()
        )
    }
}

impl fmt::Display for MiningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mining Summary")?;
        writeln!(f, "==============")?;
        writeln!(f, "Batches:            {}", self.batches)?;
        writeln!(f, "Pages seen:         {}", self.pages_seen)?;
        writeln!(
            f,
            "With language block: {} ({:.2}%)",
            self.pages_with_language_block,
            self.percent_with_language_block()
        )?;
        writeln!(
            f,
            "With transcription: {} ({:.2}%)",
            self.pages_with_transcription,
            self.percent_with_transcription()
        )?;
        write!(f, "Failed pages:       {}", self.pages_failed)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}
