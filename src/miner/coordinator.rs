//! Miner that drives splitter, page parser and extractor over a dump

use super::progress::MiningProgress;
use super::status::{ExtractionBatch, ExtractionOutcome, MiningStatus};
use crate::config::SplitterConfig;
use crate::dump::{DumpSource, Page, PageParser, Splitter};
use crate::error::MinerError;
use crate::grammar::Grammar;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options for a mining run
#[derive(Debug, Clone, Default)]
pub struct MinerOptions {
    /// Namespace filter and chunking for the streaming path
    pub splitter: SplitterConfig,
    /// No progress output
    pub quiet: bool,
}

/// Mines transcriptions from a dump with one grammar
pub struct Miner {
    grammar: Grammar,
    options: MinerOptions,
    parser: PageParser,
    cancelled: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(grammar: Grammar, options: MinerOptions) -> Self {
        Self {
            grammar,
            options,
            parser: PageParser::new(false),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Flag that stops the run after the current batch when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Mine a dump file, or every chunk file under a directory
    pub fn mine_path(&self, path: &Path, from_dir: bool) -> Result<MiningStatus, MinerError> {
        if from_dir {
            self.mine_directory(path)
        } else {
            self.mine_source(DumpSource::open(path)?)
        }
    }

    /// Stream a dump through the splitter, one batch per chunk
    pub fn mine_source(&self, source: DumpSource) -> Result<MiningStatus, MinerError> {
        info!(
            "Mining {} with the '{}' grammar",
            source.source_name(),
            self.grammar.language()
        );

        let progress = MiningProgress::new(self.options.quiet, self.cancelled.clone());
        let mut status = MiningStatus::new();

        for chunk in Splitter::new(source, &self.options.splitter)?.chunks() {
            if progress.is_cancelled() {
                info!("Mining cancelled");
                break;
            }

            let chunk = chunk?;
            let pages = self.parser.parse_str(&chunk.contents)?;
            let batch = self.extract_from_pages(&pages);
            let batch_pages = batch.pages_total();
            status.fold(batch);
            progress.batch_processed(batch_pages, &status);

            debug!(
                "Chunk {}: {} pages ({} seen, {} in namespace) | {}",
                chunk.index,
                chunk.pages,
                chunk.pages_total,
                chunk.pages_matching_namespace,
                status.summary_line()
            );
        }

        progress.finish(&status);
        info!("Mining finished: {}", status.summary_line());
        Ok(status)
    }

    /// Mine every `*.xml` file under `dir` in file name order
    pub fn mine_directory(&self, dir: &Path) -> Result<MiningStatus, MinerError> {
        if !dir.is_dir() {
            return Err(MinerError::InvalidFormat(format!(
                "not a directory: {}",
                dir.display()
            )));
        }

        let files = xml_files(dir)?;
        info!(
            "Mining {} chunk files under {} with the '{}' grammar",
            files.len(),
            dir.display(),
            self.grammar.language()
        );

        let progress = MiningProgress::new(self.options.quiet, self.cancelled.clone());
        let mut status = MiningStatus::new();

        for file in files {
            if progress.is_cancelled() {
                info!("Mining cancelled");
                break;
            }

            let pages = self.parser.parse_file(&file)?;
            let batch = self.extract_from_pages(&pages);
            let batch_pages = batch.pages_total();
            status.fold(batch);
            progress.batch_processed(batch_pages, &status);

            debug!("{}: {} pages | {}", file.display(), batch_pages, status.summary_line());
        }

        progress.finish(&status);
        info!("Mining finished: {}", status.summary_line());
        Ok(status)
    }

    /// Run the extractor over a batch of pages
    pub fn extract_from_pages(&self, pages: &[Page]) -> ExtractionBatch {
        let mut batch = ExtractionBatch::default();
        for page in pages {
            match self.extract_page(page) {
                Some(outcome) => batch.push(outcome),
                None => {
                    batch.pages_failed += 1;
                    batch.push(ExtractionOutcome::failed(&page.id, &page.title));
                }
            }
        }
        batch
    }

    /// Mine one page; `None` if the extraction panicked
    fn extract_page(&self, page: &Page) -> Option<ExtractionOutcome> {
        let extraction = panic::catch_unwind(AssertUnwindSafe(|| {
            self.grammar.extract(&page.revision_text)
        }));

        let extraction = match extraction {
            Ok(extraction) => extraction,
            Err(_) => {
                warn!("Extraction panicked on page {} '{}'", page.id, page.title);
                return None;
            }
        };

        // A transcription without a word is useless
        let transcription = if page.title.is_empty() {
            None
        } else {
            extraction.transcription
        };

        Some(ExtractionOutcome {
            id: page.id.clone(),
            title: page.title.clone(),
            found_block: extraction.found_block,
            found_transcription: transcription.is_some(),
            transcription,
        })
    }
}

/// `*.xml` files under `dir`, in file name order
fn xml_files(dir: &Path) -> Result<Vec<PathBuf>, MinerError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "xml") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
