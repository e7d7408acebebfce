//! Progress reporting for mining runs

use super::status::MiningStatus;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Progress tracker for a mining run
pub struct MiningProgress {
    /// Spinner (None in quiet mode)
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    pages_processed: AtomicUsize,
    chunks_processed: AtomicUsize,
    /// Shared with [`super::Miner::cancel_handle`]
    cancelled: Arc<AtomicBool>,
}

impl MiningProgress {
    pub fn new(quiet: bool, cancelled: Arc<AtomicBool>) -> Self {
        let progress_bar = if !quiet {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} pages {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            pages_processed: AtomicUsize::new(0),
            chunks_processed: AtomicUsize::new(0),
            cancelled,
        }
    }

    /// Update after a batch has been folded into `status`
    pub fn batch_processed(&self, pages: usize, status: &MiningStatus) {
        let processed = self.pages_processed.fetch_add(pages, Ordering::Relaxed) + pages;
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(processed as u64);
            pb.set_message(format!(
                "{:.1} pages/s | {}",
                self.pages_per_second(),
                status.summary_line()
            ));
        }
    }

    pub fn pages_processed(&self) -> usize {
        self.pages_processed.load(Ordering::Relaxed)
    }

    pub fn chunks_processed(&self) -> usize {
        self.chunks_processed.load(Ordering::Relaxed)
    }

    pub fn pages_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.pages_processed() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Finish the spinner
    pub fn finish(&self, status: &MiningStatus) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!(
                "Done! {} | {:.1} pages/s",
                status.summary_line(),
                self.pages_per_second()
            ));
        }
    }
}
