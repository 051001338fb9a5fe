use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})";

/// Shared progress counter of a crawl, bounded by the fonds' item count.
///
/// Cloning is cheap and every clone advances the same bar, so it can be handed to
/// each download task. Drawn to stdout; diagnostics go to stderr.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout());
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    /// A reporter that counts but never draws.
    pub fn hidden(total: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total);
        Self { bar }
    }

    /// Marks one record attempt as finished, whatever its result.
    pub fn increment(&self) {
        self.bar.inc(1);
    }

    pub fn finalize(&self) {
        self.bar.finish();
    }

    pub fn completed(&self) -> u64 {
        self.bar.position()
    }
}
