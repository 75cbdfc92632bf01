//! Status reporting for a labeling run

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Receives human-readable status text; never read back
pub trait ProgressReporter: Send + Sync {
    fn set(&self, text: &str);
}

/// Progress reporter that only logs each status line
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn set(&self, text: &str) {
        info!("{}", text);
    }
}

/// Spinner on the terminal showing the latest status
pub struct SpinnerReporter {
    spinner: Mutex<Option<ProgressBar>>,
    multi: MultiProgress,
    style: ProgressStyle,
}

impl SpinnerReporter {
    pub fn new(multi: MultiProgress) -> Self {
        // Use {elapsed} for human-readable format (e.g., "1s", "234ms")
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        Self {
            spinner: Mutex::new(None),
            multi,
            style,
        }
    }

    /// Stop the spinner and leave `text` on screen
    pub fn finish(&self, text: &str) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        match guard.take() {
            Some(pb) => pb.finish_with_message(text.to_string()),
            None => {
                if let Err(e) = self.multi.println(text) {
                    debug!("Could not print final status {:?}: {}", text, e);
                }
            }
        }
    }
}

impl ProgressReporter for SpinnerReporter {
    fn set(&self, text: &str) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let pb = guard.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(self.style.clone());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        pb.set_message(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    #[test]
    fn test_spinner_reporter_updates_message() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let reporter = SpinnerReporter::new(multi);

        reporter.set("Authenticating...");
        reporter.set("Fetching all messages...");

        let message = reporter
            .spinner
            .lock()
            .unwrap()
            .as_ref()
            .map(|pb| pb.message());
        assert_eq!(message.as_deref(), Some("Fetching all messages..."));

        reporter.finish("Processed 0 messages.");
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_finish_without_spinner() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let reporter = SpinnerReporter::new(multi);
        reporter.finish("Error: nothing to do");
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
