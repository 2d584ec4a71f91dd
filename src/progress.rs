//! Step display for installer runs
//!
//! Every blocking step shows a spinner while it runs and resolves to a
//! success, warning or failure glyph. The spinner is finished on drop so
//! no ticker thread or hidden cursor survives an early return or panic.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner wrapper for one installer step
pub struct Step {
    bar: ProgressBar,
    label: String,
    finished: bool,
}

impl Step {
    /// Start a step with a spinner and label
    pub fn start(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            label: label.to_string(),
            finished: false,
        }
    }

    /// Resolve the step with a success glyph
    pub fn done(mut self) {
        self.bar.finish_and_clear();
        self.finished = true;
        println!("{} {}", style("✔").green(), self.label);
    }

    /// Resolve the step with a success glyph and a trailing note
    pub fn done_with(mut self, note: &str) {
        self.bar.finish_and_clear();
        self.finished = true;
        println!("{} {} {}", style("✔").green(), self.label, style(note).dim());
    }

    /// Resolve the step with a warning glyph; the run continues degraded
    pub fn warn(mut self, note: &str) {
        self.bar.finish_and_clear();
        self.finished = true;
        println!("{} {} {}", style("⚠").yellow(), self.label, style(note).yellow());
    }

    /// Resolve the step with a failure glyph
    pub fn fail(mut self) {
        self.bar.finish_and_clear();
        self.finished = true;
        println!("{} {}", style("✘").red(), self.label);
    }
}

impl Drop for Step {
    fn drop(&mut self) {
        // Unwind or early `?` must not leave the ticker running
        if !self.finished {
            self.bar.finish_and_clear();
        }
    }
}

/// Print an informational line outside of any step
pub fn note(msg: &str) {
    println!("  {}", style(msg).dim());
}

/// Print a prominent warning line outside of any step
pub fn warn_line(msg: &str) {
    println!("{} {}", style("⚠").yellow(), style(msg).yellow());
}

/// Download progress bar sized by content length, byte-formatted
pub fn download_bar(total: Option<u64>, label: &str) -> ProgressBar {
    let bar = match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner:.cyan} {bytes} {msg}")
                    .unwrap(),
            );
            bar
        }
    };
    bar.set_message(label.to_string());
    bar
}
