//! Terminal progress display.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use meeple_import::{ImportProgress, LogProgress, SilentProgress};

/// A ticking spinner for a single long-running request.
///
/// Hidden when `quiet` is set.
pub(crate) fn spinner(msg: impl Into<String>, quiet: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("/-\\|"));
    }
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress display for batch commands: a bar on a terminal, log lines
/// when stderr is redirected, nothing under `--quiet`.
pub(crate) fn batch_progress(quiet: bool) -> Box<dyn ImportProgress> {
    if quiet {
        Box::new(SilentProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(BarProgress::new())
    } else {
        Box::new(LogProgress::default())
    }
}

/// [`ImportProgress`] rendered as a progress bar.
pub(crate) struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let pb = spinner("", false);
        Self { pb }
    }
}

impl ImportProgress for BarProgress {
    fn on_game(&self, current: usize, total: usize, name: &str) {
        if self.pb.length() != Some(total as u64) {
            self.pb.disable_steady_tick();
            self.pb.set_length(total as u64);
            if let Ok(style) =
                ProgressStyle::with_template("  [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            {
                self.pb.set_style(style.progress_chars("=> "));
            }
        }
        self.pb.set_position(current as u64);
        self.pb.set_message(name.to_string());
    }

    fn on_phase(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn on_complete(&self, message: &str) {
        self.pb.finish_and_clear();
        log::info!("{}", message);
    }
}
