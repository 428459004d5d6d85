//! Progress reporting for refreshes and hot-list imports.

/// Receives updates while a batch of catalog games is processed.
pub trait ImportProgress {
    /// A game finished processing; `current` counts from 1.
    fn on_game(&self, current: usize, total: usize, name: &str);

    /// A new stage began, such as the batched catalog fetch.
    fn on_phase(&self, message: &str);

    fn on_complete(&self, message: &str);
}

/// Discards every update.
pub struct SilentProgress;

impl ImportProgress for SilentProgress {
    fn on_game(&self, _current: usize, _total: usize, _name: &str) {}
    fn on_phase(&self, _message: &str) {}
    fn on_complete(&self, _message: &str) {}
}

/// Writes updates to the log, one line per `every` games plus the last one.
///
/// Meant for output that is not a terminal, where a redrawn bar would only
/// leave control characters behind.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    pub fn every(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    fn reports(&self, current: usize, total: usize) -> bool {
        current == total || current.is_multiple_of(self.every)
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::every(10)
    }
}

impl ImportProgress for LogProgress {
    fn on_game(&self, current: usize, total: usize, name: &str) {
        if self.reports(current, total) {
            log::info!("[{}/{}] {}", current, total, name);
        }
    }

    fn on_phase(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_complete(&self, message: &str) {
        log::info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_progress_samples_games() {
        let progress = LogProgress::every(3);
        let reported: Vec<usize> = (1..=7).filter(|&i| progress.reports(i, 7)).collect();
        assert_eq!(reported, vec![3, 6, 7]);
    }

    #[test]
    fn log_progress_interval_is_at_least_one() {
        let progress = LogProgress::every(0);
        assert!((1..=4).all(|i| progress.reports(i, 4)));
    }
}
