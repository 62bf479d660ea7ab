use geetmmc::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Terminal view of a run: one spinner per phase and one bar over the CV bins.
#[derive(Clone)]
pub struct CliProgressHandler {
    board: Arc<Mutex<BinBoard>>,
}

/// Bar plus the per-bin tally it renders.
struct BinBoard {
    bar: ProgressBar,
    phase: &'static str,
    total_bins: u64,
    finished_bins: u64,
    notes: usize,
}

impl BinBoard {
    fn start_phase(&mut self, name: &'static str) {
        self.phase = name;
        self.notes = 0;
        self.bar.reset();
        self.bar.set_length(0);
        self.bar.set_style(spinner_style());
        self.bar.set_prefix(name);
        self.bar.set_message("");
        self.bar
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    }

    fn start_bins(&mut self, total: u64) {
        self.total_bins = total;
        self.finished_bins = 0;
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(bin_bar_style());
        self.bar.set_message("waiting");
    }

    fn finish_bin(&mut self, bin: usize) {
        self.finished_bins += 1;
        self.bar.inc(1);
        self.bar.set_message(format!("bin {bin}"));
    }

    fn finish_bins(&mut self) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message(format!(
            "{}/{} bins sampled",
            self.finished_bins, self.total_bins
        ));
    }

    fn finish_phase(&mut self) {
        self.bar.disable_steady_tick();
        let summary = match self.notes {
            0 => format!("✓ {}", self.phase),
            1 => format!("✓ {} (1 note)", self.phase),
            n => format!("✓ {} ({n} notes)", self.phase),
        };
        self.bar.finish_with_message(summary);
    }

    fn note(&mut self, message: String) {
        self.notes += 1;
        if self.bar.is_finished() {
            self.bar.set_message(message);
        } else {
            self.bar.println(format!("  ! {message}"));
        }
    }
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0)
            .with_style(spinner_style())
            .with_message("Initializing...");
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            board: Arc::new(Mutex::new(BinBoard {
                bar,
                phase: "",
                total_bins: 0,
                finished_bins: 0,
                notes: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let shared = Arc::clone(&self.board);

        Box::new(move |progress: Progress| {
            let Ok(mut board) = shared.lock() else {
                warn!("Progress board mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => board.start_phase(name),
                Progress::PhaseFinish => board.finish_phase(),
                Progress::TaskStart { total_walkers } => board.start_bins(total_walkers),
                Progress::WalkerFinished { bin } => board.finish_bin(bin),
                Progress::TaskFinish => board.finish_bins(),
                Progress::Message(message) => board.note(message),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bin_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold} [{bar:32.cyan/blue}] {pos}/{len} bins, last {msg:<8} {rate} {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("rate", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let _ = write!(w, "{:.2} bins/s", state.per_sec());
    })
    .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let _ = write!(w, "~{:.0}s left", state.eta().as_secs_f64());
    })
    .progress_chars("█▌·")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let board = handler.board.lock().unwrap();
        assert_eq!(board.bar.length(), Some(0));
        assert!(board.bar.is_finished());
        assert_eq!(board.finished_bins, 0);
    }

    #[test]
    fn callback_tracks_finished_bins() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Sampling" });
        {
            let board = handler.board.lock().unwrap();
            assert_eq!(board.bar.prefix(), "Sampling");
            assert!(!board.bar.is_finished());
        }

        callback(Progress::TaskStart { total_walkers: 4 });
        {
            let board = handler.board.lock().unwrap();
            assert_eq!(board.bar.length(), Some(4));
            assert_eq!(board.bar.position(), 0);
            assert_eq!(board.total_bins, 4);
        }

        callback(Progress::WalkerFinished { bin: 2 });
        callback(Progress::WalkerFinished { bin: 0 });
        {
            let board = handler.board.lock().unwrap();
            assert_eq!(board.bar.position(), 2);
            assert_eq!(board.bar.message(), "bin 0");
        }

        callback(Progress::TaskFinish);
        {
            let board = handler.board.lock().unwrap();
            assert!(board.bar.is_finished());
            assert_eq!(board.bar.position(), 2);
            assert_eq!(board.bar.message(), "2/4 bins sampled");
        }

        callback(Progress::PhaseFinish);
        let board = handler.board.lock().unwrap();
        assert_eq!(board.bar.message(), "✓ Sampling");
    }

    #[test]
    fn skipped_bin_notes_are_counted_in_the_phase_summary() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Estimation" });
        callback(Progress::Message("bin 1 skipped: missing".to_string()));
        callback(Progress::Message("bin 3 skipped: missing".to_string()));
        callback(Progress::PhaseFinish);

        let board = handler.board.lock().unwrap();
        assert_eq!(board.notes, 2);
        assert_eq!(board.bar.message(), "✓ Estimation (2 notes)");
    }

    #[test]
    fn message_after_finish_replaces_the_bar_message() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();
        callback(Progress::Message("bin 1 skipped".to_string()));
        let board = handler.board.lock().unwrap();
        assert_eq!(board.bar.message(), "bin 1 skipped");
    }

    #[test]
    fn new_phase_clears_the_note_count() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Sampling" });
        callback(Progress::Message("slow bin".to_string()));
        callback(Progress::PhaseFinish);
        callback(Progress::PhaseStart { name: "Estimation" });
        callback(Progress::PhaseFinish);

        let board = handler.board.lock().unwrap();
        assert_eq!(board.bar.message(), "✓ Estimation");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Sampling" });
            callback(Progress::TaskStart { total_walkers: 1 });
            callback(Progress::WalkerFinished { bin: 0 });
            callback(Progress::TaskFinish);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let board = handler.board.lock().unwrap();
        assert!(board.bar.is_finished());
        assert_eq!(board.finished_bins, 1);
        assert_eq!(board.bar.message(), "✓ Sampling");
    }
}
