//! Progress indicator shown while a platform call is in flight

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can show a call in progress.
///
/// `stop` and `stop_hidden` must tolerate being called when nothing is
/// running, and repeatedly.
pub trait ProgressIndicator: Send {
    fn start(&mut self, label: &str);
    fn stop(&mut self, success: bool);
    fn stop_hidden(&mut self);
}

/// Creates one indicator per call
pub trait ProgressFactory: Send + Sync {
    fn create(&self) -> Box<dyn ProgressIndicator>;
}

/// Indicator that shows nothing (quiet calls, non-interactive use)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressIndicator for NoProgress {
    fn start(&mut self, _label: &str) {}
    fn stop(&mut self, _success: bool) {}
    fn stop_hidden(&mut self) {}
}

impl ProgressFactory for NoProgress {
    fn create(&self) -> Box<dyn ProgressIndicator> {
        Box::new(NoProgress)
    }
}

/// Terminal spinner ticking in the background on stderr
#[derive(Debug, Default)]
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl ProgressIndicator for Spinner {
    fn start(&mut self, label: &str) {
        self.stop_hidden();

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(TICK_INTERVAL);
        self.bar = Some(bar);
    }

    fn stop(&mut self, success: bool) {
        if let Some(bar) = self.bar.take() {
            let label = bar.message();
            if success {
                bar.finish_with_message(format!("{} ✓", label));
            } else {
                bar.abandon_with_message(format!("{} ✗", label));
            }
        }
    }

    fn stop_hidden(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Factory handing out [`Spinner`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinnerFactory;

impl ProgressFactory for SpinnerFactory {
    fn create(&self) -> Box<dyn ProgressIndicator> {
        Box::new(Spinner::default())
    }
}

/// One started indicator run. Dropping an unfinished session stops the
/// indicator in the failed state, so early returns cannot leave it ticking.
pub struct ProgressSession<'a> {
    indicator: &'a mut dyn ProgressIndicator,
    active: bool,
}

impl<'a> ProgressSession<'a> {
    pub fn start(indicator: &'a mut dyn ProgressIndicator, label: &str) -> Self {
        indicator.start(label);
        Self {
            indicator,
            active: true,
        }
    }

    pub fn finish(mut self, success: bool) {
        self.active = false;
        self.indicator.stop(success);
    }

    /// Stop without presenting the run as failed (used before a retry)
    pub fn hide(mut self) {
        self.active = false;
        self.indicator.stop_hidden();
    }
}

impl Drop for ProgressSession<'_> {
    fn drop(&mut self) {
        if self.active {
            self.indicator.stop(false);
        }
    }
}
