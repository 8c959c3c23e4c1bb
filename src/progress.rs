// Progress indicator shown while a completion request is outstanding.
// indicatif's steady tick redraws the frame from its own thread, so the
// blocking request on the caller's thread is never held up by drawing.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Bouncing-dot frames. indicatif shows the last entry once the bar
/// finishes, so it is the blank frame.
const FRAMES: [&str; 11] = [
    "[o     ]",
    "[ o    ]",
    "[  o   ]",
    "[   o  ]",
    "[    o ]",
    "[     o]",
    "[    o ]",
    "[   o  ]",
    "[  o   ]",
    "[ o    ]",
    "[      ]",
];

const FRAME_INTERVAL: Duration = Duration::from_millis(200);

/// A single-line spinner with explicit start/stop.
pub struct ProgressIndicator {
    visible: bool,
    message: String,
    bar: Option<ProgressBar>,
}

impl ProgressIndicator {
    /// Indicator drawing to stderr. indicatif hides it by itself when stderr
    /// is not a terminal.
    pub fn new() -> Self {
        ProgressIndicator {
            visible: true,
            message: String::new(),
            bar: None,
        }
    }

    /// Indicator that never draws anything.
    pub fn hidden() -> Self {
        ProgressIndicator {
            visible: false,
            message: String::new(),
            bar: None,
        }
    }

    /// Text shown next to the animation.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_running(&self) -> bool {
        self.bar.is_some()
    }

    /// Start animating. Calling this while already running does nothing.
    pub fn start(&mut self) {
        if self.bar.is_some() {
            return;
        }
        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(ProgressStyle::default_spinner().tick_strings(&FRAMES));
        bar.set_message(self.message.clone());
        bar.enable_steady_tick(FRAME_INTERVAL);
        self.bar = Some(bar);
    }

    /// Stop the tick thread, wipe the spinner line and leave one blank line
    /// before whatever is printed next. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.println("");
            bar.finish_and_clear();
        }
    }

    /// Run `f` with the indicator spinning. The indicator is stopped on every
    /// way out of `f`, panics included.
    pub fn run<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let _running = Running::start(self);
        f()
    }
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        ProgressIndicator::new()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Guard that stops the indicator when dropped.
struct Running<'a>(&'a mut ProgressIndicator);

impl<'a> Running<'a> {
    fn start(indicator: &'a mut ProgressIndicator) -> Self {
        indicator.start();
        Running(indicator)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}
