//! Progress reporting (SPEC_FULL §10.8, spec §5 "Suspension points":
//! "Progress reporting emits to the terminal at fixed iteration strides;
//! this is observational and not part of the contract"). `indicatif` +
//! `console`, the dependency pair the `perl-lsp` `xtask` binary uses for its
//! own task-progress output.

use indicatif::{ProgressBar, ProgressStyle};

/// What the placer reports progress against: one unit per token consumed
/// from the interpreter's output stream (`placer::naive::place`'s main loop).
pub trait ProgressSink {
    fn set_length(&self, len: u64);
    fn inc(&self, delta: u64);
    fn finish(&self);
}

pub struct Indicatif(ProgressBar);

impl Indicatif {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} placing [{bar:40.cyan/blue}] {pos}/{len} tokens")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Indicatif(bar)
    }
}

impl ProgressSink for Indicatif {
    fn set_length(&self, len: u64) {
        self.0.set_length(len);
    }

    fn inc(&self, delta: u64) {
        self.0.inc(delta);
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_length(&self, _len: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self) {}
}

/// Resolves the progress sink for a run: the real bar unless `-np` was
/// passed or stdout is not an attended terminal (`DESIGN.md` Open Question
/// 4) — so piping output or running in CI both silently degrade to the
/// no-op rather than emitting bar escape codes into a file.
pub fn resolve(no_progress_flag: bool) -> Box<dyn ProgressSink> {
    if no_progress_flag || !console::Term::stdout().features().is_attended() {
        Box::new(NoProgress)
    } else {
        Box::new(Indicatif::new())
    }
}
