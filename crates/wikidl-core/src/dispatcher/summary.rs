//! End-of-run tally of task outcomes.

use std::fmt;

use crate::error::Stage;
use crate::pool::Termination;
use crate::task::{SavedArticle, TaskOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub saved: Vec<SavedArticle>,
    pub resolve_failures: usize,
    pub fetch_failures: usize,
    pub write_failures: usize,
    pub panicked: usize,
    /// Tasks still running (or queued) when the await bound passed.
    pub unfinished: usize,
    pub timed_out: bool,
}

impl RunSummary {
    /// Tally at the moment the wait ended; jobs finishing later on detached
    /// workers are not counted.
    pub fn from_termination(submitted: usize, termination: Termination<TaskOutcome>) -> Self {
        let mut summary = RunSummary {
            submitted,
            panicked: termination.panicked,
            unfinished: termination.unfinished,
            timed_out: termination.timed_out,
            ..RunSummary::default()
        };
        for outcome in termination.completed {
            match outcome {
                TaskOutcome::Saved(article) => summary.saved.push(article),
                TaskOutcome::Failed(Stage::Resolve) => summary.resolve_failures += 1,
                TaskOutcome::Failed(Stage::Fetch) => summary.fetch_failures += 1,
                TaskOutcome::Failed(Stage::Write) => summary.write_failures += 1,
            }
        }
        summary
    }

    pub fn failed(&self) -> usize {
        self.resolve_failures + self.fetch_failures + self.write_failures + self.panicked
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} submitted, {} saved, {} failed (resolve {}, fetch {}, write {}, panicked {})",
            self.submitted,
            self.saved.len(),
            self.failed(),
            self.resolve_failures,
            self.fetch_failures,
            self.write_failures,
            self.panicked
        )?;
        if self.timed_out {
            write!(f, "; timed out with {} unfinished", self.unfinished)?;
        }
        Ok(())
    }
}
