use sp_core::{Cursor, PreviewError, VariableSnapshot, DEFAULT_STEP_LIMIT};
use thiserror::Error;
use tracing::{debug, trace};

use crate::branch::select_branch;
use crate::position::is_at_cursor;
use crate::story::Story;
use crate::variables::snapshot_variables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Continuing,
    Choosing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ReachedCursor,
    ContentExhausted,
    StepLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverRun {
    pub snapshot: VariableSnapshot,
    pub stop: StopReason,
    pub steps: usize,
}

/// An engine error together with how many steps ran before it.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{error} (after {steps} steps)")]
pub struct DriverFailure {
    #[source]
    pub error: PreviewError,
    pub steps: usize,
}

/// Runs a story from wherever it stands until execution reaches the cursor.
#[derive(Debug, Clone)]
pub struct CursorDriver {
    cursor: Cursor,
    step_limit: usize,
}

impl CursorDriver {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn state_of<S: Story>(story: &S) -> DriverState {
        if story.can_continue() {
            DriverState::Continuing
        } else if !story.current_choices().is_empty() {
            DriverState::Choosing
        } else {
            DriverState::Finished
        }
    }

    /// Any engine error aborts the run; hitting the step limit does not.
    pub fn run<S: Story>(&self, story: &mut S) -> Result<DriverRun, DriverFailure> {
        let mut fallback = snapshot_variables(story);
        let mut steps = 0usize;

        loop {
            if steps >= self.step_limit {
                debug!(steps, "step limit reached before cursor");
                return Ok(DriverRun {
                    snapshot: fallback,
                    stop: StopReason::StepLimit,
                    steps,
                });
            }
            steps += 1;
            let failed = move |error: PreviewError| DriverFailure { error, steps };

            match Self::state_of(story) {
                DriverState::Continuing => {
                    story.continue_step().map_err(failed)?;
                    let after = snapshot_variables(story);
                    let arrived = story
                        .current_debug_location()
                        .is_some_and(|location| is_at_cursor(&location, &self.cursor));
                    if arrived {
                        return Ok(DriverRun {
                            snapshot: after,
                            stop: StopReason::ReachedCursor,
                            steps,
                        });
                    }
                    fallback = after;
                }
                DriverState::Choosing => {
                    let choices = story.current_choices();
                    let index = select_branch(story, &choices, &self.cursor).map_err(failed)?;
                    trace!(choice = index, "committed choice");
                    story.choose_choice(index).map_err(failed)?;
                }
                DriverState::Finished => {
                    return Ok(DriverRun {
                        snapshot: snapshot_variables(story),
                        stop: StopReason::ContentExhausted,
                        steps,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
