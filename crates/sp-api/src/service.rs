use std::rc::Rc;

use sp_core::{Cursor, EvaluationResult, PreviewConfig};
use sp_runtime::{
    CursorDriver, ProjectSource, SilentNoticeObserver, StopReason, Story, StoryCompiler,
};
use tracing::{debug, warn};

/// Outcome of one evaluation with the details presentation does not need.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: EvaluationResult,
    /// `None` when the driver never ran or an engine error aborted it.
    pub stop: Option<StopReason>,
    /// Steps taken, including the one that failed on an aborted run.
    pub steps: usize,
    pub absorbed_notices: usize,
    pub diagnostics: Vec<String>,
}

impl Evaluation {
    fn without_run(result: EvaluationResult) -> Self {
        Self {
            result,
            stop: None,
            steps: 0,
            absorbed_notices: 0,
            diagnostics: Vec::new(),
        }
    }
}

/// Compiles a project from scratch and runs it up to the cursor.
///
/// Nothing survives between calls: each evaluation owns a freshly compiled
/// story, so the same project and cursor always give the same snapshot.
#[derive(Debug, Clone)]
pub struct SceneEvaluationService<C> {
    compiler: C,
    config: PreviewConfig,
}

impl<C: StoryCompiler> SceneEvaluationService<C> {
    pub fn new(compiler: C, config: PreviewConfig) -> Self {
        Self { compiler, config }
    }

    pub fn evaluate(&self, cursor: &Cursor, project: Option<&ProjectSource>) -> EvaluationResult {
        self.evaluate_detailed(cursor, project).result
    }

    pub fn evaluate_detailed(
        &self,
        cursor: &Cursor,
        project: Option<&ProjectSource>,
    ) -> Evaluation {
        let Some(project) = project else {
            debug!("no project loaded");
            return Evaluation::without_run(EvaluationResult::Cleared);
        };
        if let Some(path) = cursor.file_path.as_deref() {
            if !project.contains_file(path) {
                debug!(file = path, "cursor is outside the project");
                return Evaluation::without_run(EvaluationResult::Cleared);
            }
        }

        debug!(line = cursor.line, file = ?cursor.file_path, "evaluating preview");
        let compiled = match self.compiler.compile(&project.main_file, project) {
            Ok(compiled) => compiled,
            Err(failure) => {
                debug!(errors = failure.messages.len(), "project does not compile");
                return Evaluation::without_run(EvaluationResult::Error {
                    message: failure.to_string(),
                });
            }
        };

        let mut story = compiled.story;
        let observer = Rc::new(SilentNoticeObserver::default());
        story.set_notice_observer(observer.clone());

        let driver = CursorDriver::new(cursor.clone()).with_step_limit(self.config.step_limit);
        match driver.run(&mut story) {
            Ok(run) => {
                debug!(
                    stop = ?run.stop,
                    steps = run.steps,
                    absorbed_notices = observer.absorbed(),
                    "preview evaluated"
                );
                Evaluation {
                    result: EvaluationResult::Snapshot {
                        variables: run.snapshot,
                    },
                    stop: Some(run.stop),
                    steps: run.steps,
                    absorbed_notices: observer.absorbed(),
                    diagnostics: compiled.diagnostics,
                }
            }
            Err(failure) => {
                warn!(error = %failure, "preview run failed");
                Evaluation {
                    result: EvaluationResult::Error {
                        message: failure.error.message,
                    },
                    stop: None,
                    steps: failure.steps,
                    absorbed_notices: observer.absorbed(),
                    diagnostics: compiled.diagnostics,
                }
            }
        }
    }
}
