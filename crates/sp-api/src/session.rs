use std::time::Instant;

use sp_core::{Cursor, EvaluationResult, PreviewConfig};
use sp_runtime::{ProjectSource, StoryCompiler};
use tracing::trace;

use crate::debounce::Debouncer;
use crate::presenter::{present, Presenter};
use crate::service::SceneEvaluationService;

/// Editor-facing loop: cursor moves are debounced, the surviving one is
/// evaluated and its result handed to the presenter.
pub struct PreviewSession<C, P> {
    service: SceneEvaluationService<C>,
    presenter: P,
    debouncer: Debouncer<Cursor>,
    project: Option<ProjectSource>,
}

impl<C: StoryCompiler, P: Presenter> PreviewSession<C, P> {
    pub fn new(compiler: C, presenter: P, config: PreviewConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce()),
            service: SceneEvaluationService::new(compiler, config),
            presenter,
            project: None,
        }
    }

    pub fn set_project(&mut self, project: Option<ProjectSource>) {
        self.project = project;
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn cursor_moved(&mut self, cursor: Cursor, now: Instant) {
        if self.debouncer.submit(cursor, now) {
            trace!("superseded pending preview request");
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Runs the pending evaluation if its quiet interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<EvaluationResult> {
        let cursor = self.debouncer.take_due(now)?;
        let result = self.service.evaluate(&cursor, self.project.as_ref());
        present(&mut self.presenter, &result);
        Some(result)
    }
}
