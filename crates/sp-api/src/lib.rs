mod debounce;
mod presenter;
mod service;
mod session;

pub use debounce::Debouncer;
pub use presenter::{present, Presenter};
pub use service::{Evaluation, SceneEvaluationService};
pub use session::PreviewSession;

pub use sp_core::{
    CompileFailure, Cursor, DebugLocation, EvaluationResult, PreviewConfig, PreviewError,
    PreviewValue, VariableSnapshot,
};
pub use sp_runtime::{ProjectSource, StopReason, StoryCompiler};
