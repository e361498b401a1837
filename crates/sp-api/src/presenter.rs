use sp_core::{EvaluationResult, VariableSnapshot};

/// Whatever shows the preview to the author.
pub trait Presenter {
    fn display(&mut self, variables: &VariableSnapshot);
    fn display_error(&mut self, message: &str);
    fn clear(&mut self);
}

pub fn present<P: Presenter + ?Sized>(presenter: &mut P, result: &EvaluationResult) {
    match result {
        EvaluationResult::Snapshot { variables } => presenter.display(variables),
        EvaluationResult::Error { message } => presenter.display_error(message),
        EvaluationResult::Cleared => presenter.clear(),
    }
}
