use sp_core::{PreviewValue, VariableSnapshot};
use tracing::debug;

use crate::story::{Story, StoryValue};

/// Captures every readable variable. Never fails: an unreadable variable is
/// left out, an unreadable variable state yields an empty snapshot.
pub fn snapshot_variables<S: Story + ?Sized>(story: &S) -> VariableSnapshot {
    let names = match story.variable_names() {
        Ok(names) => names,
        Err(error) => {
            debug!(%error, "variable state unavailable");
            return VariableSnapshot::default();
        }
    };

    names
        .into_iter()
        .filter_map(|name| match story.read_variable(&name) {
            Ok(value) => Some((name, coerce_value(value))),
            Err(error) => {
                debug!(variable = %name, %error, "skipped unreadable variable");
                None
            }
        })
        .collect()
}

/// Unwraps engine values to scalars. Unset and non-scalar values become null.
pub fn coerce_value(value: StoryValue) -> PreviewValue {
    match value {
        StoryValue::Bool(value) => PreviewValue::Bool(value),
        StoryValue::Number(value) => PreviewValue::Number(value),
        StoryValue::String(value) => PreviewValue::String(value),
        StoryValue::Unset | StoryValue::List(_) => PreviewValue::Null,
    }
}
