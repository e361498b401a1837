use serde::{Deserialize, Serialize};

use crate::value::VariableSnapshot;

/// Where the author's caret sits. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub line: usize,
    pub file_path: Option<String>,
}

impl Cursor {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            file_path: None,
        }
    }

    pub fn in_file(line: usize, file_path: impl Into<String>) -> Self {
        Self {
            line,
            file_path: Some(file_path.into()),
        }
    }
}

/// Source lines of the content an engine executed last, or of the branch
/// it entered last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLocation {
    pub start_line: usize,
    pub end_line: usize,
    pub file_identity: Option<String>,
}

impl DebugLocation {
    pub fn new(start_line: usize, end_line: usize, file_identity: Option<String>) -> Self {
        Self {
            start_line,
            end_line,
            file_identity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EvaluationResult {
    Snapshot { variables: VariableSnapshot },
    Error { message: String },
    Cleared,
}

impl EvaluationResult {
    pub fn snapshot(&self) -> Option<&VariableSnapshot> {
        match self {
            Self::Snapshot { variables } => Some(variables),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }
}
