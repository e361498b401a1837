use crate::types::DebugLocation;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct PreviewError {
    pub code: String,
    pub message: String,
    pub location: Option<DebugLocation>,
}

impl PreviewError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: DebugLocation,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }
}

/// Every message a compiler reported for a project that did not build.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}", .messages.join("\n"))]
pub struct CompileFailure {
    pub messages: Vec<String>,
}

impl CompileFailure {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}

impl From<PreviewError> for CompileFailure {
    fn from(error: PreviewError) -> Self {
        Self::single(error.to_string())
    }
}
