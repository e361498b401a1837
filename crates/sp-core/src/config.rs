use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PreviewError;

pub const DEFAULT_STEP_LIMIT: usize = 10_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Driver iterations allowed per evaluation before it settles for the
    /// best state seen so far.
    pub step_limit: usize,
    /// Quiet interval a cursor must rest before an evaluation starts.
    pub debounce_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl PreviewConfig {
    pub fn from_json_str(source: &str) -> Result<Self, PreviewError> {
        serde_json::from_str(source).map_err(|error| {
            PreviewError::new("CONFIG_PARSE", format!("Invalid preview config: {}", error))
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
