pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{PreviewConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_STEP_LIMIT};
pub use error::{CompileFailure, PreviewError};
pub use types::*;
pub use value::*;
