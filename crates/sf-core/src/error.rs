use crate::types::{format_path, Path, Position};
use thiserror::Error;

/// The schema is malformed: no reachable form, a return before the first form,
/// a walk that runs off the end, or an expression that fails to evaluate.
pub const FLOW_INVALID_SCHEMA: &str = "FLOW_INVALID_SCHEMA";
/// A path does not match the shape of the schema it is resolved against.
pub const FLOW_INVALID_PATH: &str = "FLOW_INVALID_PATH";
/// A seeded flow state cannot be used at all (for example an empty trail).
pub const FLOW_INVALID_STATE: &str = "FLOW_INVALID_STATE";

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct FlowError {
    pub code: String,
    pub message: String,
    pub path: Option<Path>,
}

impl FlowError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(
        code: impl Into<String>,
        message: impl Into<String>,
        path: &[Position],
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: Some(path.to_vec()),
        }
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::new(FLOW_INVALID_SCHEMA, message)
    }

    pub fn invalid_path(path: &[Position]) -> Self {
        Self::with_path(
            FLOW_INVALID_PATH,
            format!("Path \"{}\" does not resolve against the schema.", format_path(path)),
            path,
        )
    }

    /// Schema and path defects cannot be recovered from by retrying the operation.
    pub fn is_fatal(&self) -> bool {
        self.code == FLOW_INVALID_SCHEMA || self.code == FLOW_INVALID_PATH
    }
}
