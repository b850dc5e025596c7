use crate::types::LineLocation;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct DialogError {
    pub code: String,
    pub message: String,
    pub location: Option<LineLocation>,
}

impl DialogError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(code: impl Into<String>, message: impl Into<String>, location: LineLocation) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }
}
