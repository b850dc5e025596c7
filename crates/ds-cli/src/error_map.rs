use std::fmt::Display;

use ds_core::DialogError;

/// Every failure the CLI itself can report. Script and runtime errors keep their own codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliFailure {
    SourcePath,
    SourceNotFound,
    SourceNotDir,
    SourceScan,
    SourceRead,
    SourceEmpty,
    SourceDuplicate,
    StateKey,
    StateNotFound,
    StateRead,
    StateInvalid,
    StateSchema,
    StateWrite,
}

impl CliFailure {
    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::SourcePath => "CLI_SOURCE_PATH",
            Self::SourceNotFound => "CLI_SOURCE_NOT_FOUND",
            Self::SourceNotDir => "CLI_SOURCE_NOT_DIR",
            Self::SourceScan => "CLI_SOURCE_SCAN",
            Self::SourceRead => "CLI_SOURCE_READ",
            Self::SourceEmpty => "CLI_SOURCE_EMPTY",
            Self::SourceDuplicate => "CLI_SOURCE_DUPLICATE",
            Self::StateKey => "CLI_STATE_KEY",
            Self::StateNotFound => "CLI_STATE_NOT_FOUND",
            Self::StateRead => "CLI_STATE_READ",
            Self::StateInvalid => "CLI_STATE_INVALID",
            Self::StateSchema => "CLI_STATE_SCHEMA",
            Self::StateWrite => "CLI_STATE_WRITE",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::SourcePath => "cannot resolve scripts-dir",
            Self::SourceNotFound => "scripts-dir does not exist",
            Self::SourceNotDir => "scripts-dir is not a directory",
            Self::SourceScan => "cannot scan scripts-dir",
            Self::SourceRead => "cannot read dialog file",
            Self::SourceEmpty => "no *.dialog.json files under scripts-dir",
            Self::SourceDuplicate => "dialog id defined twice",
            Self::StateKey => "storage key cannot be used as a path",
            Self::StateNotFound => "no conversation state",
            Self::StateRead => "cannot read conversation state",
            Self::StateInvalid => "conversation state is not valid JSON",
            Self::StateSchema => "unsupported dialog state schema",
            Self::StateWrite => "cannot write conversation state",
        }
    }

    pub(crate) fn error(self, detail: impl Display) -> DialogError {
        DialogError::new(self.code(), format!("{}: {}", self.summary(), detail))
    }
}

/// Prints the error block of the line protocol and returns the process exit code.
pub(crate) fn emit_error(error: DialogError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    if let Some(location) = &error.location {
        println!(
            "ERROR_AT_JSON:{}",
            serde_json::to_string(location).expect("location json")
        );
    }
    1
}
