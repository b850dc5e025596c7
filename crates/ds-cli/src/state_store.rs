use std::fs;
use std::path::{Component, Path, PathBuf};

use ds_core::DialogError;

use crate::{CliFailure, ConversationRecord, DIALOG_STATE_SCHEMA};

/// Storage keys contain `/`, so each key maps onto nested directories under `state_dir`.
/// Keys built from address values that would leave `state_dir` are rejected.
pub(crate) fn state_path(state_dir: &str, storage_key: &str) -> Result<PathBuf, DialogError> {
    let relative = Path::new(storage_key);
    let contained = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if storage_key.is_empty() || !contained {
        return Err(CliFailure::StateKey.error(storage_key));
    }
    Ok(Path::new(state_dir).join(format!("{}.json", storage_key)))
}

pub(crate) fn save_record(path: &Path, record: &ConversationRecord) -> Result<(), DialogError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|error| CliFailure::StateWrite.error(error))?;

    let payload = serde_json::to_string(record).expect("conversation record should serialize");
    fs::write(path, payload).map_err(|error| CliFailure::StateWrite.error(error))
}

pub(crate) fn load_record(path: &Path) -> Result<ConversationRecord, DialogError> {
    if !path.exists() {
        return Err(CliFailure::StateNotFound.error(path.display()));
    }

    let raw = fs::read_to_string(path).map_err(|error| CliFailure::StateRead.error(error))?;
    let record: ConversationRecord =
        serde_json::from_str(&raw).map_err(|error| CliFailure::StateInvalid.error(error))?;

    if record.schema_version != DIALOG_STATE_SCHEMA {
        return Err(CliFailure::StateSchema.error(&record.schema_version));
    }

    Ok(record)
}
