use std::path::PathBuf;

use ds_core::{OutgoingMessage, TurnStatus};
use ds_runtime::{CompletedDialog, DialogSet, StackSnapshot};
use serde::{Deserialize, Serialize};

pub(crate) const DIALOG_STATE_SCHEMA: &str = "dialog-state.v1";
pub(crate) const STATE_NAMESPACE: &str = "dialogState";
pub(crate) const DEFAULT_ENTRY_DIALOG: &str = "main";
pub(crate) const DIALOG_FILE_SUFFIX: &str = ".dialog.json";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScripts {
    pub(crate) scripts_dir: PathBuf,
    pub(crate) dialogs: DialogSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConversationRecord {
    pub(crate) schema_version: String,
    pub(crate) scripts_dir: String,
    pub(crate) entry_dialog: String,
    pub(crate) stack: StackSnapshot,
}

#[derive(Debug, Clone)]
pub(crate) struct TurnReport {
    pub(crate) status: TurnStatus,
    pub(crate) messages: Vec<OutgoingMessage>,
    pub(crate) completed: Vec<CompletedDialog>,
}
