use std::collections::BTreeMap;
use std::sync::Arc;

use ds_core::{
    Activity, DialogError, DialogResult, LaunchOptions, OutgoingMessage, SessionState, TurnInput,
    TurnStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::{Dialog, DialogHost};

/// Registry of dialogs a stack may start by id.
#[derive(Default, Clone)]
pub struct DialogSet {
    dialogs: BTreeMap<String, Arc<dyn Dialog>>,
}

impl DialogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dialog: impl Dialog + 'static) -> &mut Self {
        self.dialogs
            .insert(dialog.id().to_string(), Arc::new(dialog));
        self
    }

    pub fn contains(&self, dialog_id: &str) -> bool {
        self.dialogs.contains_key(dialog_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.dialogs.keys().map(String::as_str)
    }

    pub fn find(&self, dialog_id: &str) -> Result<Arc<dyn Dialog>, DialogError> {
        self.dialogs.get(dialog_id).cloned().ok_or_else(|| {
            DialogError::new(
                "HOST_DIALOG_NOT_FOUND",
                format!("Dialog \"{}\" is not registered.", dialog_id),
            )
        })
    }
}

impl std::fmt::Debug for DialogSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSet")
            .field("dialogs", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub dialog_id: String,
    pub state: SessionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub frames: Vec<StackFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDialog {
    pub dialog_id: String,
    pub result: DialogResult,
}

#[derive(Debug, Clone)]
struct RuntimeFrame {
    frame_id: u64,
    dialog_id: String,
    state: SessionState,
}

/// In-memory dialog stack. The top frame is the active dialog; finished children
/// resume their parent with a [`TurnInput::DialogResult`].
#[derive(Debug)]
pub struct DialogStack {
    dialogs: Arc<DialogSet>,
    frames: Vec<RuntimeFrame>,
    frame_counter: u64,
    executing: Vec<u64>,
    pending_resume: BTreeMap<u64, Option<TurnInput>>,
    outbox: Vec<OutgoingMessage>,
    results: Vec<CompletedDialog>,
}

impl DialogStack {
    pub fn new(dialogs: Arc<DialogSet>) -> Self {
        Self {
            dialogs,
            frames: Vec::new(),
            frame_counter: 1,
            executing: Vec::new(),
            pending_resume: BTreeMap::new(),
            outbox: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn from_snapshot(dialogs: Arc<DialogSet>, snapshot: StackSnapshot) -> Result<Self, DialogError> {
        let mut stack = Self::new(dialogs);
        for frame in snapshot.frames {
            if !stack.dialogs.contains(&frame.dialog_id) {
                return Err(DialogError::new(
                    "HOST_DIALOG_NOT_FOUND",
                    format!(
                        "Snapshot references unregistered dialog \"{}\".",
                        frame.dialog_id
                    ),
                ));
            }
            let frame_id = stack.next_frame_id();
            stack.frames.push(RuntimeFrame {
                frame_id,
                dialog_id: frame.dialog_id,
                state: frame.state,
            });
        }
        Ok(stack)
    }

    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            frames: self
                .frames
                .iter()
                .map(|frame| StackFrame {
                    dialog_id: frame.dialog_id.clone(),
                    state: frame.state.clone(),
                })
                .collect(),
        }
    }

    /// Starts `dialog_id` on top of the stack. The returned status describes the
    /// stack after the turn, not the individual dialog.
    pub fn start(&mut self, dialog_id: &str, options: LaunchOptions) -> Result<TurnStatus, DialogError> {
        self.begin_dialog(dialog_id, options)?;
        Ok(self.turn_status())
    }

    pub fn continue_turn(&mut self, activity: &Activity) -> Result<TurnStatus, DialogError> {
        if self.frames.is_empty() {
            return Ok(TurnStatus::Empty);
        }
        self.run_top(|dialog, host, state| dialog.continue_dialog(host, state, activity))?;
        Ok(self.turn_status())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn state_of(&self, dialog_id: &str) -> Option<&SessionState> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.dialog_id == dialog_id)
            .map(|frame| &frame.state)
    }

    pub fn drain_outbox(&mut self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn results(&self) -> &[CompletedDialog] {
        &self.results
    }

    fn turn_status(&self) -> TurnStatus {
        if self.frames.is_empty() {
            TurnStatus::Complete
        } else {
            TurnStatus::Waiting
        }
    }

    fn next_frame_id(&mut self) -> u64 {
        let frame_id = self.frame_counter;
        self.frame_counter += 1;
        frame_id
    }

    fn find_frame_index(&self, frame_id: u64) -> Option<usize> {
        self.frames
            .iter()
            .position(|frame| frame.frame_id == frame_id)
    }

    /// Runs `run` against the top frame, then delivers any parent resume deferred while it
    /// was executing.
    fn run_top<F>(&mut self, run: F) -> Result<TurnStatus, DialogError>
    where
        F: FnOnce(&dyn Dialog, &mut dyn DialogHost, &mut SessionState) -> Result<TurnStatus, DialogError>,
    {
        let Some(frame_id) = self.frames.last().map(|frame| frame.frame_id) else {
            return Ok(TurnStatus::Empty);
        };
        let mut status = self.run_frame(frame_id, run)?;

        while let Some(input) = self.pending_resume.remove(&frame_id) {
            if self.frames.last().map(|frame| frame.frame_id) != Some(frame_id) {
                warn!(frame_id, "dropping child result for a dialog that is no longer active");
                break;
            }
            status = self.run_frame(frame_id, |dialog, host, state| dialog.resume(host, state, input))?;
        }
        Ok(status)
    }

    fn resume_top(&mut self, input: Option<TurnInput>) -> Result<TurnStatus, DialogError> {
        self.run_top(|dialog, host, state| dialog.resume(host, state, input))
    }

    /// Checks out the frame's state, runs `run` against it and writes it back if the frame
    /// survived. A failed run discards whatever resume it deferred.
    fn run_frame<F>(&mut self, frame_id: u64, run: F) -> Result<TurnStatus, DialogError>
    where
        F: FnOnce(&dyn Dialog, &mut dyn DialogHost, &mut SessionState) -> Result<TurnStatus, DialogError>,
    {
        let Some(index) = self.find_frame_index(frame_id) else {
            return Ok(TurnStatus::Empty);
        };
        let mut state = self.frames[index].state.clone();
        let dialog = self.dialogs.find(&self.frames[index].dialog_id)?;

        self.executing.push(frame_id);
        let outcome = run(dialog.as_ref(), &mut *self, &mut state);
        self.executing.pop();

        if let Some(index) = self.find_frame_index(frame_id) {
            self.frames[index].state = state;
        }
        if outcome.is_err() {
            self.pending_resume.remove(&frame_id);
        }
        outcome
    }
}

impl DialogHost for DialogStack {
    fn send(&mut self, message: OutgoingMessage) -> Result<(), DialogError> {
        self.outbox.push(message);
        Ok(())
    }

    fn active_dialog_id(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.dialog_id.as_str())
    }

    fn begin_dialog(&mut self, dialog_id: &str, options: LaunchOptions) -> Result<TurnStatus, DialogError> {
        self.dialogs.find(dialog_id)?;
        let frame_id = self.next_frame_id();
        debug!(dialog = dialog_id, frame_id, depth = self.frames.len(), "beginning dialog");
        self.frames.push(RuntimeFrame {
            frame_id,
            dialog_id: dialog_id.to_string(),
            state: SessionState::new(options),
        });
        self.run_top(|dialog, host, state| dialog.begin(host, state))
    }

    fn replace_dialog(&mut self, dialog_id: &str, options: LaunchOptions) -> Result<TurnStatus, DialogError> {
        self.dialogs.find(dialog_id)?;
        if let Some(frame) = self.frames.pop() {
            debug!(dialog = %frame.dialog_id, replacement = dialog_id, "replacing dialog");
        }
        self.begin_dialog(dialog_id, options)
    }

    fn end_dialog(&mut self, result: Option<DialogResult>) -> Result<TurnStatus, DialogError> {
        let Some(frame) = self.frames.pop() else {
            return Ok(TurnStatus::Complete);
        };
        if let Some(result) = &result {
            self.results.push(CompletedDialog {
                dialog_id: frame.dialog_id.clone(),
                result: result.clone(),
            });
        }

        let Some(parent) = self.frames.last() else {
            return Ok(TurnStatus::Complete);
        };
        let input = result.map(TurnInput::DialogResult);
        if self.executing.contains(&parent.frame_id) {
            self.pending_resume.insert(parent.frame_id, input);
            return Ok(TurnStatus::Waiting);
        }
        self.resume_top(input)
    }

    fn cancel_all_dialogs(&mut self) -> Result<(), DialogError> {
        debug!(depth = self.frames.len(), "cancelling all dialogs");
        self.frames.clear();
        self.pending_resume.clear();
        Ok(())
    }
}
