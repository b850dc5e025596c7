use ds_core::{DialogError, DialogResult, DialogStatus, LaunchOptions, LineLocation, SessionState, TurnStatus};
use serde_json::Value;
use tracing::{debug, warn};

use super::step::{Flow, Step};
use super::ScriptDialog;
use crate::convo::Convo;
use crate::host::DialogHost;
use crate::script::{Action, Execute, Handler};

impl ScriptDialog {
    /// Runs the selected handler. `None` lets the step continue with the current line.
    pub(super) fn run_handler(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        step: &mut Step,
        handler: &Handler,
    ) -> Result<Option<Flow>, DialogError> {
        let Some(callback) = handler.callback() else {
            return match handler.action() {
                Some(action) => self.dispatch_action(host, state, step, action),
                None => Ok(None),
            };
        };

        let origin = step.cursor.clone();
        let active = host.active_dialog_id().map(str::to_string);
        {
            let response = step.response.as_ref().and_then(Value::as_str);
            let activity = step.input.as_ref().and_then(|input| input.activity());
            let mut convo = Convo::new(&mut step.cursor, &mut state.values);
            callback(response, &mut convo, host, activity)?;
        }

        let Some(current) = host.active_dialog_id() else {
            return Ok(None);
        };
        if Some(current) != active.as_deref() {
            debug!(dialog = %self.id, active = current, "handler handed the turn to another dialog");
            return Ok(Some(Flow::Yield(TurnStatus::Waiting)));
        }
        if step.cursor != origin {
            return Ok(Some(Flow::Jump(step.cursor.clone())));
        }
        Ok(None)
    }

    pub(super) fn dispatch_action(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        step: &Step,
        action: &Action,
    ) -> Result<Option<Flow>, DialogError> {
        debug!(dialog = %self.id, action = action.keyword(), "dispatching action");
        let flow = match action {
            Action::Next => return Ok(None),
            Action::Complete => self.finish(host, state, DialogStatus::Completed)?,
            Action::Stop => self.finish(host, state, DialogStatus::Canceled)?,
            Action::Timeout => self.finish(host, state, DialogStatus::TimedOut)?,
            Action::ExecuteScript(execute) => {
                host.replace_dialog(&execute.script, launch_options(execute, state))?;
                Flow::Yield(TurnStatus::Waiting)
            }
            Action::BeginDialog(execute) => {
                host.begin_dialog(&execute.script, launch_options(execute, state))?;
                Flow::Yield(TurnStatus::Waiting)
            }
            Action::Repeat => Flow::Jump(LineLocation::new(
                step.cursor.thread.clone(),
                step.cursor.index.saturating_sub(1),
            )),
            Action::Wait => {
                state.resume_index = Some(step.cursor.index);
                Flow::Yield(TurnStatus::Waiting)
            }
            Action::Thread(name) if self.script.has_thread(name) => {
                Flow::Jump(LineLocation::new(name.clone(), 0))
            }
            Action::Thread(name) => {
                warn!(dialog = %self.id, action = %name, "unrecognized action, continuing");
                return Ok(None);
            }
        };
        Ok(Some(flow))
    }

    fn finish(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        status: DialogStatus,
    ) -> Result<Flow, DialogError> {
        state.status = status;
        self.end(host, state)
    }

    /// Hands the final values to the host and runs the after hooks. When the dialog was
    /// already removed from the stack the host is only told to pop whatever is left.
    pub(super) fn end(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
    ) -> Result<Flow, DialogError> {
        if state.status == DialogStatus::Running {
            state.status = DialogStatus::Completed;
        }
        if host.active_dialog_id().is_some() {
            let result = DialogResult {
                status: state.status,
                values: state.values.clone(),
            };
            debug!(dialog = %self.id, status = ?result.status, "dialog ended");
            host.end_dialog(Some(result.clone()))?;
            self.hooks.run_after(&self.id, &result, host)?;
        } else {
            host.end_dialog(None)?;
        }
        Ok(Flow::Yield(TurnStatus::Complete))
    }
}

fn launch_options(execute: &Execute, state: &SessionState) -> LaunchOptions {
    LaunchOptions {
        thread: execute.thread.clone(),
        channel: state.options.channel.clone(),
        values: state.values.clone(),
    }
}
