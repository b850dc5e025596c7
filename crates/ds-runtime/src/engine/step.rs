use ds_core::{
    is_truthy, value_to_text, DialogError, LineLocation, OutgoingMessage, SessionState, TurnInput,
    TurnStatus, Vars,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::outgoing::{make_outgoing, split_carousel};
use super::ScriptDialog;
use crate::convo::Convo;
use crate::host::DialogHost;
use crate::script::{Action, Line, Message};

pub(super) enum Flow {
    Yield(TurnStatus),
    Jump(LineLocation),
    Advance,
}

pub(super) struct Step {
    pub(super) cursor: LineLocation,
    pub(super) input: Option<TurnInput>,
    pub(super) response: Option<Value>,
}

impl Step {
    fn new(cursor: LineLocation, input: Option<TurnInput>) -> Self {
        let response = input.as_ref().and_then(TurnInput::response);
        Self {
            cursor,
            input,
            response,
        }
    }
}

impl ScriptDialog {
    /// Drives the session from `thread[index]` until a prompt, a wait, a hand-off or the
    /// end of the dialog. Redirects restart the loop at the new location.
    pub(super) fn run_step(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        thread: String,
        index: usize,
        input: Option<TurnInput>,
    ) -> Result<TurnStatus, DialogError> {
        let mut cursor = LineLocation::new(thread, index);
        let mut input = input;

        for _ in 0..self.options.max_steps_per_turn {
            state.thread = cursor.thread.clone();
            state.step_index = cursor.index;

            let lines = self.script.thread(&cursor.thread).ok_or_else(|| {
                DialogError::at(
                    "DIALOG_THREAD_NOT_FOUND",
                    format!(
                        "Thread \"{}\" not found in dialog \"{}\".",
                        cursor.thread, self.id
                    ),
                    cursor.clone(),
                )
            })?;
            let mut step = Step::new(cursor.clone(), input.take());

            if cursor.index == 0 {
                debug!(dialog = %self.id, thread = %cursor.thread, "entering thread");
                let mut convo = Convo::new(&mut step.cursor, &mut state.values);
                self.hooks
                    .run_before(&self.id, &cursor.thread, &mut convo, host)?;
                if step.cursor != cursor {
                    cursor = step.cursor;
                    continue;
                }
            }

            match self.on_step(host, state, lines, &mut step)? {
                Flow::Yield(status) => return Ok(status),
                Flow::Jump(next) => cursor = next,
                Flow::Advance => {
                    cursor = LineLocation::new(state.thread.clone(), state.step_index + 1);
                }
            }
        }

        Err(DialogError::at(
            "DIALOG_STEP_GUARD",
            format!(
                "Dialog \"{}\" exceeded {} steps in a single turn.",
                self.id, self.options.max_steps_per_turn
            ),
            state.location(),
        ))
    }

    fn on_step(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        lines: &[Line],
        step: &mut Step,
    ) -> Result<Flow, DialogError> {
        let previous = step
            .cursor
            .index
            .checked_sub(1)
            .and_then(|index| lines.get(index));

        if let (Some(response), Some(collect)) =
            (step.response.clone(), previous.and_then(Line::collect))
        {
            if let Some(key) = &collect.key {
                let origin = step.cursor.clone();
                capture(&mut state.values, key, &response, collect.multiple);
                let mut convo = Convo::new(&mut step.cursor, &mut state.values);
                self.hooks
                    .run_change(&self.id, key, &response, &mut convo, host)?;
                if step.cursor != origin {
                    return Ok(Flow::Jump(step.cursor.clone()));
                }
            }

            if let Some(handler) = collect.select(&response) {
                if let Some(flow) = self.run_handler(host, state, step, handler)? {
                    return Ok(flow);
                }
            }
        }

        if host.active_dialog_id().is_none() {
            return self.end(host, state);
        }

        let Some(line) = lines.get(step.cursor.index) else {
            return self.end(host, state);
        };

        match line {
            Line::Question { message, .. } => Ok(self.prompt(host, state, message)),
            Line::Message { message, action } => {
                if message.has_content() {
                    self.emit(host, state, message)?;
                } else if action.is_none() {
                    warn!(
                        dialog = %self.id,
                        thread = %step.cursor.thread,
                        index = step.cursor.index,
                        "dialog contains a line with no content and no action"
                    );
                }
                self.follow(host, state, step, action.as_ref())
            }
            Line::Action(action) => self.follow(host, state, step, Some(action)),
            Line::ChildDialog { execute, .. } => {
                let action = Action::BeginDialog(execute.clone());
                self.follow(host, state, step, Some(&action))
            }
            Line::Next => Ok(Flow::Advance),
        }
    }

    fn follow(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        step: &Step,
        action: Option<&Action>,
    ) -> Result<Flow, DialogError> {
        if let Some(action) = action {
            if let Some(flow) = self.dispatch_action(host, state, step, action)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Advance)
    }

    /// A prompt that cannot be composed or sent is skipped so the conversation keeps moving.
    fn prompt(&self, host: &mut dyn DialogHost, state: &mut SessionState, message: &Message) -> Flow {
        let sent = make_outgoing(message, &state.values, &mut state.rng_state)
            .and_then(|outgoing| host.send(outgoing));
        match sent {
            Ok(()) => Flow::Yield(TurnStatus::Waiting),
            Err(error) => {
                warn!(
                    dialog = %self.id,
                    thread = %state.thread,
                    index = state.step_index,
                    %error,
                    "failed to start prompt"
                );
                if let Some(text) = &self.options.prompt_failure_message {
                    if let Err(error) = host.send(OutgoingMessage::text(text.as_str())) {
                        warn!(dialog = %self.id, %error, "failed to send prompt failure notice");
                    }
                }
                Flow::Advance
            }
        }
    }

    fn emit(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        message: &Message,
    ) -> Result<(), DialogError> {
        let outgoing = make_outgoing(message, &state.values, &mut state.rng_state)?;
        for part in split_carousel(outgoing) {
            host.send(part)?;
        }
        Ok(())
    }
}

fn capture(values: &mut Vars, key: &str, response: &Value, multiple: bool) {
    let captured = match values.get(key) {
        Some(previous) if multiple && is_truthy(previous) => Value::String(format!(
            "{}\n{}",
            value_to_text(previous),
            value_to_text(response)
        )),
        _ => response.clone(),
    };
    values.insert(key.to_string(), captured);
}

#[cfg(test)]
mod capture_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multiple_answers_are_joined_by_newline() {
        let mut values = Vars::new();
        capture(&mut values, "notes", &json!("first"), true);
        capture(&mut values, "notes", &json!("second"), true);
        assert_eq!(values.get("notes"), Some(&json!("first\nsecond")));
    }

    #[test]
    fn single_answers_overwrite() {
        let mut values = Vars::new();
        capture(&mut values, "name", &json!("Ada"), false);
        capture(&mut values, "name", &json!("Grace"), false);
        assert_eq!(values.get("name"), Some(&json!("Grace")));
    }
}
