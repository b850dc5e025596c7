use ds_core::{Activity, DialogError, DialogStatus, SessionState, TurnInput, TurnStatus};

use super::rng::clock_seed;
use super::ScriptDialog;
use crate::host::{Dialog, DialogHost};

impl Dialog for ScriptDialog {
    fn id(&self) -> &str {
        &self.id
    }

    fn begin(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
    ) -> Result<TurnStatus, DialogError> {
        state.values = state.options.values.clone();
        state.status = DialogStatus::Running;
        state.rng_state = self.options.random_seed.unwrap_or_else(clock_seed);
        let thread = state.thread.clone();
        self.run_step(host, state, thread, 0, None)
    }

    /// Only message activities advance the script; anything else leaves it waiting.
    fn continue_dialog(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        activity: &Activity,
    ) -> Result<TurnStatus, DialogError> {
        if !activity.is_message() {
            return Ok(TurnStatus::Waiting);
        }
        self.resume(host, state, Some(TurnInput::Message(activity.clone())))
    }

    fn resume(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        input: Option<TurnInput>,
    ) -> Result<TurnStatus, DialogError> {
        let thread = state.thread.clone();
        let index = state
            .resume_index
            .take()
            .unwrap_or(state.step_index + 1);
        self.run_step(host, state, thread, index, input)
    }
}
