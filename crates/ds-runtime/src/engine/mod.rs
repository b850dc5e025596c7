mod dispatch;
mod lifecycle;
pub(crate) mod outgoing;
pub(crate) mod rng;
mod step;

use crate::hooks::HookRegistry;
use crate::script::Script;

pub const DEFAULT_MAX_STEPS_PER_TURN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDialogOptions {
    pub random_seed: Option<u32>,
    pub max_steps_per_turn: usize,
    /// Sent to the user when a question cannot be prompted and the dialog moves on.
    pub prompt_failure_message: Option<String>,
}

impl Default for ScriptDialogOptions {
    fn default() -> Self {
        Self {
            random_seed: None,
            max_steps_per_turn: DEFAULT_MAX_STEPS_PER_TURN,
            prompt_failure_message: None,
        }
    }
}

/// A frozen script plus its hooks. One instance serves every session of the dialog;
/// per-session progress lives in [`ds_core::SessionState`].
#[derive(Debug, Clone)]
pub struct ScriptDialog {
    id: String,
    script: Script,
    hooks: HookRegistry,
    options: ScriptDialogOptions,
}

impl ScriptDialog {
    pub(crate) fn new(
        id: String,
        script: Script,
        hooks: HookRegistry,
        options: ScriptDialogOptions,
    ) -> Self {
        Self {
            id,
            script,
            hooks,
            options,
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn options(&self) -> &ScriptDialogOptions {
        &self.options
    }
}
