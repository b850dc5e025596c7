use std::sync::Arc;

use ds_core::{DialogError, DialogResult, DEFAULT_THREAD};
use serde_json::Value;

use crate::convo::Convo;
use crate::engine::{ScriptDialog, ScriptDialogOptions};
use crate::hooks::HookRegistry;
use crate::host::DialogHost;
use crate::script::{Action, Collect, CollectKey, Execute, Handlers, Line, Message, Script};

/// Accumulates threads and hooks; [`DialogBuilder::build`] freezes them.
#[derive(Debug)]
pub struct DialogBuilder {
    id: String,
    script: Script,
    hooks: HookRegistry,
    options: ScriptDialogOptions,
}

impl DialogBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            script: Script::default(),
            hooks: HookRegistry::default(),
            options: ScriptDialogOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScriptDialogOptions) -> Self {
        self.options = options;
        self
    }

    pub fn say(self, message: impl Into<Message>) -> Self {
        self.add_message(message, DEFAULT_THREAD)
    }

    pub fn ask(
        self,
        message: impl Into<Message>,
        handlers: impl Into<Handlers>,
        key: Option<CollectKey>,
    ) -> Self {
        self.add_question(message, handlers, key, DEFAULT_THREAD)
    }

    pub fn add_message(mut self, message: impl Into<Message>, thread: &str) -> Self {
        self.script.push(
            thread,
            Line::Message {
                message: message.into(),
                action: None,
            },
        );
        self
    }

    /// Message line whose content is sent before `action` is dispatched.
    pub fn add_message_then(
        mut self,
        message: impl Into<Message>,
        action: Action,
        thread: &str,
    ) -> Self {
        self.script.push(
            thread,
            Line::Message {
                message: message.into(),
                action: Some(action),
            },
        );
        self
    }

    /// Appends the question and the `next` sentinel that reserves the index where its
    /// handlers are evaluated on resumption.
    pub fn add_question(
        mut self,
        message: impl Into<Message>,
        handlers: impl Into<Handlers>,
        key: Option<CollectKey>,
        thread: &str,
    ) -> Self {
        let collect = collect_for(key, handlers.into());
        self.script.push(
            thread,
            Line::Question {
                message: message.into(),
                collect,
            },
        );
        self.script.push(thread, Line::Next);
        self
    }

    pub fn add_action(mut self, action: Action, thread: &str) -> Self {
        self.script.push(thread, Line::Action(action));
        self
    }

    /// Runs `dialog_id` as a child; its final values are stored under `key`
    /// (or the dialog id) when it completes.
    pub fn add_child_dialog(mut self, dialog_id: &str, key: Option<&str>, thread: &str) -> Self {
        let collect = Collect {
            key: Some(key.unwrap_or(dialog_id).to_string()),
            multiple: false,
            options: Vec::new(),
        };
        self.script.push(
            thread,
            Line::ChildDialog {
                execute: Execute::script(dialog_id),
                collect,
            },
        );
        self.script.push(thread, Line::Next);
        self
    }

    pub fn add_goto_dialog(self, dialog_id: &str, thread: &str) -> Self {
        self.add_action(Action::ExecuteScript(Execute::script(dialog_id)), thread)
    }

    pub fn before<F>(mut self, thread: &str, hook: F) -> Self
    where
        F: Fn(&mut Convo<'_>, &mut dyn DialogHost) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.add_before(thread, Arc::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DialogResult, &mut dyn DialogHost) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.add_after(Arc::new(hook));
        self
    }

    pub fn on_change<F>(mut self, key: &str, hook: F) -> Self
    where
        F: Fn(&Value, &mut Convo<'_>, &mut dyn DialogHost) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.add_change(key, Arc::new(hook));
        self
    }

    pub(crate) fn push_line(&mut self, thread: &str, line: Line) {
        self.script.push(thread, line);
    }

    pub fn build(self) -> ScriptDialog {
        ScriptDialog::new(self.id, self.script, self.hooks, self.options)
    }
}

pub(crate) fn collect_for(key: Option<CollectKey>, handlers: Handlers) -> Collect {
    let (key, multiple) = match key {
        Some(CollectKey { key, multiple }) => (Some(key), multiple),
        None => (None, false),
    };
    Collect {
        key,
        multiple,
        options: handlers.into_options(),
    }
}
