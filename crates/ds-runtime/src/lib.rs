mod builder;
mod convo;
mod engine;
mod hooks;
mod host;
mod loader;
mod script;
mod stack;
mod template;

pub use builder::DialogBuilder;
pub use convo::Convo;
pub use engine::{ScriptDialog, ScriptDialogOptions, DEFAULT_MAX_STEPS_PER_TURN};
pub use hooks::{AfterHook, BeforeHook, ChangeHook, HookRegistry};
pub use host::{Dialog, DialogHost};
pub use loader::{
    load_dialog, parse_dialog, CollectDefinition, DialogDefinition, ExecuteDefinition,
    LineDefinition, TextDefinition,
};
pub use script::{
    Action, Collect, CollectKey, Content, ContentFn, Execute, Handler, HandlerFn, Handlers, Line,
    MatchType, Message, Script, Text, TextFn,
};
pub use stack::{CompletedDialog, DialogSet, DialogStack, StackFrame, StackSnapshot};
pub use template::{render_template, render_value};
