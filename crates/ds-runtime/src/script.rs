use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ds_core::{Activity, DialogError, Vars};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::convo::Convo;
use crate::host::DialogHost;

pub type TextFn = Arc<dyn Fn(&Message, &Vars) -> Result<String, DialogError> + Send + Sync>;
pub type ContentFn = Arc<dyn Fn(&Message, &Vars) -> Result<Value, DialogError> + Send + Sync>;
pub type HandlerFn = Arc<
    dyn Fn(Option<&str>, &mut Convo<'_>, &mut dyn DialogHost, Option<&Activity>) -> Result<(), DialogError>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub enum Text {
    Literal(String),
    Variants(Vec<String>),
    Computed(TextFn),
}

impl Text {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Message, &Vars) -> Result<String, DialogError> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    fn is_present(&self) -> bool {
        match self {
            Self::Literal(text) => !text.is_empty(),
            Self::Variants(_) | Self::Computed(_) => true,
        }
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Variants(variants) => f.debug_tuple("Variants").field(variants).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Clone)]
pub enum Content {
    Literal(Value),
    Computed(ContentFn),
}

impl Content {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Message, &Vars) -> Result<Value, DialogError> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    pub text: Option<Text>,
    pub quick_replies: Option<Content>,
    pub attachments: Option<Content>,
    pub attachment: Option<Content>,
    pub attachment_layout: Option<String>,
    pub blocks: Option<Content>,
    pub channel_data: Map<String, Value>,
    pub kind: Option<String>,
    pub value: Option<Value>,
}

impl Message {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Message, &Vars) -> Result<String, DialogError> + Send + Sync + 'static,
    {
        Self {
            text: Some(Text::computed(f)),
            ..Self::default()
        }
    }

    pub fn variants<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: Some(Text::Variants(variants.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    pub fn has_content(&self) -> bool {
        self.kind.is_some()
            || self.text.as_ref().is_some_and(Text::is_present)
            || self.attachments.is_some()
            || self.attachment.is_some()
            || self.blocks.is_some()
            || !self.channel_data.is_empty()
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::variants([text])
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::variants([text])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    pub script: String,
    pub thread: Option<String>,
}

impl Execute {
    pub fn script(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            thread: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Next,
    Complete,
    Stop,
    Timeout,
    Repeat,
    Wait,
    ExecuteScript(Execute),
    BeginDialog(Execute),
    Thread(String),
}

impl Action {
    pub fn parse(keyword: &str, execute: Option<Execute>) -> Result<Self, DialogError> {
        let action = match keyword {
            "next" => Self::Next,
            "complete" => Self::Complete,
            "stop" => Self::Stop,
            "timeout" => Self::Timeout,
            "repeat" => Self::Repeat,
            "wait" => Self::Wait,
            "execute_script" | "beginDialog" => {
                let Some(execute) = execute else {
                    return Err(DialogError::new(
                        "BUILD_ACTION_EXECUTE_MISSING",
                        format!("Action \"{}\" requires execute.script.", keyword),
                    ));
                };
                if keyword == "beginDialog" {
                    Self::BeginDialog(execute)
                } else {
                    Self::ExecuteScript(execute)
                }
            }
            other => Self::Thread(other.to_string()),
        };
        Ok(action)
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Next => "next",
            Self::Complete => "complete",
            Self::Stop => "stop",
            Self::Timeout => "timeout",
            Self::Repeat => "repeat",
            Self::Wait => "wait",
            Self::ExecuteScript(_) => "execute_script",
            Self::BeginDialog(_) => "beginDialog",
            Self::Thread(name) => name,
        }
    }

    pub fn goto(thread: impl Into<String>) -> Self {
        Self::Thread(thread.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    #[default]
    String,
    Regex,
}

impl MatchType {
    pub fn parse(name: &str) -> Result<Self, DialogError> {
        match name {
            "string" => Ok(Self::String),
            "regex" => Ok(Self::Regex),
            other => Err(DialogError::new(
                "BUILD_HANDLER_TYPE",
                format!("Unsupported handler match type \"{}\".", other),
            )),
        }
    }
}

#[derive(Clone, Default)]
pub struct Handler {
    pattern: Option<String>,
    matcher: Option<Regex>,
    match_type: MatchType,
    default: bool,
    action: Option<Action>,
    callback: Option<HandlerFn>,
}

impl Handler {
    pub fn pattern(pattern: &str) -> Result<Self, DialogError> {
        Self::matching(pattern, MatchType::String)
    }

    pub fn regex(pattern: &str) -> Result<Self, DialogError> {
        Self::matching(pattern, MatchType::Regex)
    }

    /// Both match types compile to a case-insensitive regular expression searched
    /// anywhere in the response.
    pub fn matching(pattern: &str, match_type: MatchType) -> Result<Self, DialogError> {
        let matcher = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|error| {
                DialogError::new(
                    "BUILD_HANDLER_PATTERN",
                    format!("Handler pattern \"{}\" is invalid: {}", pattern, error),
                )
            })?;
        Ok(Self {
            pattern: Some(pattern.to_string()),
            matcher: Some(matcher),
            match_type,
            ..Self::default()
        })
    }

    pub fn fallback() -> Self {
        Self {
            default: true,
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&str>, &mut Convo<'_>, &mut dyn DialogHost, Option<&Activity>) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn pattern_source(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn callback(&self) -> Option<&HandlerFn> {
        self.callback.as_ref()
    }

    pub fn matches(&self, response: &str) -> bool {
        !self.default
            && self
                .matcher
                .as_ref()
                .is_some_and(|matcher| matcher.is_match(response))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("pattern", &self.pattern)
            .field("match_type", &self.match_type)
            .field("default", &self.default)
            .field("action", &self.action)
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .finish()
    }
}

#[derive(Clone)]
pub enum Handlers {
    Callback(HandlerFn),
    Options(Vec<Handler>),
}

impl Handlers {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(Option<&str>, &mut Convo<'_>, &mut dyn DialogHost, Option<&Activity>) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        Self::Callback(Arc::new(callback))
    }

    pub(crate) fn into_options(self) -> Vec<Handler> {
        match self {
            Self::Callback(callback) => vec![Handler {
                default: true,
                callback: Some(callback),
                ..Handler::default()
            }],
            Self::Options(options) => options,
        }
    }
}

impl From<Vec<Handler>> for Handlers {
    fn from(options: Vec<Handler>) -> Self {
        Self::Options(options)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectKey {
    pub key: String,
    pub multiple: bool,
}

impl CollectKey {
    pub fn multiple(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            multiple: true,
        }
    }
}

impl From<&str> for CollectKey {
    fn from(key: &str) -> Self {
        Self {
            key: key.to_string(),
            multiple: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Collect {
    pub key: Option<String>,
    pub multiple: bool,
    pub options: Vec<Handler>,
}

impl Collect {
    /// First matching non-default handler in declaration order, else the first default.
    pub fn select(&self, response: &Value) -> Option<&Handler> {
        let matched = match response {
            Value::String(text) => self.options.iter().find(|option| option.matches(text)),
            _ => None,
        };
        matched.or_else(|| self.options.iter().find(|option| option.is_default()))
    }
}

#[derive(Debug, Clone)]
pub enum Line {
    Message {
        message: Message,
        action: Option<Action>,
    },
    Question {
        message: Message,
        collect: Collect,
    },
    ChildDialog {
        execute: Execute,
        collect: Collect,
    },
    Action(Action),
    Next,
}

impl Line {
    pub fn collect(&self) -> Option<&Collect> {
        match self {
            Self::Question { collect, .. } | Self::ChildDialog { collect, .. } => Some(collect),
            Self::Message { .. } | Self::Action(_) | Self::Next => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    threads: BTreeMap<String, Vec<Line>>,
}

impl Script {
    pub fn thread(&self, name: &str) -> Option<&[Line]> {
        self.threads.get(name).map(Vec::as_slice)
    }

    pub fn has_thread(&self, name: &str) -> bool {
        self.threads.contains_key(name)
    }

    pub(crate) fn push(&mut self, thread: &str, line: Line) {
        self.threads.entry(thread.to_string()).or_default().push(line);
    }
}
