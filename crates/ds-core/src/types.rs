use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_THREAD: &str = "default";
pub const MESSAGE_ACTIVITY: &str = "message";

pub type Vars = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineLocation {
    pub thread: String,
    pub index: usize,
}

impl LineLocation {
    pub fn new(thread: impl Into<String>, index: usize) -> Self {
        Self {
            thread: thread.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogStatus {
    Running,
    Completed,
    Canceled,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnStatus {
    Waiting,
    Complete,
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub values: Vars,
}

impl LaunchOptions {
    pub fn on_thread(thread: impl Into<String>) -> Self {
        Self {
            thread: Some(thread.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub thread: String,
    pub step_index: usize,
    /// Index to run on the next resume instead of `step_index + 1`. Set by `wait`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_index: Option<usize>,
    pub values: Vars,
    pub status: DialogStatus,
    pub options: LaunchOptions,
    pub rng_state: u32,
}

impl SessionState {
    pub fn new(options: LaunchOptions) -> Self {
        Self {
            thread: options
                .thread
                .clone()
                .unwrap_or_else(|| DEFAULT_THREAD.to_string()),
            step_index: 0,
            resume_index: None,
            values: options.values.clone(),
            status: DialogStatus::Running,
            options,
            rng_state: 0,
        }
    }

    pub fn location(&self) -> LineLocation {
        LineLocation::new(self.thread.clone(), self.step_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResult {
    pub status: DialogStatus,
    pub values: Vars,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub channel_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    pub from: ChannelAccount,
    #[serde(default)]
    pub conversation: Map<String, Value>,
}

impl Activity {
    pub fn message(
        channel_id: impl Into<String>,
        conversation_id: impl Into<String>,
        from_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut conversation = Map::new();
        conversation.insert("id".to_string(), Value::String(conversation_id.into()));
        Self {
            activity_type: MESSAGE_ACTIVITY.to_string(),
            channel_id: channel_id.into(),
            text: Some(text.into()),
            value: None,
            from: ChannelAccount {
                id: from_id.into(),
                name: None,
            },
            conversation,
        }
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == MESSAGE_ACTIVITY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    Message(Activity),
    DialogResult(DialogResult),
}

impl TurnInput {
    /// Textual value of the turn: message text, falling back to the message `value`,
    /// or the child's captured values as an object. Empty answers yield `None`.
    pub fn response(&self) -> Option<Value> {
        let value = match self {
            Self::Message(activity) => match activity.text.as_deref() {
                Some(text) if !text.is_empty() => Value::String(text.to_string()),
                _ => activity.value.clone()?,
            },
            Self::DialogResult(result) => Value::Object(
                result
                    .values
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
        };
        is_truthy(&value).then_some(value)
    }

    pub fn activity(&self) -> Option<&Activity> {
        match self {
            Self::Message(activity) => Some(activity),
            Self::DialogResult(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: Value,
    pub text: Value,
    pub display_text: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<CardAction>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub channel_data: Map<String, Value>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: MESSAGE_ACTIVITY.to_string(),
            text: text.into(),
            value: None,
            attachment_layout: None,
            attachments: None,
            suggested_actions: Vec::new(),
            channel_data: Map::new(),
        }
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}
