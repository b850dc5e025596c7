use std::collections::BTreeMap;

use ds_core::DialogError;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::builder::{collect_for, DialogBuilder};
use crate::engine::{ScriptDialog, ScriptDialogOptions};
use crate::script::{Action, CollectKey, Content, Execute, Handler, Handlers, Line, MatchType, Message, Text};

#[derive(Debug, Clone, Deserialize)]
pub struct DialogDefinition {
    pub id: String,
    pub threads: BTreeMap<String, Vec<LineDefinition>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineDefinition {
    #[serde(default)]
    pub text: Option<TextDefinition>,
    #[serde(default)]
    pub quick_replies: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
    #[serde(default)]
    pub attachment: Option<Value>,
    #[serde(default, rename = "attachmentLayout")]
    pub attachment_layout: Option<String>,
    #[serde(default)]
    pub blocks: Option<Value>,
    #[serde(default, rename = "channelData")]
    pub channel_data: Option<Map<String, Value>>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub execute: Option<ExecuteDefinition>,
    #[serde(default)]
    pub collect: Option<CollectDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextDefinition {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteDefinition {
    pub script: String,
    #[serde(default)]
    pub thread: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectDefinition {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HandlerDefinition {
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default, rename = "type")]
    match_type: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    execute: Option<ExecuteDefinition>,
}

pub fn parse_dialog(source: &str) -> Result<DialogDefinition, DialogError> {
    serde_json::from_str(source).map_err(|error| {
        DialogError::new(
            "BUILD_SCRIPT_INVALID",
            format!("Dialog definition is not valid JSON: {}", error),
        )
    })
}

pub fn load_dialog(source: &str, options: ScriptDialogOptions) -> Result<ScriptDialog, DialogError> {
    parse_dialog(source)?.into_dialog(options)
}

impl DialogDefinition {
    pub fn into_dialog(self, options: ScriptDialogOptions) -> Result<ScriptDialog, DialogError> {
        let mut builder = DialogBuilder::new(self.id.as_str()).with_options(options);
        for (thread, lines) in self.threads {
            for (index, line) in lines.into_iter().enumerate() {
                builder = push_definition(builder, &thread, line).map_err(|error| {
                    DialogError::new(
                        error.code,
                        format!("{} ({}/{}[{}])", error.message, self.id, thread, index),
                    )
                })?;
            }
        }
        Ok(builder.build())
    }
}

fn push_definition(
    mut builder: DialogBuilder,
    thread: &str,
    line: LineDefinition,
) -> Result<DialogBuilder, DialogError> {
    let action = match line.action.as_deref() {
        Some(keyword) => Some(Action::parse(keyword, line.execute.clone().map(to_execute))?),
        None => None,
    };

    if let Some(collect) = line.collect.clone() {
        let handlers = Handlers::Options(parse_handlers(collect.options)?);
        if let Some(Action::BeginDialog(execute)) = action {
            let key = collect.key.unwrap_or_else(|| execute.script.clone());
            let collect = collect_for(Some(CollectKey::from(key.as_str())), handlers);
            builder.push_line(thread, Line::ChildDialog { execute, collect });
            builder.push_line(thread, Line::Next);
            return Ok(builder);
        }

        let key = collect.key.map(|key| CollectKey {
            key,
            multiple: collect.multiple,
        });
        return Ok(builder.add_question(to_message(line), handlers, key, thread));
    }

    let message = to_message(line);
    let line = match action {
        Some(action) if !message.has_content() => Line::Action(action),
        action => Line::Message { message, action },
    };
    builder.push_line(thread, line);
    Ok(builder)
}

fn parse_handlers(options: Option<Value>) -> Result<Vec<Handler>, DialogError> {
    let entries = match options {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(DialogError::new(
                "BUILD_UNSUPPORTED_HANDLER",
                "Unsupported option type: collect.options must be a list of handlers.",
            ))
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            let definition: HandlerDefinition = serde_json::from_value(entry).map_err(|error| {
                DialogError::new(
                    "BUILD_SCRIPT_INVALID",
                    format!("Handler definition is invalid: {}", error),
                )
            })?;
            to_handler(definition)
        })
        .collect()
}

fn to_handler(definition: HandlerDefinition) -> Result<Handler, DialogError> {
    let handler = if definition.default {
        Handler::fallback()
    } else {
        let Some(pattern) = definition.pattern.as_deref() else {
            return Err(DialogError::new(
                "BUILD_SCRIPT_INVALID",
                "Handlers must declare a pattern unless they are the default.",
            ));
        };
        let match_type = match definition.match_type.as_deref() {
            Some(name) => MatchType::parse(name)?,
            None => MatchType::String,
        };
        Handler::matching(pattern, match_type)?
    };

    let Some(keyword) = definition.action.as_deref() else {
        return Ok(handler);
    };
    let action = Action::parse(keyword, definition.execute.map(to_execute))?;
    Ok(handler.with_action(action))
}

fn to_execute(definition: ExecuteDefinition) -> Execute {
    Execute {
        script: definition.script,
        thread: definition.thread,
    }
}

fn to_message(line: LineDefinition) -> Message {
    Message {
        text: line.text.map(|text| match text {
            TextDefinition::One(text) => Text::Literal(text),
            TextDefinition::Many(variants) => Text::Variants(variants),
        }),
        quick_replies: line.quick_replies.map(Content::Literal),
        attachments: line.attachments.map(Content::Literal),
        attachment: line.attachment.map(Content::Literal),
        attachment_layout: line.attachment_layout,
        blocks: line.blocks.map(Content::Literal),
        channel_data: line.channel_data.unwrap_or_default(),
        kind: line.kind,
        value: line.value,
    }
}
