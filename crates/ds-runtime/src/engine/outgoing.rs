use ds_core::{CardAction, DialogError, OutgoingMessage, Vars};
use serde_json::Value;

use super::rng::pick_index;
use crate::script::{Content, Message, Text};
use crate::template::{render_template, render_value};

pub(crate) const CAROUSEL_LAYOUT: &str = "carousel";
pub(crate) const CAROUSEL_SPLIT_THRESHOLD: usize = 4;
pub(crate) const CAROUSEL_MAX_GROUP: usize = 10;

const DELAY_TYPE: &str = "delay";
const DEFAULT_DELAY_MS: u64 = 1000;
const POSTBACK: &str = "postBack";

/// Resolves dynamic fields, then substitutes tokens in every string of the result.
/// Works on copies; the script line is never touched.
pub(crate) fn make_outgoing(
    message: &Message,
    vars: &Vars,
    rng_state: &mut u32,
) -> Result<OutgoingMessage, DialogError> {
    let text = match &message.text {
        None => String::new(),
        Some(Text::Literal(text)) => text.clone(),
        Some(Text::Variants(variants)) if variants.is_empty() => String::new(),
        Some(Text::Variants(variants)) => variants[pick_index(rng_state, variants.len())].clone(),
        Some(Text::Computed(compute)) => compute(message, vars)?,
    };

    let mut outgoing = OutgoingMessage::text(text);
    outgoing.attachment_layout = message.attachment_layout.clone();

    if let Some(quick_replies) = &message.quick_replies {
        let replies = resolve(quick_replies, message, vars)?;
        outgoing.suggested_actions = suggested_actions(&replies);
        outgoing
            .channel_data
            .insert("quick_replies".to_string(), replies);
    }

    if let Some(attachment) = &message.attachment {
        let resolved = resolve(attachment, message, vars)?;
        outgoing
            .channel_data
            .insert("attachment".to_string(), resolved);
    }

    if let Some(attachments) = &message.attachments {
        let resolved = resolve(attachments, message, vars)?;
        if matches!(attachments, Content::Computed(_)) {
            outgoing
                .channel_data
                .insert("attachments".to_string(), resolved.clone());
        }
        outgoing.attachments = Some(into_list(resolved));
    }

    if let Some(blocks) = &message.blocks {
        let resolved = resolve(blocks, message, vars)?;
        outgoing.channel_data.insert("blocks".to_string(), resolved);
    }

    if let Some(kind) = &message.kind {
        if kind == DELAY_TYPE {
            outgoing.value = Some(match &message.value {
                Some(Value::Number(delay)) => Value::Number(delay.clone()),
                _ => Value::from(DEFAULT_DELAY_MS),
            });
        }
        outgoing.kind = kind.clone();
    }

    for (key, value) in &message.channel_data {
        outgoing.channel_data.insert(key.clone(), value.clone());
    }

    Ok(substitute_tokens(outgoing, vars))
}

/// Splits large carousels into groups of `ceil(sqrt(n))` attachments.
pub(crate) fn split_carousel(outgoing: OutgoingMessage) -> Vec<OutgoingMessage> {
    let is_carousel = outgoing.attachment_layout.as_deref() == Some(CAROUSEL_LAYOUT);
    let count = outgoing.attachments.as_ref().map(Vec::len).unwrap_or(0);
    if !is_carousel || count < CAROUSEL_SPLIT_THRESHOLD {
        return vec![outgoing];
    }

    let mut group = 1usize;
    while group * group < count {
        group += 1;
    }
    let group = group.min(CAROUSEL_MAX_GROUP);

    let attachments = outgoing.attachments.clone().unwrap_or_default();
    attachments
        .chunks(group)
        .map(|chunk| OutgoingMessage {
            attachments: Some(chunk.to_vec()),
            ..outgoing.clone()
        })
        .collect()
}

fn resolve(content: &Content, message: &Message, vars: &Vars) -> Result<Value, DialogError> {
    match content {
        Content::Literal(value) => Ok(value.clone()),
        Content::Computed(compute) => compute(message, vars),
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn suggested_actions(replies: &Value) -> Vec<CardAction> {
    let Some(replies) = replies.as_array() else {
        return Vec::new();
    };
    replies
        .iter()
        .map(|reply| {
            let title = reply.get("title").cloned().unwrap_or(Value::Null);
            let payload = reply.get("payload").cloned().unwrap_or(Value::Null);
            CardAction {
                action_type: POSTBACK.to_string(),
                title: title.clone(),
                text: payload.clone(),
                display_text: title,
                value: payload,
            }
        })
        .collect()
}

fn substitute_tokens(outgoing: OutgoingMessage, vars: &Vars) -> OutgoingMessage {
    OutgoingMessage {
        text: render_template(&outgoing.text, vars),
        attachments: outgoing.attachments.map(|items| {
            items
                .iter()
                .map(|item| render_value(item, vars))
                .collect()
        }),
        suggested_actions: outgoing
            .suggested_actions
            .iter()
            .map(|action| CardAction {
                action_type: action.action_type.clone(),
                title: render_value(&action.title, vars),
                text: render_value(&action.text, vars),
                display_text: render_value(&action.display_text, vars),
                value: render_value(&action.value, vars),
            })
            .collect(),
        channel_data: outgoing
            .channel_data
            .iter()
            .map(|(key, value)| (key.clone(), render_value(value, vars)))
            .collect(),
        ..outgoing
    }
}
