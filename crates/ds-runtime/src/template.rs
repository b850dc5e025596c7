use std::sync::OnceLock;

use ds_core::{value_to_text, Vars};
use regex::Regex;
use serde_json::Value;

const CONTEXT_ROOT: &str = "vars";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"\{\{\{\s*([\w.\-]+)\s*\}\}\}|\{\{\s*(&\s*)?([\w.\-]+)\s*\}\}")
            .expect("token regex must compile")
    })
}

/// Substitutes `{{vars.path}}` (escaped), `{{{vars.path}}}` and `{{& vars.path}}` (raw)
/// against `{ vars: bindings }`. Unknown paths render empty; other tags stay as written.
pub fn render_template(template: &str, vars: &Vars) -> String {
    let mut output = String::with_capacity(template.len());
    let mut last_index = 0usize;
    for captures in token_regex().captures_iter(template) {
        let full = captures
            .get(0)
            .expect("capture group 0 must exist for each regex capture");
        let (path, raw) = match captures.get(1) {
            Some(path) => (path.as_str(), true),
            None => (
                captures
                    .get(3)
                    .expect("variable tag must capture a path")
                    .as_str(),
                captures.get(2).is_some(),
            ),
        };

        output.push_str(&template[last_index..full.start()]);
        let text = lookup(path, vars).map(value_to_text).unwrap_or_default();
        if raw {
            output.push_str(&text);
        } else {
            output.push_str(&escape_html(&text));
        }
        last_index = full.end();
    }
    output.push_str(&template[last_index..]);
    output
}

/// Returns a copy of `value` with every nested string rendered.
pub fn render_value(value: &Value, vars: &Vars) -> Value {
    match value {
        Value::String(text) => Value::String(render_template(text, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|item| render_value(item, vars)).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, item)| (key.clone(), render_value(item, vars)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

fn lookup<'v>(path: &str, vars: &'v Vars) -> Option<&'v Value> {
    let mut segments = path.split('.');
    if segments.next() != Some(CONTEXT_ROOT) {
        return None;
    }
    let mut current = vars.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(fields) => fields.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            '`' => escaped.push_str("&#x60;"),
            '=' => escaped.push_str("&#x3D;"),
            other => escaped.push(other),
        }
    }
    escaped
}
