use serde_json::Value;

use crate::error::DialogError;
use crate::types::{is_truthy, value_to_text, Activity};

/// Conversation address field that never takes part in the key.
pub const EXCLUDED_ADDRESS_FIELD: &str = "properties";

/// Derives `<channel>/conversations/<sorted address values>-<from>/<namespace>`.
///
/// Every address field except [`EXCLUDED_ADDRESS_FIELD`] contributes, ordered by field
/// name, so two parties (or two sub-threads) sharing a nominal conversation id still
/// land on different keys.
pub fn conversation_storage_key(
    activity: &Activity,
    namespace: &str,
) -> Result<String, DialogError> {
    let has_conversation_id = activity.conversation.get("id").is_some_and(is_truthy);
    if !has_conversation_id {
        return Err(DialogError::new(
            "KEY_CONVERSATION_MISSING",
            "Activity is missing conversation.id.",
        ));
    }

    if activity.channel_id.is_empty() {
        return Err(DialogError::new(
            "KEY_CHANNEL_MISSING",
            "Activity is missing channelId.",
        ));
    }

    let mut field_names = activity
        .conversation
        .keys()
        .filter(|name| name.as_str() != EXCLUDED_ADDRESS_FIELD)
        .collect::<Vec<_>>();
    field_names.sort();

    let mut parts = field_names
        .into_iter()
        .filter_map(|name| activity.conversation.get(name))
        .filter(|value| !matches!(value, Value::Null))
        .map(value_to_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    parts.push(activity.from.id.clone());

    Ok(format!(
        "{}/conversations/{}/{}",
        activity.channel_id,
        parts.join("-"),
        namespace
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationKeyDeriver {
    namespace: String,
}

impl ConversationKeyDeriver {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage_key(&self, activity: &Activity) -> Result<String, DialogError> {
        conversation_storage_key(activity, &self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn activity_with(fields: Value, from: &str) -> Activity {
        let mut activity = Activity::message("slack", "ignored", from, "hi");
        activity.conversation = fields.as_object().cloned().unwrap_or_default();
        activity
    }

    #[test]
    fn sorts_fields_and_appends_sender() {
        let activity = activity_with(
            json!({"thread_ts": "171.2", "id": "C42", "team": "T1"}),
            "U7",
        );
        let key = conversation_storage_key(&activity, "ns").expect("key");
        assert_eq!(key, "slack/conversations/C42-T1-171.2-U7/ns");
    }

    #[test]
    fn skips_properties_and_empty_values() {
        let activity = activity_with(
            json!({"id": "C1", "properties": {"x": 1}, "name": "", "tenant": null, "isGroup": true}),
            "U1",
        );
        let key = conversation_storage_key(&activity, "").expect("key");
        assert_eq!(key, "slack/conversations/C1-true-U1/");
    }

    #[test]
    fn missing_conversation_id_fails() {
        let activity = activity_with(json!({"team": "T1"}), "U1");
        let error = conversation_storage_key(&activity, "").expect_err("should fail");
        assert_eq!(error.code, "KEY_CONVERSATION_MISSING");
    }

    #[test]
    fn falsy_conversation_id_fails() {
        for id in [json!(""), json!(0), json!(false)] {
            let activity = activity_with(json!({ "id": id }), "U1");
            let error = conversation_storage_key(&activity, "").expect_err("should fail");
            assert_eq!(error.code, "KEY_CONVERSATION_MISSING");
        }
    }

    #[test]
    fn missing_channel_fails() {
        let mut activity = activity_with(json!({"id": "C1"}), "U1");
        activity.channel_id = String::new();
        let error = conversation_storage_key(&activity, "").expect_err("should fail");
        assert_eq!(error.code, "KEY_CHANNEL_MISSING");
    }

    #[test]
    fn deriver_uses_its_namespace() {
        let deriver = ConversationKeyDeriver::new("dialogState");
        let activity = activity_with(json!({"id": "C1"}), "U1");
        assert_eq!(deriver.namespace(), "dialogState");
        assert_eq!(
            deriver.storage_key(&activity).expect("key"),
            "slack/conversations/C1-U1/dialogState"
        );
    }

    proptest! {
        #[test]
        fn identical_addresses_yield_identical_keys(
            id in "[A-Za-z0-9]{1,12}",
            thread in "[a-z0-9.]{0,8}",
            from in "[A-Za-z0-9]{1,8}",
        ) {
            let first = activity_with(json!({"id": id.clone(), "thread": thread.clone()}), &from);
            let second = activity_with(json!({"thread": thread, "id": id}), &from);
            prop_assert_eq!(
                conversation_storage_key(&first, "ns").expect("key"),
                conversation_storage_key(&second, "ns").expect("key")
            );
        }

        #[test]
        fn different_senders_are_isolated(
            id in "[A-Za-z0-9]{1,12}",
            from_a in "[A-Za-z0-9]{1,8}",
            from_b in "[A-Za-z0-9]{1,8}",
        ) {
            prop_assume!(from_a != from_b);
            let first = activity_with(json!({"id": id.clone()}), &from_a);
            let second = activity_with(json!({"id": id}), &from_b);
            prop_assert_ne!(
                conversation_storage_key(&first, "ns").expect("key"),
                conversation_storage_key(&second, "ns").expect("key")
            );
        }
    }
}
