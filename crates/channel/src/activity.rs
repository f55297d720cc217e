use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Message,
    ConversationUpdate,
    #[serde(other)]
    Unsupported,
}

impl Default for ActivityType {
    fn default() -> Self {
        Self::Unsupported
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    pub id: String,
}

/// One channel activity, inbound or outbound. Only the fields the turn
/// pipeline reads are modeled; unknown wire fields are ignored on the way in
/// and `None` fields are omitted on the way out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
}

impl Activity {
    /// Builds a plain-text reply addressed back to the sender of `self`,
    /// within the same conversation and service URL.
    pub fn reply_text(&self, text: impl Into<String>) -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            service_url: self.service_url.clone(),
            channel_id: self.channel_id.clone(),
            from: self.recipient.clone(),
            recipient: self.from.clone(),
            conversation: self.conversation.clone(),
            reply_to_id: self.id.clone(),
            ..Activity::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityType, ChannelAccount, ConversationAccount};

    fn inbound_message() -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            id: Some("act-1".to_string()),
            text: Some("Qual o horário?".to_string()),
            service_url: Some("https://channel.example.net".to_string()),
            channel_id: Some("emulator".to_string()),
            from: Some(ChannelAccount { id: "user-7".to_string(), name: Some("Ana".to_string()) }),
            recipient: Some(ChannelAccount { id: "bot-1".to_string(), name: None }),
            conversation: Some(ConversationAccount { id: "conv-42".to_string() }),
            ..Activity::default()
        }
    }

    #[test]
    fn deserializes_camel_case_wire_format() {
        let raw = r#"{
            "type": "conversationUpdate",
            "serviceUrl": "https://channel.example.net",
            "channelId": "emulator",
            "membersAdded": [{"id": "user-7"}, {"id": "bot-1"}],
            "recipient": {"id": "bot-1"},
            "conversation": {"id": "conv-42"},
            "somethingUnknown": 1
        }"#;

        let activity: Activity = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(activity.activity_type, ActivityType::ConversationUpdate);
        assert_eq!(activity.members_added.len(), 2);
        assert_eq!(activity.service_url.as_deref(), Some("https://channel.example.net"));
    }

    #[test]
    fn unknown_activity_types_map_to_unsupported() {
        let activity: Activity =
            serde_json::from_str(r#"{"type": "typing"}"#).expect("deserialize");
        assert_eq!(activity.activity_type, ActivityType::Unsupported);
    }

    #[test]
    fn reply_swaps_sender_and_recipient_within_the_conversation() {
        let inbound = inbound_message();
        let reply = inbound.reply_text("resposta");

        assert_eq!(reply.activity_type, ActivityType::Message);
        assert_eq!(reply.text.as_deref(), Some("resposta"));
        assert_eq!(reply.from.as_ref().map(|account| account.id.as_str()), Some("bot-1"));
        assert_eq!(reply.recipient.as_ref().map(|account| account.id.as_str()), Some("user-7"));
        assert_eq!(reply.conversation.as_ref().map(|c| c.id.as_str()), Some("conv-42"));
        assert_eq!(reply.reply_to_id.as_deref(), Some("act-1"));
        assert_eq!(reply.service_url, inbound.service_url);
    }

    #[test]
    fn serialized_reply_omits_empty_fields_and_uses_wire_names() {
        let reply = inbound_message().reply_text("ok");
        let value = serde_json::to_value(&reply).expect("serialize");

        assert_eq!(value["type"], "message");
        assert_eq!(value["serviceUrl"], "https://channel.example.net");
        assert_eq!(value["replyToId"], "act-1");
        assert!(value.get("membersAdded").is_none());
        assert!(value.get("id").is_none());
    }
}
