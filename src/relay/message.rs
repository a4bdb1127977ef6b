//! Canonical inbound message record and its audit projection.

/// A normalized inbound chat message.
///
/// Built once at the platform boundary; everything downstream depends on
/// this type, never on raw Telegram updates. Construction never fails:
/// missing optional platform fields get sentinel defaults.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: i64,
    pub sender_name: String,
    pub text: String,
    pub chat_id: i64,
    /// "private", "group", "supergroup" or "channel".
    pub chat_kind: String,
    pub timestamp: String,
    /// True when this message replies to one of the bot's own messages.
    pub is_reply_to_bot: bool,
}

/// Write-only projection of an [`InboundMessage`] for the audit channel.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub sender_id: i64,
    pub sender_name: String,
    pub chat_id: i64,
    pub chat_kind: String,
    pub text: String,
    pub timestamp: String,
}

impl AuditRecord {
    pub fn from_message(msg: &InboundMessage) -> Self {
        Self {
            sender_id: msg.sender_id,
            sender_name: msg.sender_name.clone(),
            chat_id: msg.chat_id,
            chat_kind: msg.chat_kind.clone(),
            text: msg.text.clone(),
            timestamp: msg.timestamp.clone(),
        }
    }

    /// Render the record in the log-channel layout.
    pub fn render(&self) -> String {
        format!(
            "User: {} ({})\nChat: {} ({})\nMessage: {}\nTimestamp: {}",
            self.sender_name, self.sender_id, self.chat_kind, self.chat_id, self.text, self.timestamp
        )
    }
}
