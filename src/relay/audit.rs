//! Audit sink: mirrors inbound message metadata to a log channel.
//!
//! The reply path never waits on or learns about the audit write; the
//! engine spawns each record on a detached task and failures end as a
//! single warn line.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::relay::message::AuditRecord;
use crate::relay::telegram::TelegramClient;

/// Upper bound on one audit post; Telegram rejects longer messages.
const MAX_AUDIT_CHARS: usize = 4000;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), String>;
}

/// Posts each record to a dedicated Telegram log chat.
pub struct TelegramAuditSink {
    telegram: Arc<TelegramClient>,
    log_chat_id: i64,
}

impl TelegramAuditSink {
    pub fn new(telegram: Arc<TelegramClient>, log_chat_id: i64) -> Self {
        Self {
            telegram,
            log_chat_id,
        }
    }
}

#[async_trait]
impl AuditSink for TelegramAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), String> {
        let mut text = record.render();
        if text.chars().count() > MAX_AUDIT_CHARS {
            text = text.chars().take(MAX_AUDIT_CHARS).collect();
            text.push_str("...");
        }

        self.telegram.send_message(self.log_chat_id, &text).await?;

        let preview: String = record.text.chars().take(20).collect();
        info!("Message logged to channel: {preview}...");
        Ok(())
    }
}
