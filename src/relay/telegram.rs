//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::warn;

use crate::relay::scheduler::OutboundSink;

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

#[async_trait]
impl OutboundSink for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.send_message(chat_id, text).await
    }
}
