//! Reply engine: one detached task per inbound message.
//!
//! Tasks share nothing mutable; all collaborators are injected at startup
//! and either read-only or internally synchronized. A shutdown signal
//! abandons in-flight generation and pending delays without sending.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::classifier::TechnicalDetector;
use crate::relay::audit::AuditSink;
use crate::relay::gate::{self, EngagementDecision};
use crate::relay::message::{AuditRecord, InboundMessage};
use crate::relay::prompt;
use crate::relay::provider::CompletionProvider;
use crate::relay::random::RandomSource;
use crate::relay::scheduler::{DeliveryScheduler, OutboundSink};

/// Best-effort reply when a handler task dies unexpectedly.
const OOPS: &str = "Oops! Something went wrong. Please try again later.";

/// Tunables shared read-only across handler tasks.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Chance of picking up a message that is not a reply to the bot.
    pub response_probability: f64,
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    pub max_reply_tokens: u32,
    /// Token budget override for technical messages, when configured.
    pub technical_max_tokens: Option<u32>,
}

pub struct ReplyEngine {
    settings: EngineSettings,
    provider: CompletionProvider,
    scheduler: DeliveryScheduler,
    outbound: Arc<dyn OutboundSink>,
    audit: Option<Arc<dyn AuditSink>>,
    detector: Arc<dyn TechnicalDetector>,
    rng: Arc<dyn RandomSource>,
    shutdown: watch::Receiver<bool>,
}

impl ReplyEngine {
    pub fn new(
        settings: EngineSettings,
        provider: CompletionProvider,
        outbound: Arc<dyn OutboundSink>,
        audit: Option<Arc<dyn AuditSink>>,
        detector: Arc<dyn TechnicalDetector>,
        rng: Arc<dyn RandomSource>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let scheduler = DeliveryScheduler::new(
            settings.reply_delay_min,
            settings.reply_delay_max,
            rng.clone(),
        );

        Self {
            settings,
            provider,
            scheduler,
            outbound,
            audit,
            detector,
            rng,
            shutdown,
        }
    }

    /// Handle one message on its own task. Never blocks the caller; an
    /// error escaping the pipeline is logged and answered with a generic
    /// best-effort apology, and other tasks never notice.
    pub fn spawn_handle(self: &Arc<Self>, msg: InboundMessage) {
        let engine = self.clone();
        tokio::spawn(async move {
            let chat_id = msg.chat_id;
            if let Err(e) = engine.handle_message(msg).await {
                error!("Exception while handling a message: {e}");
                if let Err(e) = engine.outbound.send(chat_id, OOPS).await {
                    warn!("Failed to send apology: {e}");
                }
            }
        });
    }

    /// The per-message pipeline: audit, gate, generate, deliver.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<(), String> {
        let preview: String = msg.text.chars().take(50).collect();
        info!("📨 {} ({}): \"{preview}\"", msg.sender_name, msg.sender_id);

        // Fire-and-forget: the reply path never waits on the audit write.
        if let Some(ref audit) = self.audit {
            let audit = audit.clone();
            let record = AuditRecord::from_message(&msg);
            tokio::spawn(async move {
                if let Err(e) = audit.record(&record).await {
                    warn!("Error logging message to channel: {e}");
                }
            });
        }

        let decision = gate::decide(&msg, self.settings.response_probability, self.rng.as_ref());
        match decision {
            EngagementDecision::Ignore => {
                info!("Decided not to respond to this message");
                return Ok(());
            }
            EngagementDecision::Continuation => {
                info!("This is a reply to the bot's message. Continuing conversation.");
            }
            EngagementDecision::NewEngagement => {
                info!("Decided to respond to this message");
            }
        }

        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Ok(());
        }

        tokio::select! {
            _ = shutdown.changed() => {
                info!("Shutting down, abandoning reply for chat {}", msg.chat_id);
                Ok(())
            }
            result = self.respond(&msg, decision) => result,
        }
    }

    async fn respond(
        &self,
        msg: &InboundMessage,
        decision: EngagementDecision,
    ) -> Result<(), String> {
        let is_technical = self.detector.is_technical(&msg.text);
        let prompt = prompt::build(decision, msg, is_technical);

        let reply = self
            .provider
            .complete(&prompt, self.token_budget(is_technical))
            .await;

        self.scheduler
            .deliver(self.outbound.as_ref(), msg.chat_id, &reply)
            .await?;
        Ok(())
    }

    /// Direct question path for /ask: no gate, no pacing delay.
    pub async fn answer_direct(
        &self,
        chat_id: i64,
        sender_name: &str,
        question: &str,
    ) -> Result<(), String> {
        let is_technical = self.detector.is_technical(question);
        let prompt = prompt::direct_question(sender_name, question, is_technical);

        let reply = self
            .provider
            .complete(&prompt, self.token_budget(is_technical))
            .await;

        self.outbound.send(chat_id, &reply.text).await?;
        Ok(())
    }

    fn token_budget(&self, is_technical: bool) -> u32 {
        match (is_technical, self.settings.technical_max_tokens) {
            (true, Some(budget)) => budget,
            _ => self.settings.max_reply_tokens,
        }
    }
}
