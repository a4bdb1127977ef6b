//! Engagement gate: decides whether the bot acts on a message.

use crate::relay::message::InboundMessage;
use crate::relay::random::RandomSource;

/// What the bot does with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementDecision {
    /// The message replies to the bot's own message; always answered.
    Continuation,
    /// Probabilistic pickup of an unrelated message.
    NewEngagement,
    Ignore,
}

/// One decision per message. The reply-to-bot check wins before any draw,
/// so a continuation never consumes randomness.
pub fn decide(
    msg: &InboundMessage,
    response_probability: f64,
    rng: &dyn RandomSource,
) -> EngagementDecision {
    if msg.is_reply_to_bot {
        return EngagementDecision::Continuation;
    }

    if rng.next_f64() < response_probability {
        EngagementDecision::NewEngagement
    } else {
        EngagementDecision::Ignore
    }
}
