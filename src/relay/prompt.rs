//! Prompt templates for the completion provider.
//!
//! The register directive (Hinglish or English, matched to the inbound
//! message) is an instruction to the model, not logic executed here.

use crate::relay::gate::EngagementDecision;
use crate::relay::message::InboundMessage;

/// Build the provider prompt for a gated reply.
pub fn build(decision: EngagementDecision, msg: &InboundMessage, is_technical: bool) -> String {
    let base = match decision {
        EngagementDecision::Continuation => format!(
            "Continue the conversation with {}. Their latest message is: '{}'. \
             Respond as per the mood of the message and give a befitting reply.",
            msg.sender_name, msg.text
        ),
        _ => format!(
            "Start a conversation with {} based on their message: '{}'. \
             Respond in an engaging manner.",
            msg.sender_name, msg.text
        ),
    };

    with_register(base, is_technical)
}

/// Build the prompt for a /ask direct question; same register rules,
/// no engagement framing.
pub fn direct_question(sender_name: &str, question: &str, is_technical: bool) -> String {
    let base = format!(
        "Answer this question from {sender_name} in a friendly and informative way: '{question}'."
    );

    with_register(base, is_technical)
}

fn with_register(mut prompt: String, is_technical: bool) -> String {
    if is_technical {
        prompt.push_str(
            " The message is related to coding or programming, so provide a detailed \
             and helpful technical answer.",
        );
    }
    prompt.push_str(" Use Hinglish or English as appropriate based on the message.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            sender_id: 923847,
            sender_name: "Priya".to_string(),
            text: text.to_string(),
            chat_id: -100123,
            chat_kind: "group".to_string(),
            timestamp: "2025-03-01 10:31".to_string(),
            is_reply_to_bot: false,
        }
    }

    #[test]
    fn test_continuation_contains_name_and_verbatim_text() {
        let msg = message("arre kya scene hai?");
        let prompt = build(EngagementDecision::Continuation, &msg, false);

        assert!(prompt.contains("Continue the conversation"));
        assert!(prompt.contains("Priya"));
        assert!(prompt.contains("'arre kya scene hai?'"));
    }

    #[test]
    fn test_opener_contains_name_and_verbatim_text() {
        let msg = message("monday blues yaar");
        let prompt = build(EngagementDecision::NewEngagement, &msg, false);

        assert!(prompt.contains("Start a conversation"));
        assert!(prompt.contains("Priya"));
        assert!(prompt.contains("'monday blues yaar'"));
    }

    #[test]
    fn test_technical_clause_only_when_flagged() {
        let msg = message("my api call fails");

        let plain = build(EngagementDecision::NewEngagement, &msg, false);
        let technical = build(EngagementDecision::NewEngagement, &msg, true);

        assert!(!plain.contains("coding or programming"));
        assert!(technical.contains("coding or programming"));
    }

    #[test]
    fn test_register_directive_always_present() {
        let msg = message("chai break?");
        for is_technical in [false, true] {
            let prompt = build(EngagementDecision::Continuation, &msg, is_technical);
            assert!(prompt.contains("Hinglish or English"));
        }
    }

    #[test]
    fn test_direct_question_contains_name_and_question() {
        let prompt = direct_question("Ravi", "what is ownership in rust?", true);

        assert!(prompt.contains("Ravi"));
        assert!(prompt.contains("'what is ownership in rust?'"));
        assert!(prompt.contains("coding or programming"));
        assert!(prompt.contains("Hinglish or English"));
    }
}
