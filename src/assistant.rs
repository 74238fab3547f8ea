//! Help assistant behind the chat widget: ordered keyword lookup, first
//! match wins.

use serde::Serialize;

pub const GREETING: &str = "Hello! I'm your Skill Links assistant. How can I help you today?";

pub const FALLBACK: &str = "I'm not sure how to help with that. Could you try asking something about finding professionals, booking services, payments, or how to become a professional on our platform?";

/// Keyword table in match order.
const RESPONSES: &[(&str, &str)] = &[
    (
        "help",
        "I can help you find skilled professionals, navigate our website, understand how our service works, or answer questions about Skill Links.",
    ),
    (
        "find",
        "To find a professional, you can use the search bar at the top of the page or browse by category. You can filter by location, ratings, and availability.",
    ),
    (
        "book",
        "To book a service, first find a professional you like, then click on their profile and use the \"Contact\" button to discuss your needs. You can also submit a job request and receive quotes.",
    ),
    (
        "payment",
        "We support various payment methods including credit/debit cards and online banking. Payments are secure and only released to professionals once you confirm the job is complete.",
    ),
    (
        "review",
        "After a service is completed, you can leave a review on the professional's profile. Honest reviews help maintain the quality of our platform.",
    ),
    (
        "problem",
        "If you encounter any issues with a service, please contact the professional directly first. If you can't resolve the issue, our customer support team is here to help.",
    ),
    (
        "account",
        "You can manage your account by clicking on your profile icon in the top right corner. From there, you can update your information, view your history, and manage your settings.",
    ),
    (
        "professional",
        "If you're a skilled professional looking to offer your services, sign up and select \"Service Provider\" during registration. You'll need to complete your profile and verification process before you can start receiving job requests.",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    /// Keyword that selected the reply; `None` for the fallback.
    pub topic: Option<&'static str>,
    pub reply: &'static str,
}

/// Reply to a user message. Returns `None` for blank input.
pub fn respond(message: &str) -> Option<AssistantReply> {
    if message.trim().is_empty() {
        return None;
    }
    let lowered = message.to_lowercase();
    let reply = RESPONSES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(keyword, reply)| AssistantReply {
            topic: Some(keyword),
            reply,
        })
        .unwrap_or(AssistantReply {
            topic: None,
            reply: FALLBACK,
        });
    Some(reply)
}
