//! Documentation assistant
//!
//! Answers questions with the resolved documentation as context. Failures
//! never reach the caller: every error turns into [`FALLBACK_MESSAGE`].

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod streaming;

pub use auth::{ApiKeyManager, KeySource};
pub use client::AssistantClient;
pub use error::AssistantError;
pub use models::{AssistantModel, CreateMessageRequest, Message, Role, StreamEvent};

/// Shown whenever an answer cannot be produced
pub const FALLBACK_MESSAGE: &str = "I couldn't get a response right now. Please try again later.";

/// Earlier turns sent along with a new question
const MAX_HISTORY_MESSAGES: usize = 10;

/// First message of a new conversation
pub fn greeting(product: &str) -> String {
    format!(
        "Hello! I'm your {} documentation assistant. Ask me anything about setting up, \
         configuring or troubleshooting the app.",
        product
    )
}

/// System prompt embedding the documentation context
pub fn system_prompt(product: &str, context: &str) -> String {
    format!(
        "You are the {product} technical support assistant.\n\n\
         Use the following documentation to answer the user's questions accurately:\n\n\
         {context}\n\n\
         Guidelines:\n\
         1. Only answer questions about {product} and the documentation above.\n\
         2. If the answer is not in the documentation, say so and offer help with \
         installation or setup instead.\n\
         3. Keep answers concise and technically accurate.\n\
         4. Format answers as plain Markdown."
    )
}

/// Build a request for `question`, carrying the tail of `history`
pub fn build_request(
    model: AssistantModel,
    product: &str,
    context: &str,
    history: &[Message],
    question: &str,
) -> CreateMessageRequest {
    let skip = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
    let mut messages: Vec<Message> = history
        .iter()
        .skip(skip)
        // The API expects the conversation to open with a user turn
        .skip_while(|message| message.role == Role::Assistant)
        .cloned()
        .collect();
    messages.push(Message::user(question));

    CreateMessageRequest::new(model, messages).with_system(system_prompt(product, context))
}

/// Ask a single question and wait for the full answer
pub async fn ask(
    client: &AssistantClient,
    model: AssistantModel,
    product: &str,
    context: &str,
    question: &str,
) -> String {
    let request = build_request(model, product, context, &[], question);
    answer_or_fallback(client.send_message(request).await.map(|response| response.text()))
}

/// Turn a backend result into text for the user
pub fn answer_or_fallback(result: Result<String, AssistantError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("Assistant error: {}", AssistantError::EmptyResponse);
            FALLBACK_MESSAGE.to_string()
        }
        Err(e) => {
            tracing::warn!("Assistant error: {}", e);
            FALLBACK_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_become_the_fallback() {
        let err = AssistantError::Api { status: 500, message: "boom".into() };
        assert_eq!(answer_or_fallback(Err(err)), FALLBACK_MESSAGE);
        assert_eq!(answer_or_fallback(Ok("  ".into())), FALLBACK_MESSAGE);
        assert_eq!(answer_or_fallback(Ok("Use :goto".into())), "Use :goto");
    }

    #[test]
    fn request_carries_context_and_question() {
        let request = build_request(
            AssistantModel::Haiku,
            "BookHere",
            "Section: FAQ\nContent: Reset it.",
            &[],
            "How do I reset?",
        );
        let system = request.system.unwrap();
        assert!(system.contains("BookHere technical support assistant"));
        assert!(system.contains("Section: FAQ\nContent: Reset it."));
        assert_eq!(request.messages, vec![Message::user("How do I reset?")]);
    }

    #[test]
    fn history_drops_greeting_and_is_bounded() {
        let mut history = vec![Message::assistant(greeting("BookHere"))];
        for i in 0..8 {
            history.push(Message::user(format!("q{i}")));
            history.push(Message::assistant(format!("a{i}")));
        }

        let request = build_request(AssistantModel::Haiku, "P", "", &history, "next");
        assert!(request.messages.len() <= MAX_HISTORY_MESSAGES + 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages.last(), Some(&Message::user("next")));
    }
}
