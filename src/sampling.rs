//! Client-side text generation on behalf of the provider.
//!
//! [`respond_to_message`] is the single procedure behind both the
//! `sampling/createMessage` callback and the display of rendered prompts.

use crate::error::Result;
use crate::generation::{GenerationRequest, Generator};
use crate::model::Message;
use crate::operator::Operator;

pub const CONFIRM_PROMPT: &str = "Would you like to run this prompt";

/// Show a text message, ask whether to run it, and generate a reply.
///
/// Returns `None` for non-text content and for declined messages.
pub async fn respond_to_message(
    operator: &dyn Operator,
    generator: &dyn Generator,
    message: &Message,
) -> Result<Option<String>> {
    let Some(text) = message.text() else {
        tracing::debug!(role = %message.role, "skipping non-text message");
        return Ok(None);
    };

    if !operator.confirm_with_context(text, CONFIRM_PROMPT, true).await? {
        return Ok(None);
    }

    let generation = generator.generate(GenerationRequest::prompt(text)).await?;
    Ok(Some(generation.text))
}

/// Answer a whole sampling request: the contributions of every message,
/// newline separated.
pub async fn answer(
    operator: &dyn Operator,
    generator: &dyn Generator,
    messages: &[Message],
) -> Result<String> {
    let mut texts = Vec::new();
    for message in messages {
        if let Some(text) = respond_to_message(operator, generator, message).await? {
            texts.push(text);
        }
    }
    Ok(texts.join("\n"))
}
