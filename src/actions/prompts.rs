use serde_json::Value;

use crate::error::Result;
use crate::generation::Generator;
use crate::model::{JsonObject, Prompt};
use crate::operator::Operator;
use crate::provider::CapabilityProvider;
use crate::sampling::respond_to_message;

/// Collect the prompt's arguments, render it on the provider and offer each
/// resulting message for generation.
pub async fn run_prompt(
    provider: &dyn CapabilityProvider,
    operator: &dyn Operator,
    generator: &dyn Generator,
    prompt: &Prompt,
) -> Result<()> {
    let mut arguments = JsonObject::new();
    for argument in &prompt.arguments {
        let value = operator
            .input(&format!("Enter value for {}:", argument.name))
            .await?;
        arguments.insert(argument.name.clone(), Value::String(value));
    }

    let messages = provider.get_prompt(&prompt.name, arguments).await?;
    for message in &messages {
        if let Some(text) = respond_to_message(operator, generator, message).await? {
            operator.show(&text);
        }
    }
    Ok(())
}
