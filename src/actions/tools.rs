use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::model::{declared_type, Content, JsonObject, Tool};
use crate::operator::Operator;
use crate::provider::CapabilityProvider;

/// Ask for every declared field, call the tool and print its first text
/// entry.
///
/// Answers are passed through as strings whatever the declared type. A
/// result without text in its first entry is reported as an error.
pub async fn invoke_tool(
    provider: &dyn CapabilityProvider,
    operator: &dyn Operator,
    tool: &Tool,
) -> Result<()> {
    let mut arguments = JsonObject::new();
    for (field, schema) in tool.fields() {
        let message = format!("Enter value for {} ({}):", field, declared_type(schema));
        let value = operator.input(&message).await?;
        arguments.insert(field.to_string(), Value::String(value));
    }

    let output = provider.call_tool(&tool.name, arguments).await?;
    if output.is_error == Some(true) {
        tracing::warn!(tool = %tool.name, "tool reported an error");
    }

    let text = output
        .content
        .first()
        .and_then(Content::as_text)
        .ok_or(ClientError::MissingText("tool result"))?;
    operator.show(text);
    Ok(())
}
