use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};

use crate::error::{ClientError, Result};
use crate::generation::{GenerationRequest, Generator, ToolBinding, ToolExecute};
use crate::model::{Content, JsonObject, Tool};
use crate::operator::Operator;
use crate::provider::CapabilityProvider;

pub const NO_TEXT_GENERATED: &str = "No text generated.";

/// Object schema keeping only each property's `type`, defaulting to
/// `"string"`. Nested schema detail is dropped.
pub fn normalized_schema(tool: &Tool) -> Value {
    let properties: JsonObject = tool
        .fields()
        .map(|(name, schema)| {
            let kind = schema
                .get("type")
                .filter(|t| !t.is_null())
                .cloned()
                .unwrap_or_else(|| json!("string"));
            (name.to_string(), json!({ "type": kind }))
        })
        .collect();

    json!({ "type": "object", "properties": properties })
}

/// Expose every tool to the model under its own name; executing one
/// forwards to the provider.
pub fn tool_table(provider: &Arc<dyn CapabilityProvider>, tools: &[Tool]) -> Vec<ToolBinding> {
    tools
        .iter()
        .map(|tool| {
            let provider = Arc::clone(provider);
            let name = tool.name.clone();
            let execute: ToolExecute = Arc::new(move |arguments: JsonObject| {
                let provider = Arc::clone(&provider);
                let name = name.clone();
                async move {
                    let output = provider.call_tool(&name, arguments).await?;
                    Ok::<_, ClientError>(output.content)
                }
                .boxed()
            });

            ToolBinding {
                name: tool.name.clone(),
                description: tool.description.clone().unwrap_or_default(),
                input_schema: normalized_schema(tool),
                execute,
            }
        })
        .collect()
}

/// Send a free-text query to the model with every tool available.
pub async fn run_query(
    provider: &Arc<dyn CapabilityProvider>,
    operator: &dyn Operator,
    generator: &dyn Generator,
    tools: &[Tool],
) -> Result<()> {
    let query = operator.input("Enter your query").await?;
    let request = GenerationRequest::prompt(query).with_tools(tool_table(provider, tools));
    let generation = generator.generate(request).await?;

    let text = if generation.text.is_empty() {
        generation
            .tool_results
            .first()
            .and_then(|r| r.output.first())
            .and_then(Content::as_text)
            .unwrap_or(NO_TEXT_GENERATED)
    } else {
        generation.text.as_str()
    };
    operator.show(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Generation, ToolResult};
    use crate::model::ToolOutput;
    use crate::testutils::{Call, FakeProvider, ScriptedGenerator, ScriptedOperator};

    fn tool(value: Value) -> Tool {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn declared_types_survive_normalization() {
        let schema = normalized_schema(&tool(json!({
            "name": "set_age",
            "inputSchema": { "properties": { "age": { "type": "number", "minimum": 0 } } }
        })));
        assert_eq!(
            schema,
            json!({ "type": "object", "properties": { "age": { "type": "number" } } })
        );
    }

    #[test]
    fn missing_types_default_to_string() {
        let schema = normalized_schema(&tool(json!({
            "name": "tag",
            "inputSchema": { "properties": { "label": { "description": "free text" } } }
        })));
        assert_eq!(schema["properties"]["label"], json!({ "type": "string" }));
    }

    #[test]
    fn no_properties_yield_empty_object() {
        let schema = normalized_schema(&tool(json!({ "name": "ping" })));
        assert_eq!(schema, json!({ "type": "object", "properties": {} }));
    }

    #[tokio::test]
    async fn table_entries_forward_to_the_provider() {
        let mut fake = FakeProvider::new();
        fake.tool_outputs.insert(
            "get_alerts".into(),
            ToolOutput {
                content: vec![Content::text("Active alerts for CA")],
                is_error: None,
            },
        );
        let fake = Arc::new(fake);
        let provider: Arc<dyn CapabilityProvider> = fake.clone();
        let tools = vec![tool(json!({ "name": "get_alerts", "description": "Get weather alerts" }))];

        let table = tool_table(&provider, &tools);
        assert_eq!(table[0].name, "get_alerts");
        assert_eq!(table[0].description, "Get weather alerts");

        let mut args = JsonObject::new();
        args.insert("state".into(), json!("CA"));
        let output = (table[0].execute)(args.clone()).await.unwrap();

        assert_eq!(output[0].as_text(), Some("Active alerts for CA"));
        assert_eq!(
            fake.calls(),
            vec![Call::Tool {
                name: "get_alerts".into(),
                arguments: args,
            }]
        );
    }

    #[tokio::test]
    async fn falls_back_to_first_tool_output() {
        let provider: Arc<dyn CapabilityProvider> = Arc::new(FakeProvider::new());
        let operator = ScriptedOperator::new().with_input("Any alerts in CA?");
        let generator = ScriptedGenerator::new().with_generation(Generation {
            text: String::new(),
            tool_results: vec![ToolResult {
                tool_name: "get_alerts".into(),
                args: JsonObject::new(),
                output: vec![Content::text("No active alerts.")],
            }],
        });

        run_query(&provider, &operator, &generator, &[]).await.unwrap();

        assert_eq!(operator.output(), vec!["No active alerts.".to_string()]);
        assert_eq!(generator.prompts(), vec!["Any alerts in CA?".to_string()]);
    }

    #[tokio::test]
    async fn reports_when_nothing_was_generated() {
        let provider: Arc<dyn CapabilityProvider> = Arc::new(FakeProvider::new());
        let operator = ScriptedOperator::new().with_input("hello?");
        let generator = ScriptedGenerator::new().with_reply("");

        run_query(&provider, &operator, &generator, &[]).await.unwrap();

        assert_eq!(operator.output(), vec![NO_TEXT_GENERATED.to_string()]);
    }

    #[tokio::test]
    async fn every_tool_is_offered_to_the_model() {
        let provider: Arc<dyn CapabilityProvider> = Arc::new(FakeProvider::new());
        let operator = ScriptedOperator::new().with_input("forecast?");
        let generator = ScriptedGenerator::new().with_reply("Sunny");
        let tools = vec![
            tool(json!({ "name": "get_alerts" })),
            tool(json!({ "name": "get_forecast" })),
        ];

        run_query(&provider, &operator, &generator, &tools).await.unwrap();

        let names: Vec<_> = generator.requests()[0]
            .tools
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["get_alerts", "get_forecast"]);
        assert_eq!(operator.output(), vec!["Sunny".to_string()]);
    }
}
