//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Generation, GenerationRequest, Generator, ToolBinding, ToolResult};
use crate::error::{ClientError, Result};
use crate::model::JsonObject;

/// Sent as a header; request URLs end up in error messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Single-step Gemini client: one request, function calls in the reply are
/// executed through the request's tool bindings and reported as tool results.
pub struct GeminiGenerator {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiGenerator {
    /// A missing key is only reported when a generation is attempted.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: JsonObject,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl FunctionDeclaration {
    fn from_binding(binding: &ToolBinding) -> Self {
        // Gemini rejects object schemas without properties.
        let has_properties = binding
            .input_schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| !props.is_empty());

        Self {
            name: binding.name.clone(),
            description: binding.description.clone(),
            parameters: has_properties.then(|| binding.input_schema.clone()),
        }
    }
}

fn build_request(request: &GenerationRequest) -> GeminiRequest {
    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTools {
            function_declarations: request.tools.iter().map(FunctionDeclaration::from_binding).collect(),
        }]
    };

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
                function_call: None,
            }],
        }],
        tools,
    }
}

fn scrub(e: reqwest::Error) -> ClientError {
    ClientError::Http(e.without_url())
}

async fn execute_call(tools: &[ToolBinding], call: FunctionCall) -> Result<ToolResult> {
    let binding = tools
        .iter()
        .find(|t| t.name == call.name)
        .ok_or_else(|| ClientError::Generation(format!("model called unknown tool '{}'", call.name)))?;

    tracing::debug!(tool = %call.name, "model requested tool call");
    let output = (binding.execute)(call.args.clone()).await?;

    Ok(ToolResult {
        tool_name: call.name,
        args: call.args,
        output,
    })
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClientError::Generation("GEMINI_API_KEY is not set".to_string()))?;

        let body = build_request(&request);
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(scrub)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(scrub)?;
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ClientError::Generation(format!(
                    "Gemini authentication failed: {}. Please check your API key.",
                    text
                )));
            }
            return Err(ClientError::Generation(format!(
                "Gemini API error: HTTP {}: {}",
                status, text
            )));
        }

        let reply: GeminiResponse = response.json().await.map_err(scrub)?;
        let parts = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut text = String::new();
        let mut calls = Vec::new();
        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                calls.push(call);
            }
        }

        let tool_results =
            try_join_all(calls.into_iter().map(|call| execute_call(&request.tools, call))).await?;

        Ok(Generation { text, tool_results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Content;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn binding(name: &str, schema: Value, calls: Arc<Mutex<Vec<JsonObject>>>) -> ToolBinding {
        ToolBinding {
            name: name.to_string(),
            description: format!("{} tool", name),
            input_schema: schema,
            execute: Arc::new(move |args: JsonObject| {
                calls.lock().unwrap().push(args);
                async { Ok::<_, ClientError>(vec![Content::text("Sunny, 72F")]) }.boxed()
            }),
        }
    }

    #[test]
    fn empty_schemas_are_sent_without_parameters() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let request = GenerationRequest::prompt("hi").with_tools(vec![
            binding("ping", json!({ "type": "object", "properties": {} }), calls.clone()),
            binding(
                "get_alerts",
                json!({ "type": "object", "properties": { "state": { "type": "string" } } }),
                calls,
            ),
        ]);

        let body = serde_json::to_value(build_request(&request)).unwrap();
        let decls = &body["tools"][0]["functionDeclarations"];
        assert!(decls[0].get("parameters").is_none());
        assert_eq!(decls[1]["parameters"]["properties"]["state"]["type"], "string");
    }

    #[test]
    fn plain_prompt_has_no_tools_field() {
        let body = serde_json::to_value(build_request(&GenerationRequest::prompt("hi"))).unwrap();
        assert!(body.get("tools").is_none());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "there" }] }
                }]
            })))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(Some("test-key".into())).with_base_url(server.uri());
        let generation = generator.generate(GenerationRequest::prompt("hi")).await.unwrap();
        assert_eq!(generation.text, "Hello there");
        assert!(generation.tool_results.is_empty());
    }

    #[tokio::test]
    async fn executes_function_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "functionCall": { "name": "get_forecast", "args": { "latitude": 40.7 } } }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let calls = Arc::new(Mutex::new(Vec::new()));
        let request = GenerationRequest::prompt("weather in NYC?").with_tools(vec![binding(
            "get_forecast",
            json!({ "type": "object", "properties": { "latitude": { "type": "number" } } }),
            calls.clone(),
        )]);

        let generator = GeminiGenerator::new(Some("k".into())).with_base_url(server.uri());
        let generation = generator.generate(request).await.unwrap();

        assert_eq!(generation.text, "");
        assert_eq!(generation.tool_results.len(), 1);
        assert_eq!(generation.tool_results[0].tool_name, "get_forecast");
        assert_eq!(generation.tool_results[0].output[0].as_text(), Some("Sunny, 72F"));
        assert_eq!(calls.lock().unwrap()[0]["latitude"], json!(40.7));
    }

    #[tokio::test]
    async fn transport_errors_do_not_carry_the_key() {
        let generator = GeminiGenerator::new(Some("SECRET-KEY-123".into()))
            .with_base_url("http://127.0.0.1:1");
        let err = generator.generate(GenerationRequest::prompt("hi")).await.unwrap_err();

        assert!(matches!(err, ClientError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn auth_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(Some("bad".into())).with_base_url(server.uri());
        let err = generator.generate(GenerationRequest::prompt("hi")).await.unwrap_err();
        assert!(err.to_string().contains("authentication failed"));
    }

    #[tokio::test]
    async fn missing_key_fails_at_first_use() {
        let generator = GeminiGenerator::new(None);
        let err = generator.generate(GenerationRequest::prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ClientError::Generation(_)));
    }
}
