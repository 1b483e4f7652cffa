//! The capability provider seam and its `rmcp` implementation.

use std::process::Stdio;

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, GetPromptRequestParam, ReadResourceRequestParam},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
    ServiceExt,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::{ClientError, Result};
use crate::handler::ConsoleClient;
use crate::model::{
    JsonObject, Message, Prompt, Resource, ResourceContent, ResourceTemplate, Tool, ToolOutput,
};

/// Everything the console needs from the process exposing tools, resources
/// and prompts.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<Tool>>;
    async fn list_prompts(&self) -> Result<Vec<Prompt>>;
    async fn list_resources(&self) -> Result<Vec<Resource>>;
    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>>;
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput>;
    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>>;
    async fn get_prompt(&self, name: &str, arguments: JsonObject) -> Result<Vec<Message>>;
}

/// A provider reached over an `rmcp` client session.
pub struct McpProvider {
    service: RunningService<RoleClient, ConsoleClient>,
}

#[derive(Deserialize)]
struct ReadResourceOutput {
    #[serde(default)]
    contents: Vec<ResourceContent>,
}

#[derive(Deserialize)]
struct PromptOutput {
    #[serde(default)]
    messages: Vec<Message>,
}

impl McpProvider {
    /// Spawn `command` and run the MCP handshake over its stdio. The child's
    /// stderr is discarded so it cannot scribble over the menu.
    pub async fn spawn(command: &str, args: &[String], client: ConsoleClient) -> Result<Self> {
        let (transport, _stderr) = TokioChildProcess::builder(Command::new(command).configure(
            |cmd| {
                cmd.args(args);
            },
        ))
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::Connection(format!("failed to spawn `{}`: {}", command, e)))?;

        tracing::debug!(command, ?args, "spawned provider process");
        Self::connect(transport, client).await
    }

    /// Run the MCP handshake over an already established transport.
    pub async fn connect<T, E, A>(transport: T, client: ConsoleClient) -> Result<Self>
    where
        T: rmcp::transport::IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = client
            .serve(transport)
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        tracing::info!("connected to provider");
        Ok(Self { service })
    }

    /// Close the session and wait for the transport to shut down.
    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(())
    }
}

/// Re-parse an `rmcp` value into one of the console's own shapes.
fn reshape<S: Serialize, T: DeserializeOwned>(what: &'static str, value: &S) -> Result<T> {
    let value = serde_json::to_value(value).map_err(ClientError::malformed(what))?;
    serde_json::from_value(value).map_err(ClientError::malformed(what))
}

/// Build an `rmcp` request parameter from its wire form.
fn params<T: DeserializeOwned>(what: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(ClientError::malformed(what))
}

#[async_trait]
impl CapabilityProvider for McpProvider {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        let tools = self.service.list_all_tools().await?;
        reshape("tool list", &tools)
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let prompts = self.service.list_all_prompts().await?;
        reshape("prompt list", &prompts)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let resources = self.service.list_all_resources().await?;
        reshape("resource list", &resources)
    }

    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        let templates = self.service.list_all_resource_templates().await?;
        reshape("resource template list", &templates)
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput> {
        let request: CallToolRequestParam = params(
            "tool call",
            json!({ "name": name, "arguments": arguments }),
        )?;
        tracing::debug!(tool = name, "calling tool");
        let result = self.service.call_tool(request).await?;
        reshape("tool result", &result)
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>> {
        let request: ReadResourceRequestParam =
            params("resource read", json!({ "uri": uri }))?;
        tracing::debug!(uri, "reading resource");
        let result = self.service.read_resource(request).await?;
        let output: ReadResourceOutput = reshape("resource contents", &result)?;
        Ok(output.contents)
    }

    async fn get_prompt(&self, name: &str, arguments: JsonObject) -> Result<Vec<Message>> {
        let request: GetPromptRequestParam = params(
            "prompt request",
            json!({ "name": name, "arguments": arguments }),
        )?;
        tracing::debug!(prompt = name, "rendering prompt");
        let result = self.service.get_prompt(request).await?;
        let output: PromptOutput = reshape("prompt messages", &result)?;
        Ok(output.messages)
    }
}
