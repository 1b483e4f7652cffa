//! Text generation collaborator.

pub mod gemini;

pub use gemini::GeminiGenerator;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;
use crate::model::{Content, JsonObject};

/// Forwards model-chosen arguments to a tool and returns its content.
pub type ToolExecute = Arc<dyn Fn(JsonObject) -> BoxFuture<'static, Result<Vec<Content>>> + Send + Sync>;

/// A tool the model may decide to call.
#[derive(Clone)]
pub struct ToolBinding {
    pub name: String,
    pub description: String,
    /// Always an object schema whose properties carry only a `type`.
    pub input_schema: Value,
    pub execute: ToolExecute,
}

impl fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBinding")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub tools: Vec<ToolBinding>,
}

impl GenerationRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolBinding>) -> Self {
        self.tools = tools;
        self
    }
}

/// A tool call the model made while answering, with what the tool returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_name: String,
    pub args: JsonObject,
    pub output: Vec<Content>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub tool_results: Vec<ToolResult>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier reported back in sampling replies.
    fn model(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<Generation>;
}
