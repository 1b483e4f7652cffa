//! Scripted stand-ins for the operator, the generation service and the
//! capability provider.
//!
//! Each double answers from a queue filled up front and records what it was
//! asked, so tests can drive a whole [`Session`](crate::session::Session)
//! without a terminal, a network or a child process. An exhausted operator
//! script behaves like a closed stdin, which ends the session loop.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::generation::{Generation, GenerationRequest, Generator};
use crate::model::{
    JsonObject, Message, Prompt, Resource, ResourceContent, ResourceTemplate, Tool, ToolOutput,
};
use crate::operator::{Choice, Operator};
use crate::provider::CapabilityProvider;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Operator that replays canned answers.
#[derive(Default)]
pub struct ScriptedOperator {
    selections: Mutex<VecDeque<String>>,
    inputs: Mutex<VecDeque<String>>,
    confirmations: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
    menus: Mutex<Vec<Vec<Choice>>>,
    output: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the value to pick at the next menu.
    pub fn with_selection(self, value: impl Into<String>) -> Self {
        lock(&self.selections).push_back(value.into());
        self
    }

    pub fn with_input(self, value: impl Into<String>) -> Self {
        lock(&self.inputs).push_back(value.into());
        self
    }

    pub fn with_confirmation(self, yes: bool) -> Self {
        lock(&self.confirmations).push_back(yes);
        self
    }

    /// Messages of every text input asked so far.
    pub fn asked(&self) -> Vec<String> {
        lock(&self.asked).clone()
    }

    /// Choices offered by every menu so far.
    pub fn menus(&self) -> Vec<Vec<Choice>> {
        lock(&self.menus).clone()
    }

    pub fn output(&self) -> Vec<String> {
        lock(&self.output).clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn select(&self, _message: &str, choices: &[Choice]) -> Result<String> {
        lock(&self.menus).push(choices.to_vec());
        lock(&self.selections)
            .pop_front()
            .ok_or(ClientError::InputClosed)
    }

    async fn input(&self, message: &str) -> Result<String> {
        lock(&self.asked).push(message.to_string());
        lock(&self.inputs).pop_front().ok_or(ClientError::InputClosed)
    }

    async fn confirm(&self, _message: &str, _default: bool) -> Result<bool> {
        lock(&self.confirmations)
            .pop_front()
            .ok_or(ClientError::InputClosed)
    }

    fn show(&self, text: &str) {
        lock(&self.output).push(text.to_string());
    }

    fn warn(&self, text: &str) {
        lock(&self.warnings).push(text.to_string());
    }
}

/// Generator that returns queued generations in order.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Generation>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_generation(Generation {
            text: text.into(),
            tool_results: Vec::new(),
        })
    }

    pub fn with_generation(self, generation: Generation) -> Self {
        lock(&self.replies).push_back(generation);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.prompt.clone()).collect()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .ok_or_else(|| ClientError::Generation("no scripted reply left".to_string()))
    }
}

/// A remote call recorded by [`FakeProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Tool { name: String, arguments: JsonObject },
    Resource { uri: String },
    Prompt { name: String, arguments: JsonObject },
}

/// In-memory capability provider.
#[derive(Default)]
pub struct FakeProvider {
    pub tools: Vec<Tool>,
    pub prompts: Vec<Prompt>,
    pub resources: Vec<Resource>,
    pub resource_templates: Vec<ResourceTemplate>,
    pub tool_outputs: HashMap<String, ToolOutput>,
    pub resource_contents: HashMap<String, Vec<ResourceContent>>,
    pub prompt_messages: HashMap<String, Vec<Message>>,
    /// Makes every listing call fail.
    pub fail_listing: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    fn listing<T: Clone>(&self, items: &[T]) -> Result<Vec<T>> {
        if self.fail_listing {
            return Err(ClientError::Connection("listing failed".to_string()));
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.listing(&self.tools)
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        self.listing(&self.prompts)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.listing(&self.resources)
    }

    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        self.listing(&self.resource_templates)
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput> {
        lock(&self.calls).push(Call::Tool {
            name: name.to_string(),
            arguments,
        });
        Ok(self.tool_outputs.get(name).cloned().unwrap_or_default())
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>> {
        lock(&self.calls).push(Call::Resource {
            uri: uri.to_string(),
        });
        Ok(self.resource_contents.get(uri).cloned().unwrap_or_default())
    }

    async fn get_prompt(&self, name: &str, arguments: JsonObject) -> Result<Vec<Message>> {
        lock(&self.calls).push(Call::Prompt {
            name: name.to_string(),
            arguments,
        });
        Ok(self.prompt_messages.get(name).cloned().unwrap_or_default())
    }
}
