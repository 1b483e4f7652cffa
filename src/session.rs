//! The interactive menu loop.

use std::sync::Arc;

use crate::actions;
use crate::capabilities::CapabilitySet;
use crate::error::{ClientError, Result};
use crate::generation::Generator;
use crate::operator::{Choice, Operator};
use crate::provider::CapabilityProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Query,
    Tools,
    Resources,
    Prompts,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Query, Action::Tools, Action::Resources, Action::Prompts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Query => "Query",
            Action::Tools => "Tools",
            Action::Resources => "Resources",
            Action::Prompts => "Prompts",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }
}

/// A connected provider, its capability snapshot and the collaborators every
/// action needs.
pub struct Session {
    provider: Arc<dyn CapabilityProvider>,
    operator: Arc<dyn Operator>,
    generator: Arc<dyn Generator>,
    capabilities: CapabilitySet,
}

impl Session {
    /// Fetch the capability snapshot. Fails if any listing fails.
    pub async fn start(
        provider: Arc<dyn CapabilityProvider>,
        operator: Arc<dyn Operator>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let capabilities = CapabilitySet::fetch(provider.as_ref()).await?;
        Ok(Self {
            provider,
            operator,
            generator,
            capabilities,
        })
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Run the menu until the operator's input is closed. Errors from a
    /// single action are printed and the loop carries on.
    pub async fn run(&self) -> Result<()> {
        self.operator.show("You are connected to the MCP server!");
        loop {
            match self.step().await {
                Ok(()) => {}
                Err(ClientError::InputClosed) => {
                    tracing::info!("operator input closed, leaving menu");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(error = %e, "action failed");
                    self.operator.warn(&format!("Error: {}", e));
                }
            }
        }
    }

    /// Show the main menu once and carry out the chosen action.
    pub async fn step(&self) -> Result<()> {
        let menu: Vec<Choice> = Action::ALL
            .iter()
            .map(|a| Choice::new(a.as_str(), a.as_str()))
            .collect();
        let picked = self.operator.select("What do you want to do?", &menu).await?;

        match Action::parse(&picked) {
            Some(Action::Query) => self.query().await,
            Some(Action::Tools) => self.tools().await,
            Some(Action::Resources) => self.resources().await,
            Some(Action::Prompts) => self.prompts().await,
            None => {
                self.operator.warn(&format!("Unknown action: {}", picked));
                Ok(())
            }
        }
    }

    async fn query(&self) -> Result<()> {
        actions::run_query(
            &self.provider,
            self.operator.as_ref(),
            self.generator.as_ref(),
            &self.capabilities.tools,
        )
        .await
    }

    async fn tools(&self) -> Result<()> {
        let choices = self.capabilities.tool_choices();
        if choices.is_empty() {
            self.operator.warn("No tools available");
            return Ok(());
        }

        let name = self.operator.select("Select a tool", &choices).await?;
        match self.capabilities.tool(&name) {
            Some(tool) => {
                actions::invoke_tool(self.provider.as_ref(), self.operator.as_ref(), tool).await
            }
            None => {
                self.operator.warn("Tool not found");
                Ok(())
            }
        }
    }

    async fn resources(&self) -> Result<()> {
        let choices = self.capabilities.resource_choices();
        if choices.is_empty() {
            self.operator.warn("No resources available");
            return Ok(());
        }

        let value = self.operator.select("Select a resource", &choices).await?;
        match self.capabilities.resource_uri(&value) {
            Some(uri) => {
                actions::read_resource(self.provider.as_ref(), self.operator.as_ref(), uri).await
            }
            None => {
                self.operator.warn("Resource not found");
                Ok(())
            }
        }
    }

    async fn prompts(&self) -> Result<()> {
        let choices = self.capabilities.prompt_choices();
        if choices.is_empty() {
            self.operator.warn("No prompts available");
            return Ok(());
        }

        let name = self.operator.select("Select a prompt", &choices).await?;
        match self.capabilities.prompt(&name) {
            Some(prompt) => {
                actions::run_prompt(
                    self.provider.as_ref(),
                    self.operator.as_ref(),
                    self.generator.as_ref(),
                    prompt,
                )
                .await
            }
            None => {
                self.operator.warn("Prompt not found");
                Ok(())
            }
        }
    }
}
