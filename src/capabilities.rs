use crate::error::Result;
use crate::model::{Prompt, Resource, ResourceTemplate, Tool};
use crate::operator::Choice;
use crate::provider::CapabilityProvider;

/// What the provider advertised at connect time. Never refreshed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilitySet {
    pub tools: Vec<Tool>,
    pub prompts: Vec<Prompt>,
    pub resources: Vec<Resource>,
    pub resource_templates: Vec<ResourceTemplate>,
}

impl CapabilitySet {
    /// Fetch all four listings concurrently; any failure aborts the fetch.
    pub async fn fetch(provider: &dyn CapabilityProvider) -> Result<Self> {
        let (tools, prompts, resources, resource_templates) = tokio::try_join!(
            provider.list_tools(),
            provider.list_prompts(),
            provider.list_resources(),
            provider.list_resource_templates(),
        )?;

        tracing::info!(
            tools = tools.len(),
            prompts = prompts.len(),
            resources = resources.len(),
            resource_templates = resource_templates.len(),
            "fetched provider capabilities"
        );

        Ok(Self {
            tools,
            prompts,
            resources,
            resource_templates,
        })
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.name == name)
    }

    /// Resolve a menu value to a concrete uri or a uri template.
    pub fn resource_uri(&self, value: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.uri == value)
            .map(|r| r.uri.as_str())
            .or_else(|| {
                self.resource_templates
                    .iter()
                    .find(|t| t.uri_template == value)
                    .map(|t| t.uri_template.as_str())
            })
    }

    pub fn tool_choices(&self) -> Vec<Choice> {
        self.tools
            .iter()
            .map(|t| Choice::new(t.label(), &t.name).with_description(t.description.clone()))
            .collect()
    }

    /// Concrete resources first, then templates.
    pub fn resource_choices(&self) -> Vec<Choice> {
        let concrete = self
            .resources
            .iter()
            .map(|r| Choice::new(&r.name, &r.uri).with_description(r.description.clone()));
        let templated = self.resource_templates.iter().map(|t| {
            Choice::new(&t.name, &t.uri_template).with_description(t.description.clone())
        });
        concrete.chain(templated).collect()
    }

    pub fn prompt_choices(&self) -> Vec<Choice> {
        self.prompts
            .iter()
            .map(|p| Choice::new(&p.name, &p.name).with_description(p.description.clone()))
            .collect()
    }
}
