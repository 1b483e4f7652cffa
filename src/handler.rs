use std::sync::Arc;

use rmcp::{
    model::{
        ClientCapabilities, ClientInfo, CreateMessageRequestParam, CreateMessageResult,
        Implementation,
    },
    service::{RequestContext, RoleClient},
    ClientHandler, ErrorData as McpError,
};
use serde_json::json;

use crate::generation::Generator;
use crate::model::Message;
use crate::operator::Operator;
use crate::sampling;

/// The console's side of the MCP session: advertises sampling and answers
/// `sampling/createMessage` by asking the operator.
#[derive(Clone)]
pub struct ConsoleClient {
    operator: Arc<dyn Operator>,
    generator: Arc<dyn Generator>,
}

impl ConsoleClient {
    pub fn new(operator: Arc<dyn Operator>, generator: Arc<dyn Generator>) -> Self {
        Self {
            operator,
            generator,
        }
    }

    async fn sample(&self, params: &CreateMessageRequestParam) -> Result<CreateMessageResult, McpError> {
        let messages: Vec<Message> = serde_json::to_value(&params.messages)
            .and_then(serde_json::from_value)
            .map_err(|e| McpError::invalid_params(format!("Unsupported sampling messages: {}", e), None))?;

        let text = sampling::answer(self.operator.as_ref(), self.generator.as_ref(), &messages)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        sampling_reply(self.generator.model(), text)
    }
}

/// The synthetic reply returned to the provider.
fn sampling_reply(model: &str, text: String) -> Result<CreateMessageResult, McpError> {
    serde_json::from_value(json!({
        "role": "user",
        "model": model,
        "stopReason": "endTurn",
        "content": { "type": "text", "text": text },
    }))
    .map_err(|e| McpError::internal_error(format!("Failed to build sampling reply: {}", e), None))
}

impl ClientHandler for ConsoleClient {
    async fn create_message(
        &self,
        params: CreateMessageRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateMessageResult, McpError> {
        tracing::info!(messages = params.messages.len(), "provider requested sampling");
        self.sample(&params).await
    }

    fn get_info(&self) -> ClientInfo {
        let mut info = ClientInfo::default();
        info.capabilities = ClientCapabilities::builder().enable_sampling().build();
        info.client_info = Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Implementation::from_build_env()
        };
        info
    }
}
