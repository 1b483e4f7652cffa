//! mcp-console: an interactive MCP client.
//!
//! Connects to a capability provider, snapshots its tools, resources and
//! prompts, and lets an operator invoke them from a menu. Free-text queries
//! and provider sampling requests go to a hosted language model.

pub mod actions;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod generation;
pub mod handler;
pub mod model;
pub mod operator;
pub mod provider;
pub mod sampling;
pub mod session;
pub mod testutils;

pub use capabilities::CapabilitySet;
pub use config::Config;
pub use error::{ClientError, Result};
pub use generation::{GeminiGenerator, Generator};
pub use handler::ConsoleClient;
pub use operator::{Operator, TerminalOperator};
pub use provider::{CapabilityProvider, McpProvider};
pub use session::Session;
