//! The four things an operator can do from the main menu.

mod prompts;
mod query;
mod resources;
mod tools;

pub use prompts::run_prompt;
pub use query::{normalized_schema, run_query, tool_table, NO_TEXT_GENERATED};
pub use resources::{placeholders, read_resource, resolve_uri};
pub use tools::invoke_tool;
