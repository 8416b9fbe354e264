//! Built-in tool implementations for termagent.
//!
//! The agent can look up the weather and run shell commands on the user's
//! machine. Both take a single string input.

pub mod shell;
pub mod weather;

use termagent_config::ToolsConfig;
use termagent_core::tool::ToolRegistry;

pub use shell::ShellTool;
pub use weather::WeatherTool;

/// Create the tool registry with every built-in tool.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WeatherTool));
    registry.register(Box::new(ShellTool::new(config.command_timeout_secs)));
    registry
}
