//! Tool trait: the abstraction over agent capabilities.
//!
//! The set of tools the model may call is closed: every tool has a
//! [`ToolId`], and the registry is keyed by it. A name the model invents is
//! rejected at [`ToolId::parse`] instead of being an untyped lookup miss.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::ToolError;

/// Identifier of every tool the agent knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolId {
    /// `getWeatherInfo(cityName)`
    GetWeatherInfo,
    /// `executeCommand(command)`
    ExecuteCommand,
}

impl ToolId {
    pub const ALL: [ToolId; 2] = [ToolId::GetWeatherInfo, ToolId::ExecuteCommand];

    /// The name the model uses in `action` steps.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::GetWeatherInfo => "getWeatherInfo",
            ToolId::ExecuteCommand => "executeCommand",
        }
    }

    /// Resolve a wire name. Matching is exact.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A locally registered capability invoked with a single string input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which tool this is.
    fn id(&self) -> ToolId;

    /// Signature and description shown to the model in the system prompt.
    fn description(&self) -> &str;

    /// Run the tool.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// The registry of available tools, built once at startup.
pub struct ToolRegistry {
    tools: BTreeMap<ToolId, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same id.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.id(), tool);
    }

    /// Get a tool by id.
    pub fn get(&self, id: ToolId) -> Option<&dyn Tool> {
        self.tools.get(&id).map(|t| t.as_ref())
    }

    /// Resolve `name` and invoke the tool with `input`.
    pub async fn dispatch(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = ToolId::parse(name)
            .and_then(|id| self.get(id))
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(tool = %tool.id(), "Dispatching tool");
        tool.invoke(input).await
    }

    /// Registered tool ids, in declaration order.
    pub fn ids(&self) -> Vec<ToolId> {
        self.tools.keys().copied().collect()
    }

    /// `(id, description)` pairs for the system prompt.
    pub fn descriptions(&self) -> Vec<(ToolId, &str)> {
        self.tools
            .iter()
            .map(|(id, tool)| (*id, tool.description()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
