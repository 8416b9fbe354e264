//! # termagent core
//!
//! Domain types, traits, and error definitions for the termagent step-protocol
//! agent. Every subsystem the agent loop talks to is defined as a trait here;
//! implementations live in their respective crates:
//!
//! - [`Provider`] in `termagent-providers`
//! - [`Tool`] in `termagent-tools`
//!
//! This keeps the loop testable against scripted providers and tools, and
//! keeps the dependency graph pointing inward at this crate.

pub mod error;
pub mod message;
pub mod provider;
pub mod step;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProtocolError, ProviderError, Result, ToolError};
pub use message::{ConversationId, Message, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, Usage};
pub use step::StepRecord;
pub use tool::{Tool, ToolId, ToolRegistry};
