//! Input channels for termagent.
//!
//! Only the interactive terminal is supported; queries are read one line at
//! a time and handed to the agent loop strictly in order.

pub mod cli;

pub use cli::{ChannelError, CliChannel, InputLine};
