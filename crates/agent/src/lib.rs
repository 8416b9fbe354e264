//! The core agent loop for termagent.
//!
//! The agent follows a **think → act → observe → output** protocol:
//!
//! 1. **Receive** a user query and start a fresh transcript
//! 2. **Send to the model** through the current fallback candidate
//! 3. **Decode** the reply as exactly one step record
//! 4. **If action**: run the tool, append its result as an observation, loop
//! 5. **If output**: return the answer
//!
//! Bad turns are fed back to the model; rate-limited or forbidden models are
//! swapped for the next candidate. Caps on invalid turns and total requests
//! guarantee every query ends.

pub mod loop_runner;
pub mod prompt;
pub mod step_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{AbortReason, AgentLoop, QueryOutcome};
pub use prompt::{default_system_prompt, system_prompt};
pub use step_event::{NoopSink, StepEvent, StepSink};
