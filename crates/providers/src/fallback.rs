//! Model fallback: an ordered list of model candidates and a cursor into it.
//!
//! When the endpoint rejects a model for quota or permission reasons, the
//! agent loop advances to the next candidate and resubmits the unchanged
//! transcript. The cursor only ever moves forward: a model that degraded
//! stays de-prioritized for the rest of the process.

use serde::{Deserialize, Serialize};
use termagent_core::error::ProviderError;
use tracing::{info, warn};

/// One entry in the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub name: String,
}

impl ModelCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The fallback cursor. Never reset, never exceeds `candidates.len() - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackState {
    pub current_index: usize,
}

/// The ordered candidates plus the index of the one in use.
#[derive(Debug, Clone)]
pub struct ModelFallback {
    candidates: Vec<ModelCandidate>,
    state: FallbackState,
}

impl ModelFallback {
    /// Create a controller positioned at the first candidate.
    pub fn new(candidates: Vec<ModelCandidate>) -> Result<Self, ProviderError> {
        if candidates.is_empty() {
            return Err(ProviderError::NotConfigured(
                "No model candidates configured".into(),
            ));
        }
        Ok(Self {
            candidates,
            state: FallbackState::default(),
        })
    }

    /// Convenience constructor from model names.
    pub fn from_names<I, S>(names: I) -> Result<Self, ProviderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(ModelCandidate::new).collect())
    }

    /// The candidate requests should currently go to.
    pub fn current_model(&self) -> &ModelCandidate {
        &self.candidates[self.state.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    pub fn is_last(&self) -> bool {
        self.state.current_index + 1 >= self.candidates.len()
    }

    /// Move to the next candidate. Returns false, leaving the index parked
    /// at the last candidate, when none remain.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            warn!(
                model = %self.current_model(),
                total = self.candidates.len(),
                "Fallback: no model candidates left"
            );
            return false;
        }

        let from = self.current_model().name.clone();
        self.state.current_index += 1;
        info!(
            from = %from,
            to = %self.current_model(),
            index = self.state.current_index,
            total = self.candidates.len(),
            "Fallback: switching model"
        );
        true
    }
}
