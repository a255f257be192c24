//! Per-call reasoning policy.
//!
//! Decides whether reasoning is requested from the vendor and whether the
//! vendor should drop reasoning retained from earlier turns. The decision is
//! recomputed for every call from the host request and the adapter
//! configuration; nothing is remembered between calls. Reasoning the host
//! wants carried forward travels in the turn history itself (as thought
//! parts) and is forwarded unchanged by the request translator.

use crate::types::ThinkingConfig;
use crate::wire::{ThinkingParam, ThinkingType};

/// Adapter-level reasoning switches (from settings or CLI flags)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinkingPolicy {
    /// Never request reasoning.
    pub disable_thinking: bool,
    /// Ask the vendor to drop reasoning from prior turns. `None` means the
    /// default, which is to clear.
    pub clear_thinking: Option<bool>,
}

/// The per-call decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingState {
    pub requested: bool,
    pub clear_prior_thinking: bool,
}

impl ThinkingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable_thinking(mut self, disable: bool) -> Self {
        self.disable_thinking = disable;
        self
    }

    pub fn clear_thinking(mut self, clear: bool) -> Self {
        self.clear_thinking = Some(clear);
        self
    }

    /// Resolve the state for one call.
    ///
    /// An explicit host "no thoughts" (either `include_thoughts: false` or a
    /// zero thinking budget) wins over the adapter defaults.
    pub fn resolve(&self, host: Option<&ThinkingConfig>) -> ThinkingState {
        let host_declined = host.is_some_and(|config| {
            config.include_thoughts == Some(false) || config.thinking_budget == Some(0)
        });

        ThinkingState {
            requested: !self.disable_thinking && !host_declined,
            clear_prior_thinking: self.clear_thinking.unwrap_or(true),
        }
    }
}

impl From<ThinkingState> for ThinkingParam {
    fn from(state: ThinkingState) -> Self {
        ThinkingParam {
            kind: if state.requested {
                ThinkingType::Enabled
            } else {
                ThinkingType::Disabled
            },
            clear_thinking: state.clear_prior_thinking,
        }
    }
}
