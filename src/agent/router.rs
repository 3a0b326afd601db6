//! Capability router: one capability per turn.
//!
//! The router reads the session's prior turns, asks the selection policy
//! for a capability name, and invokes exactly that capability with the
//! utterance and history. When selection fails or names nothing known,
//! the first capability (General Chat) answers. After a completed
//! exchange both turns are appended to the session history so subsequent
//! turns see full context.

use std::sync::Arc;

use crate::session::history::ChatHistory;

use super::capability::Capability;
use super::policy::SelectionPolicy;
use super::AgentError;

pub struct CapabilityRouter {
    capabilities: Vec<Box<dyn Capability>>,
    policy: Box<dyn SelectionPolicy>,
    history: Arc<dyn ChatHistory>,
}

impl CapabilityRouter {
    /// The first capability is the fallback when selection fails.
    pub fn new(
        capabilities: Vec<Box<dyn Capability>>,
        policy: Box<dyn SelectionPolicy>,
        history: Arc<dyn ChatHistory>,
    ) -> Self {
        debug_assert!(!capabilities.is_empty());
        Self {
            capabilities,
            policy,
            history,
        }
    }

    /// Answer one utterance for a session.
    pub fn respond(&self, session_id: &str, utterance: &str) -> Result<String, AgentError> {
        let history = self.history.turns(session_id)?;

        let specs: Vec<(String, String)> = self
            .capabilities
            .iter()
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect();

        let capability = match self.policy.select(utterance, &specs) {
            Ok(name) => match self.capabilities.iter().find(|c| c.name() == name) {
                Some(capability) => capability,
                None => {
                    tracing::warn!(name, "policy chose an unknown capability; using fallback");
                    &self.capabilities[0]
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "capability selection failed; using fallback");
                &self.capabilities[0]
            }
        };

        tracing::info!(session_id, capability = capability.name(), "routing utterance");
        let reply = capability.handle(utterance, &history)?;

        self.history.append_exchange(session_id, utterance, &reply)?;
        Ok(reply)
    }
}
