pub mod capability;
pub mod cypher_qa;
pub mod general_chat;
pub mod paragraph_search;
pub mod policy;
pub mod prompt;
pub mod router;

pub use capability::Capability;
pub use router::CapabilityRouter;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::graph::GraphError;
use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("history store error: {0}")]
    History(#[from] DatabaseError),

    #[error("capability selection failed: {0}")]
    Selection(String),
}
