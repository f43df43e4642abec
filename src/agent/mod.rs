//! Parallel search-agent pipeline.
//!
//! Architecture: one keyword/safety orchestration call per section, then
//! parallel search agents (each one retrieval call + one format call), run as
//! a cascade: presidents fan-out first, leaders fan-out started once by the
//! first presidents completion, scriptures fan-out after leaders, then a
//! closing summary pass. Results stream out as each agent finishes.

pub mod gemini;
pub mod orchestrator;
pub mod prompts;
pub mod safety;
pub mod tasks;
pub mod toolbox;
pub mod types;

pub use gemini::*;
pub use orchestrator::*;
pub use safety::*;
pub use tasks::*;
pub use toolbox::*;
pub use types::*;

use thiserror::Error;

/// Errors from the agent pipeline and its backends.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("GEMINI_API_KEY is required")]
    MissingApiKey,

    #[error("cannot reach generation API at {0}")]
    GeminiConnection(String),

    #[error("generation API error (status {status}): {body}")]
    GeminiApi { status: u16, body: String },

    #[error("cannot reach toolbox at {0}")]
    ToolboxConnection(String),

    #[error("toolbox error (status {status}): {body}")]
    ToolboxApi { status: u16, body: String },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool {name} failed: {detail}")]
    ToolFailed { name: String, detail: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("{stage} orchestrator failed: {detail}")]
    Orchestrator {
        stage: &'static str,
        detail: String,
    },

    #[error("blocked: {0}")]
    Blocked(String),

    #[error("format failed: {0}")]
    Format(String),
}
