//! Retrieval-augmented sermon chat.
//!
//! [`RagPipeline::answer`] routes a question against the conversation so far,
//! retrieves and groups sermon passages when new material is needed, and
//! generates a cited answer. [`RagPipeline::search`] exposes the retrieval and
//! grouping half on its own.

pub mod config;
pub mod context;
pub mod error;
pub mod grouper;
pub mod pipeline;
pub mod rewriter;
pub mod router;
pub mod sources;
pub mod types;

pub use config::{RagConfig, SearchConfig};
pub use context::ContextBuilder;
pub use error::RagError;
pub use grouper::PassageGrouper;
pub use pipeline::{RagPipeline, Stage};
pub use rewriter::QueryRewriter;
pub use router::QueryRouter;
pub use sources::{sources_for_retrieval, sources_from_history};
pub use types::{Answer, ChatMessage, ChatRole, GroupedResult, RouteDecision, SourceRef};
