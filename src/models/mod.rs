//! Model endpoint clients
//!
//! Thin wrappers around `open-agent-sdk` for querying OpenAI-compatible
//! endpoints, and the backend dispatcher that serves a routing decision.

pub mod dispatch;
pub mod query;

pub use dispatch::{Backend, EndpointBackend};
pub use query::query_model;
