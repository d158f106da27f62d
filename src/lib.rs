//! edgeroute - edge/cloud request router for self-hosted LLMs
//!
//! Decides, per request, whether a cheap local model or a larger cloud model
//! answers it, and builds the persona-aware prompt sent to that model. A
//! deterministic length rule handles long requests; everything else is
//! classified by an auxiliary model whose answer is validated and, when
//! unusable, replaced by a safe local default.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod persona;
pub mod router;
pub mod session;
pub mod telemetry;
