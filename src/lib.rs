//! Job evaluation pipeline.
//!
//! Pages candidate job postings out of a streaming source, drops duplicates
//! and postings that fail static criteria, then runs each survivor through a
//! small task graph: a relevance gate, two concurrent skill-extraction tasks,
//! and a persistence node. Every evaluated posting ends up in the store,
//! including irrelevant and filtered ones, so later runs can dedup against
//! them.
//!
//! The seams are traits: [`source::PostingSource`] for ingestion,
//! [`store::PostingStore`] for persistence, and
//! [`capability::CapabilityProvider`] for LLM completions and embeddings.
//! [`pipeline::PipelineDriver`] wires them together.

pub mod capability;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod store;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{PipelineDriver, PipelineReport};
