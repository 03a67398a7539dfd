//! Terminal console for a GauzMem memory backend.
//!
//! GauzMem extracts facts and entity relations from conversations. This crate
//! talks to its admin and memory APIs and presents what it finds: dashboard
//! statistics, facts, chunks, search results, and, most importantly, relation
//! subgraphs. Each subgraph can be turned into a drawable graph and condensed
//! into a short memory paragraph by an LLM, with a deterministic fallback
//! when the LLM is unavailable.
//!
//! # Architecture
//!
//! - **Backend**: HTTP/JSON via `reqwest`, one explicit [`api::ApiConfig`] per client
//! - **Graphs**: pure builder from subgraph records to deduplicated nodes and
//!   aggregated edges; drawing goes through an injected [`graph::render::GraphRenderer`]
//! - **Summaries**: OpenAI-compatible `chat/completions`, `<think>` blocks stripped,
//!   template fallback in English or Chinese
//! - **Background work**: ingestion and flushes run on a queued tokio worker
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`api`]: backend client and wire types
//! - [`graph`]: graph data builder and renderers
//! - [`llm`]: completion client and output sanitization
//! - [`summary`]: LLM summarization and the fallback summarizer
//! - [`panel`]: relations panel pagination and per-subgraph card state
//! - [`tasks`]: fire-and-forget backend writes
//! - [`chat`]: memory-aware chat playground

pub mod api;
pub mod chat;
pub mod config;
pub mod graph;
pub mod llm;
pub mod panel;
pub mod summary;
pub mod tasks;
