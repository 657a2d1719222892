//! Shared domain types for the Writers' Room dialog engine.
//!
//! This crate contains the types passed between the orchestration core, the
//! infrastructure adapters and the CLI: character profiles, scene
//! definitions, the dialog wire protocol, production results, LLM request
//! shapes, configuration and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod character;
pub mod config;
pub mod dialog;
pub mod error;
pub mod event;
pub mod llm;
pub mod production;
pub mod scene;
