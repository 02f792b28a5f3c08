//! Shared domain types for toolchat.
//!
//! Sessions, stored and rich messages, inference stream events, tool
//! definitions, configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod stream;
pub mod tool;
