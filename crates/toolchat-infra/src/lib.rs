//! Infrastructure layer for toolchat.
//!
//! Implements the ports defined in `toolchat-core`: SQLite session storage,
//! an OpenAI-compatible streaming model client, and the built-in HTTP tools.
//! Also loads `config.toml` from the data directory.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod tools;
