//! Conversation protocol and repository trait definitions for toolchat.
//!
//! This crate defines the "ports" (`SessionStore`, `InferenceProvider`,
//! `ModelClient`, `Tool`) that the infrastructure layer implements, and the
//! logic that runs on top of them: message format conversion, stream
//! aggregation, at-most-once persistence, and the session lifecycle.
//! It depends only on `toolchat-types` -- never on `toolchat-infra`.

pub mod chat;
pub mod convert;
pub mod llm;
pub mod session;
pub mod stream;
pub mod sync;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;
