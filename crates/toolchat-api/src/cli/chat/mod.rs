//! Interactive chat for toolchat.
//!
//! The landing prompt captures a first message, the conversation loop
//! streams replies with tool progress, and Ctrl+C during a reply tears the
//! conversation down and re-opens it from storage. Entry point:
//! `loop_runner::run_chat`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
