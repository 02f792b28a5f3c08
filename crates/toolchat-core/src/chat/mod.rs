//! Session and message persistence for toolchat.
//!
//! `SessionStore` is the port the infrastructure layer implements;
//! `ChatService` layers ownership checks, timestamps, and title handling on top.

pub mod repository;
pub mod service;
pub mod title;
