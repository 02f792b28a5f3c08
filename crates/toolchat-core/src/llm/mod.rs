//! Inference boundary: the provider port, the raw model port, and the
//! tool-calling step loop that joins them.

pub mod history;
pub mod provider;
pub mod tool_loop;
