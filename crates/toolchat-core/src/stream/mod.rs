//! Assembly of incremental inference events into messages.

pub mod aggregator;
pub mod driver;
