//! At-most-once persistence of conversation turns.

pub mod ledger;
pub mod synchronizer;
