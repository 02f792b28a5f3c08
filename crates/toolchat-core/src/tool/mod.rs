//! Tool port and the catalog the step loop dispatches through.

pub mod catalog;
