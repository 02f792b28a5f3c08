//! Session lifecycle: launch context, mode resolution, and the controller
//! that runs submissions against a session.

pub mod controller;
pub mod launch;
pub mod oneshot;
