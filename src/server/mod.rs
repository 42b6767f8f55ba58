//! Connection supervision: the accept loop and the operator console.

pub mod console;
pub mod listener;
