//! Shared types, collaborator traits and runtime plumbing

pub mod errors;
pub mod log_buffer;
pub mod shutdown;
pub mod traits;
pub mod types;
