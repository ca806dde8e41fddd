/// Environment lookup helpers and the startup configuration error.
pub mod env;
/// Shared text helpers for log output.
pub mod text;

pub use env::{ConfigurationError, ProcessEnv, VarSource};
