//! Test doubles shared across the workspace.

pub mod catalog;
pub mod snapshot;
pub mod transport;

pub use crate::catalog::MemoryCatalog;
pub use crate::transport::{RecordedRequest, ScriptedTransport};
