pub mod error;
pub mod llm;
pub mod database;
pub mod agent;
pub mod pipeline;
pub mod tracing;

pub use error::{AskDbError, Result};
