pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
