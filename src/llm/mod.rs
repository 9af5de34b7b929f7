pub mod client;
pub mod types;

pub use client::{GeminiClient, LlmClient, model_path};
pub use types::*;
