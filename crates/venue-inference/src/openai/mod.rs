//! OpenAI-compatible extraction backend.
//!
//! Works with any endpoint that implements chat completions with
//! `response_format: json_schema` (OpenAI, Azure OpenAI, vLLM, LM Studio).
//!
//! # Example
//!
//! ```rust,no_run
//! use venue_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! let config = OpenAIConfig {
//!     base_url: "http://localhost:8000/v1".to_string(),
//!     api_key: None,
//!     model: "qwen2.5-7b-instruct".to_string(),
//!     timeout_seconds: 30,
//! };
//! let backend = OpenAIBackend::new(config).unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_OPENAI_URL};
pub use error::{to_venue_error, OpenAIErrorCode};
pub use types::*;
