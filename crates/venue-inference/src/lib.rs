//! # venue-inference
//!
//! Extraction oracle for the venue enricher.
//!
//! This crate provides:
//! - OpenAI-compatible structured generation backend (feature `openai`)
//! - Extraction prompt and strict output schema
//! - Model-backed and heuristic extraction strategies
//! - Exponential backoff for transient model failures
//! - Country normalization and result sanitation
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable the OpenAI-compatible backend
//! - `mock`: Expose the scripted mock backend to dependent crates
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use venue_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use venue_inference::{ExtractionOracle, Oracle, RetryPolicy, CandidateRecord};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::new(OpenAIConfig::from_env()).unwrap();
//!     let oracle = Oracle::from_backend(Arc::new(backend), RetryPolicy::default(), 160);
//!     let record = CandidateRecord::new("v1").with_name("Blue Note, New York, USA");
//!     let resolution = oracle.resolve(&record).await;
//!     println!("{} / {}", resolution.result.city, resolution.result.country);
//! }
//! ```

pub mod heuristic;
pub mod normalize;
pub mod oracle;
pub mod prompts;
pub mod retry;

#[cfg(feature = "openai")]
pub mod openai;

// Mock generation backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use venue_core::*;

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};

pub use heuristic::HeuristicStrategy;
pub use normalize::{normalize_country, sanitize};
pub use oracle::{choose_strategy, parse_location, ModelStrategy, Oracle, StrategyChoice};
pub use prompts::{build_user_prompt, extraction_request, location_schema, SYSTEM_PROMPT};
pub use retry::RetryPolicy;
