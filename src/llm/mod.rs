//! Text-generation provider abstraction.
//!
//! The classifier only needs "prompt in, text out", so the seam is a single
//! trait with an Ollama implementation behind it.

mod ollama;
mod provider;

pub use ollama::OllamaProvider;
pub use provider::{GenerationOptions, LlmError, TextGenerator};
