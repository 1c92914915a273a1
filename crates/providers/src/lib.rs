//! LLM provider implementations.
//!
//! One backend today: [`OpenAiCompatProvider`], which covers OpenAI,
//! OpenRouter, Ollama, and anything else speaking the same dialect.

pub mod openai;

pub use openai::OpenAiCompatProvider;
