//! Generative-text collaborator for Pickwise.
//!
//! Everything that talks to a language model lives here:
//! - `llm` - the `LlmClient` seam and its error type
//! - `openrouter` - OpenRouter-compatible chat-completions backend
//! - `fallback` - prioritized backends, first success wins
//! - `extraction` - model-backed extraction strategy for the core chain
//! - `explain` / `answer` - recommendation explanations and document Q&A
//!
//! The model never decides scores or prices. Every call has a deterministic
//! fallback in the core, so a missing key or an exhausted account degrades
//! output instead of failing requests.

pub mod answer;
pub mod explain;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod openrouter;
pub mod prompts;
pub mod runtime;

pub use answer::{Answer, Answerer, AskError};
pub use explain::{Explainer, Explanation, ExplanationSource};
pub use llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};
pub use runtime::{AgentRuntime, GenerationSettings};
