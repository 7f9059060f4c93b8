//! Language-model plumbing: the backend seam, an OpenAI-compatible client,
//! and prompt templates.

pub mod api;
pub mod backend;
pub mod template;

pub use api::{ChatMessage, OpenAiBackend, Usage};
pub use backend::{Backend, Generation, MockBackend, Prompt};
pub use template::{PromptTemplate, PromptVars, TemplateFile};
