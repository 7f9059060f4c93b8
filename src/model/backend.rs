//! The language-model backend seam.
//!
//! The decision core only needs one capability: turn a prompt into candidate
//! completions and report what they cost. [`Backend`] captures that seam;
//! [`MockBackend`] replays scripted generations so the whole decision loop
//! can be tested without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;

use crate::config::SamplingParams;
use crate::model::api::ChatMessage;

/// A prompt in the form a backend expects.
#[derive(Debug, Clone)]
pub enum Prompt {
    /// A plain text prompt for completion-style models.
    Text(String),
    /// A chat-style message list.
    Chat(Vec<ChatMessage>),
}

/// One backend reply: candidate completions plus the dollar cost the
/// provider reported for producing them.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub samples: Vec<String>,
    pub cost: f64,
}

impl Generation {
    pub fn new(sample: impl Into<String>, cost: f64) -> Self {
        Self {
            samples: vec![sample.into()],
            cost,
        }
    }
}

/// Anything that can turn a prompt into text completions.
///
/// Implementations own their retry policy for transient transport failures;
/// an error returned here is fatal to the in-flight decision step.
#[allow(async_fn_in_trait)]
pub trait Backend: Send + Sync {
    async fn generate(&self, prompt: &Prompt, params: &SamplingParams) -> Result<Generation>;
}

/// A scripted backend for tests: hands out queued generations in order and
/// records every prompt it was asked to complete.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Generation>>,
    calls: Mutex<Vec<Prompt>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply; replies are consumed in push order.
    pub fn push_reply(&self, sample: impl Into<String>, cost: f64) {
        self.replies
            .lock()
            .expect("mock reply queue poisoned")
            .push_back(Generation::new(sample, cost));
    }

    /// Every prompt seen so far, in call order.
    pub fn calls(&self) -> Vec<Prompt> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call log poisoned").len()
    }
}

impl Backend for MockBackend {
    async fn generate(&self, prompt: &Prompt, _params: &SamplingParams) -> Result<Generation> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(prompt.clone());
        let reply = self
            .replies
            .lock()
            .expect("mock reply queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Generation::new("", 0.0));
        Ok(reply)
    }
}
