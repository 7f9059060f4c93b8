//! Prompt templates with `$PLACEHOLDER$` substitution.
//!
//! A template file carries two text blocks: the decision prompt and, for
//! communication runs, the message-generation prompt. Agent names are
//! substituted once at construction and the expected placeholders are
//! validated there, so a malformed template surfaces before the first
//! decision step rather than in the middle of an episode.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Persona;

const AGENT_NAME: &str = "$AGENT_NAME$";
const OPPO_NAME: &str = "$OPPO_NAME$";
const GOAL: &str = "$GOAL$";
const PROGRESS: &str = "$PROGRESS$";
const ACTION_HISTORY: &str = "$ACTION_HISTORY$";
const DIALOGUE_HISTORY: &str = "$DIALOGUE_HISTORY$";
const AVAILABLE_ACTIONS: &str = "$AVAILABLE_ACTIONS$";

/// On-disk template shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    /// The decision-prompt template.
    pub prompt: String,
    /// The message-generation template; required for communication runs.
    #[serde(default)]
    pub generator: Option<String>,
}

/// Values substituted into a template for one decision step.
#[derive(Debug, Clone, Copy)]
pub struct PromptVars<'a> {
    pub goal: &'a str,
    pub progress: &'a str,
    pub action_history: &'a str,
    /// Present only when communication is enabled.
    pub dialogue_history: Option<&'a str>,
}

/// A validated template pair with agent names already substituted.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    agent_name: String,
    decision: String,
    generator: Option<String>,
}

impl PromptTemplate {
    pub fn new(file: TemplateFile, persona: &Persona) -> Result<Self> {
        let decision = file
            .prompt
            .replace(AGENT_NAME, &persona.agent_name)
            .replace(OPPO_NAME, &persona.oppo_name);
        for marker in [GOAL, PROGRESS, ACTION_HISTORY, AVAILABLE_ACTIONS] {
            if !decision.contains(marker) {
                bail!("decision template is missing the {marker} placeholder");
            }
        }

        let generator = match file.generator {
            Some(generator) => {
                let generator = generator
                    .replace(AGENT_NAME, &persona.agent_name)
                    .replace(OPPO_NAME, &persona.oppo_name);
                for marker in [GOAL, PROGRESS, ACTION_HISTORY] {
                    if !generator.contains(marker) {
                        bail!("message template is missing the {marker} placeholder");
                    }
                }
                Some(generator)
            }
            None => None,
        };

        Ok(Self {
            agent_name: persona.agent_name.clone(),
            decision,
            generator,
        })
    }

    pub fn from_json_file(path: &Path, persona: &Persona) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template from {}", path.display()))?;
        let file: TemplateFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse template from {}", path.display()))?;
        Self::new(file, persona)
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Fill the decision template, leaving `$AVAILABLE_ACTIONS$` in place;
    /// the action listing is substituted once enumeration has run.
    pub fn decision_base(&self, vars: &PromptVars<'_>) -> String {
        fill(&self.decision, vars)
    }

    /// Fill the message-generation template. The prompt ends with
    /// `"\n{agent_name}:"` so the model completes the agent's own utterance.
    pub fn generator_prompt(&self, vars: &PromptVars<'_>) -> Option<String> {
        let generator = self.generator.as_ref()?;
        Some(format!("{}\n{}:", fill(generator, vars), self.agent_name))
    }
}

fn fill(template: &str, vars: &PromptVars<'_>) -> String {
    let mut prompt = template
        .replace(GOAL, vars.goal)
        .replace(PROGRESS, vars.progress)
        .replace(ACTION_HISTORY, vars.action_history);
    if let Some(dialogue) = vars.dialogue_history {
        prompt = prompt.replace(DIALOGUE_HISTORY, dialogue);
    }
    prompt
}
