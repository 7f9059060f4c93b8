//! Per-step decision orchestration.
//!
//! One [`TransportAgent`] drives one embodied agent for the lifetime of an
//! episode: narrate progress, optionally generate a partner message,
//! enumerate actions, query the backend (in one pass or in a two-stage
//! chain-of-thought), and parse the reply back onto an enumerated action.
//! Backend calls are strictly sequential; the reasoning stage's output feeds
//! the answer stage's prompt.

use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::actions::enumerate_actions;
use crate::agent::goal::{describe_goal, GoalSpec};
use crate::agent::narrate::progress_text;
use crate::agent::parse::parse_answer;
use crate::agent::state::StepInput;
use crate::config::{AgentConfig, Persona};
use crate::model::api::ChatMessage;
use crate::model::backend::{Backend, Prompt};
use crate::model::template::{PromptTemplate, PromptVars, TemplateFile};

/// How many recent actions are quoted back into the prompt.
const ACTION_HISTORY_WINDOW: usize = 10;
/// How many recent dialogue lines are quoted back into the prompt.
const DIALOGUE_HISTORY_WINDOW: usize = 3;
/// Instruction appended after the reasoning stage to force a single answer.
const ANSWER_INSTRUCTION: &str =
    "Answer with only one best next action. So the answer is option";

static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted-span pattern is valid"));

/// Telemetry from the message-generation sub-call.
#[derive(Debug, Clone, Serialize)]
pub struct MessageTelemetry {
    pub prompt: String,
    /// All sampled generator outputs.
    pub outputs: Vec<String>,
    pub cost: f64,
}

/// Telemetry for one decision step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Telemetry {
    pub num_available_actions: usize,
    /// The prompt behind the final answer, in its concatenated text form.
    pub prompt: String,
    /// The raw model output the action was parsed from.
    pub output: String,
    /// How the output was matched to an action.
    pub parse_method: String,
    /// Running cost across the controller's lifetime, in dollars.
    pub total_cost: f64,
    pub message: Option<MessageTelemetry>,
}

/// The result of one call to [`TransportAgent::run`].
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The chosen action, or `None` when no action was available.
    pub plan: Option<String>,
    pub telemetry: Telemetry,
}

/// The decision controller for one agent.
pub struct TransportAgent<B> {
    backend: B,
    template: PromptTemplate,
    persona: Persona,
    config: AgentConfig,
    goal_desc: String,
    rooms: Vec<String>,
    total_cost: f64,
}

impl<B: Backend> TransportAgent<B> {
    /// Build a controller from a backend, a raw template file, and a
    /// configuration. Template placeholders are validated here.
    pub fn new(backend: B, template: TemplateFile, config: AgentConfig) -> Result<Self> {
        let persona = Persona::from_agent_id(config.agent_id, config.single);
        let template = PromptTemplate::new(template, &persona)?;
        if config.communication && !template.has_generator() {
            bail!("communication is enabled but the template has no message-generation block");
        }
        Ok(Self {
            backend,
            template,
            persona,
            config,
            goal_desc: String::new(),
            rooms: Vec::new(),
            total_cost: 0.0,
        })
    }

    /// Start a new episode: fix the room list and render the goal sentence.
    pub fn reset(&mut self, rooms: Vec<String>, goal: &GoalSpec) {
        self.rooms = rooms;
        self.goal_desc = describe_goal(goal);
    }

    /// The goal sentence rendered at the last reset.
    pub fn goal_description(&self) -> &str {
        &self.goal_desc
    }

    /// Total backend cost accumulated over the controller's lifetime.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Decide the next action for a fresh world-state snapshot.
    pub async fn run(&mut self, input: &StepInput) -> Result<StepOutcome> {
        debug!(step = input.step, room = %input.current_room, "deciding next action");

        let progress = progress_text(&self.persona, &self.rooms, input);
        let action_history = tail_join(&input.action_history, ACTION_HISTORY_WINDOW, ", ");
        let dialogue_history = tail_join(&input.dialogue_history, DIALOGUE_HISTORY_WINDOW, "\n");
        let vars = PromptVars {
            goal: &self.goal_desc,
            progress: &progress,
            action_history: &action_history,
            dialogue_history: self
                .config
                .communication
                .then_some(dialogue_history.as_str()),
        };
        let prompt = self.template.decision_base(&vars);

        let mut message = None;
        let mut message_telemetry = None;
        if self.config.communication && !last_action_was_message(&input.action_history) {
            let generator_prompt = self
                .template
                .generator_prompt(&vars)
                .context("message generation requires a generator template")?;
            let generation = self
                .backend
                .generate(&self.wrap(generator_prompt.clone()), &self.config.sampling)
                .await?;
            self.total_cost += generation.cost;
            let raw = generation.samples.first().cloned().unwrap_or_default();
            let extracted = extract_message(&raw);
            debug!(message = %extracted, "generated partner message");
            message_telemetry = Some(MessageTelemetry {
                prompt: generator_prompt,
                outputs: generation.samples,
                cost: generation.cost,
            });
            message = Some(extracted);
        }

        let menu = enumerate_actions(&self.rooms, input, message.as_deref());
        // A lone send-message option means there is nothing actually to do.
        if menu.count == 0 || (message.is_some() && menu.count == 1) {
            warn!(count = menu.count, "no available actions this step");
            return Ok(StepOutcome {
                plan: None,
                telemetry: Telemetry {
                    num_available_actions: menu.count,
                    total_cost: self.total_cost,
                    message: message_telemetry,
                    ..Telemetry::default()
                },
            });
        }
        let prompt = prompt.replace("$AVAILABLE_ACTIONS$", &menu.listing);

        let (final_prompt, output) = if self.config.cot {
            self.decide_with_reasoning(prompt).await?
        } else {
            let generation = self
                .backend
                .generate(&self.wrap(prompt.clone()), &self.config.sampling)
                .await?;
            self.total_cost += generation.cost;
            (
                prompt,
                generation.samples.first().cloned().unwrap_or_default(),
            )
        };

        let (plan, parse_method) = parse_answer(&menu.actions, &output);
        info!(plan = %plan, parse_method, "action selected");
        Ok(StepOutcome {
            plan: Some(plan),
            telemetry: Telemetry {
                num_available_actions: menu.count,
                prompt: final_prompt,
                output,
                parse_method: parse_method.to_string(),
                total_cost: self.total_cost,
                message: message_telemetry,
            },
        })
    }

    /// Two-stage chain-of-thought: free-form reasoning first, then a forced
    /// single-option answer conditioned on that reasoning.
    async fn decide_with_reasoning(&mut self, prompt: String) -> Result<(String, String)> {
        let cot_prompt = format!("{prompt} Let's think step by step.");
        let generation = self
            .backend
            .generate(&self.wrap(cot_prompt.clone()), &self.config.sampling)
            .await?;
        self.total_cost += generation.cost;

        let mut reasoning = generation.samples.first().cloned().unwrap_or_default();
        // Drop any trailing unfinished sentence.
        match reasoning.rfind('.') {
            Some(index) => reasoning.truncate(index + 1),
            None => reasoning.push('.'),
        }
        debug!(reasoning = %reasoning, "reasoning stage complete");

        let full_prompt = format!("{cot_prompt} {reasoning} {ANSWER_INSTRUCTION}");
        let answer_prompt = if self.config.chat {
            Prompt::Chat(vec![
                ChatMessage::user(cot_prompt),
                ChatMessage::assistant(reasoning),
                ChatMessage::user(ANSWER_INSTRUCTION),
            ])
        } else {
            Prompt::Text(full_prompt.clone())
        };
        let generation = self
            .backend
            .generate(&answer_prompt, &self.config.sampling)
            .await?;
        self.total_cost += generation.cost;
        let output = generation.samples.first().cloned().unwrap_or_default();
        Ok((full_prompt, output))
    }

    fn wrap(&self, text: String) -> Prompt {
        if self.config.chat {
            Prompt::Chat(vec![ChatMessage::user(text)])
        } else {
            Prompt::Text(text)
        }
    }
}

fn tail_join(items: &[String], window: usize, separator: &str) -> String {
    let start = items.len().saturating_sub(window);
    items[start..].join(separator)
}

fn last_action_was_message(history: &[String]) -> bool {
    history
        .last()
        .is_some_and(|action| action.starts_with("send a message"))
}

/// Pull the partner-directed message out of a raw generator completion.
///
/// Output that already opens with a quote is kept as-is; otherwise the first
/// double-quoted span is taken, or the trimmed raw text when none exists.
fn extract_message(raw: &str) -> String {
    if raw.starts_with('"') {
        return raw.to_string();
    }
    match QUOTED_SPAN.captures(raw) {
        Some(caps) => format!("\"{}\"", &caps[1]),
        None => raw.trim().to_string(),
    }
}
