use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded to the language-model backend on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Maximum tokens to generate per completion.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Number of candidate completions to request.
    pub n: usize,
    /// Per-token log-probabilities to return (completion endpoints only).
    #[serde(default)]
    pub logprobs: Option<usize>,
    /// Echo the prompt back with the completion (completion endpoints only).
    #[serde(default)]
    pub echo: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.7,
            top_p: 1.0,
            n: 1,
            logprobs: None,
            echo: false,
        }
    }
}

/// Identity of this agent and its partner within an episode.
///
/// The two-agent pairing is fixed: agent 0 is Alice, agent 1 is Bob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// This agent's name, substituted for `$AGENT_NAME$` in templates.
    pub agent_name: String,
    /// The partner's name, substituted for `$OPPO_NAME$` in templates.
    pub oppo_name: String,
    /// Pronoun used when reporting the partner's state.
    pub oppo_pronoun: String,
    /// True when the agent works alone; partner reporting is skipped.
    pub single: bool,
}

impl Persona {
    /// Derive the fixed Alice/Bob pairing from the agent index.
    pub fn from_agent_id(agent_id: usize, single: bool) -> Self {
        let (agent_name, oppo_name, oppo_pronoun) = if agent_id == 0 {
            ("Alice", "Bob", "he")
        } else {
            ("Bob", "Alice", "she")
        };
        Self {
            agent_name: agent_name.to_string(),
            oppo_name: oppo_name.to_string(),
            oppo_pronoun: oppo_pronoun.to_string(),
            single,
        }
    }
}

/// Top-level configuration for a [`crate::agent::TransportAgent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Index of this agent: 0 for Alice, 1 for Bob.
    pub agent_id: usize,
    /// Generate and offer natural-language messages to the partner agent.
    pub communication: bool,
    /// Two-stage chain-of-thought prompting.
    pub cot: bool,
    /// Single-agent episodes: no partner section in the narration.
    pub single: bool,
    /// Send chat-style message lists rather than plain text prompts.
    pub chat: bool,
    pub sampling: SamplingParams,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: 0,
            communication: false,
            cot: false,
            single: false,
            chat: true,
            sampling: SamplingParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_agent_zero_is_alice() {
        let p = Persona::from_agent_id(0, false);
        assert_eq!(p.agent_name, "Alice");
        assert_eq!(p.oppo_name, "Bob");
        assert_eq!(p.oppo_pronoun, "he");
        assert!(!p.single);
    }

    #[test]
    fn test_persona_agent_one_is_bob() {
        let p = Persona::from_agent_id(1, true);
        assert_eq!(p.agent_name, "Bob");
        assert_eq!(p.oppo_name, "Alice");
        assert_eq!(p.oppo_pronoun, "she");
        assert!(p.single);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AgentConfig {
            agent_id: 1,
            communication: true,
            cot: true,
            ..AgentConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.agent_id, 1);
        assert!(parsed.communication);
        assert!(parsed.cot);
        assert_eq!(parsed.sampling.n, 1);
    }
}
