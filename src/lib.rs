//! Porter: language-model-driven decision making for cooperative
//! object-transport agents.
//!
//! Two embodied agents share a household scene in which target objects and
//! containers are scattered across rooms and must be carried to a goal bed.
//! Porter is the decision core of one such agent: it renders a structured
//! world-state snapshot into a natural-language progress report, enumerates
//! the legal next actions, queries a language-model backend (optionally with
//! chain-of-thought reasoning and a free-text message to the partner), and
//! parses the model's reply back onto exactly one of the enumerated actions.
//!
//! Environment simulation, action execution, and inter-process orchestration
//! live elsewhere; the orchestrator feeds a fresh [`agent::StepInput`] into
//! [`agent::TransportAgent::run`] every decision step.

pub mod agent;
pub mod config;
pub mod model;
