//! The decision core: world state in, one chosen action out.
//!
//! The pipeline per decision step:
//!
//! 1. [`narrate`] renders the [`StepInput`] snapshot into a progress
//!    paragraph.
//! 2. [`actions`] derives the legal next actions and their letter labels.
//! 3. [`controller`] assembles the prompt(s), queries the backend, and
//! 4. [`parse`] maps the model's free-text reply back onto one action.
//!
//! [`goal`] renders the episode goal once per reset; [`state`] holds the
//! snapshot types the orchestrator fills in.

pub mod actions;
pub mod controller;
pub mod goal;
pub mod narrate;
pub mod parse;
pub mod state;

pub use actions::{enumerate_actions, ActionMenu};
pub use controller::{MessageTelemetry, StepOutcome, Telemetry, TransportAgent};
pub use goal::{describe_goal, GoalSpec};
pub use narrate::{progress_text, EPISODE_STEP_LIMIT};
pub use parse::parse_answer;
pub use state::{
    Exploration, Holding, ObjectKind, ObjectRef, OpponentView, RoomContents, StepInput,
};
