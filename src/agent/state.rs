//! World-state snapshot types supplied by the orchestrator.
//!
//! Nothing here persists across decision steps: the orchestrator assembles a
//! fresh [`StepInput`] for every call to
//! [`TransportAgent::run`](crate::agent::TransportAgent::run), so the decision
//! core never carries stale observations. Only the room list and the goal
//! sentence survive an episode, fixed at reset time.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of thing an [`ObjectRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// An object the goal asks to transport.
    Target,
    /// A container that can carry several target objects at once.
    Container,
    /// The goal position marker.
    Bed,
}

/// A reference to one object in the scene.
///
/// Identity is the `id`; `name` is a display label and is not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    pub id: String,
    pub kind: ObjectKind,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, id: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            kind,
        }
    }
}

impl fmt::Display for ObjectRef {
    /// The `<name> (id)` form used in narration and action strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> ({})", self.name, self.id)
    }
}

/// One hand of an agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Holding {
    #[default]
    Empty,
    Target(ObjectRef),
    Container {
        container: ObjectRef,
        /// Fixed-capacity slots: an occupied prefix followed by a `None`
        /// padded tail. The capacity never changes after pickup.
        contents: Vec<Option<ObjectRef>>,
    },
}

impl Holding {
    pub fn is_empty(&self) -> bool {
        matches!(self, Holding::Empty)
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Holding::Target(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Holding::Container { .. })
    }

    /// A container is full when its last slot is occupied.
    pub fn is_full_container(&self) -> bool {
        matches!(
            self,
            Holding::Container { contents, .. } if matches!(contents.last(), Some(Some(_)))
        )
    }

    /// The occupied prefix of a held container, empty for anything else.
    pub fn contained(&self) -> Vec<&ObjectRef> {
        match self {
            Holding::Container { contents, .. } => {
                contents.iter().map_while(|slot| slot.as_ref()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// The object, container, and bed lists of one room (or of the agent's
/// currently-known scene as a whole).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomContents {
    pub targets: Vec<ObjectRef>,
    pub containers: Vec<ObjectRef>,
    pub beds: Vec<ObjectRef>,
}

/// How much of a room has been explored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Exploration {
    /// Not explored at all; also the state of rooms never visited.
    #[default]
    None,
    /// Partially explored; the label is the fraction the simulator reports.
    Partial(String),
    All,
}

impl fmt::Display for Exploration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exploration::None => write!(f, "none"),
            Exploration::Partial(fraction) => write!(f, "{fraction}"),
            Exploration::All => write!(f, "all"),
        }
    }
}

/// The partner agent's last observed whereabouts and holdings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpponentView {
    /// Room the partner was last seen in; `None` when never observed.
    pub room: Option<String>,
    pub holdings: [Holding; 2],
}

/// Everything the orchestrator knows at one decision step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInput {
    /// Steps taken so far in the episode.
    pub step: usize,
    pub current_room: String,
    /// Exploration progress per room; absent rooms count as unexplored.
    pub rooms_explored: HashMap<String, Exploration>,
    /// Both hands.
    pub holdings: [Holding; 2],
    /// Objects already delivered to the goal position. May repeat ids; the
    /// narration deduplicates before counting.
    pub satisfied: Vec<ObjectRef>,
    /// Everything currently known to be graspable or usable: the grasp
    /// candidates and the beds seen so far.
    pub visible: RoomContents,
    /// Known contents of every room, used for the per-room narration.
    pub per_room: HashMap<String, RoomContents>,
    pub action_history: Vec<String>,
    pub dialogue_history: Vec<String>,
    /// Partner state, if this is a two-agent episode.
    pub opponent: Option<OpponentView>,
}
