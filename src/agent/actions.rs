//! Enumeration of the legal next actions.
//!
//! The emitted strings form a small closed grammar:
//!
//! ```text
//! send a message: {message}
//! go grasp target object <name> (id)
//! go grasp container <name> (id)
//! put <name> (id) into the container <name> (id)
//! transport objects I'm holding to the bed
//! go to {room}
//! explore current room {room}
//! ```
//!
//! Each action gets a letter label (`A.`, `B.`, ...) in the rendered listing;
//! the raw ordered list is kept alongside for answer parsing.

use crate::agent::state::{Exploration, Holding, StepInput};

/// The enumerated actions of one decision step.
#[derive(Debug, Clone)]
pub struct ActionMenu {
    /// The lettered multi-line listing inserted into the prompt.
    pub listing: String,
    pub count: usize,
    /// The actions in listing order.
    pub actions: Vec<String>,
}

/// Letter label of the action at `index`.
pub(crate) fn option_letter(index: usize) -> char {
    (b'A' + index as u8) as char
}

/// Derive the legal actions from the current holdings, the visible scene,
/// and the exploration state.
///
/// A generated partner message, when present, is always offered first.
pub fn enumerate_actions(rooms: &[String], input: &StepInput, message: Option<&str>) -> ActionMenu {
    let mut actions = Vec::new();

    if let Some(message) = message {
        actions.push(format!("send a message: {message}"));
    }

    let [left, right] = &input.holdings;
    if left.is_empty() || right.is_empty() {
        for obj in &input.visible.targets {
            actions.push(format!("go grasp target object {obj}"));
        }
        // A second container is never worth a hand.
        if !(left.is_container() || right.is_container()) {
            for container in &input.visible.containers {
                actions.push(format!("go grasp container {container}"));
            }
        }
    } else {
        match (left, right) {
            (Holding::Container { container, .. }, Holding::Target(obj))
                if !left.is_full_container() =>
            {
                actions.push(format!("put {obj} into the container {container}"));
            }
            (Holding::Target(obj), Holding::Container { container, .. })
                if !right.is_full_container() =>
            {
                actions.push(format!("put {obj} into the container {container}"));
            }
            _ => {}
        }
    }

    if input.holdings.iter().any(|hand| !hand.is_empty()) && !input.visible.beds.is_empty() {
        actions.push("transport objects I'm holding to the bed".to_string());
    }

    for room in rooms {
        if room == &input.current_room || room.is_empty() || room == "None" {
            continue;
        }
        actions.push(format!("go to {room}"));
    }

    if !matches!(
        input.rooms_explored.get(&input.current_room),
        Some(Exploration::All)
    ) {
        actions.push(format!("explore current room {}", input.current_room));
    }

    let listing = actions
        .iter()
        .enumerate()
        .map(|(index, action)| format!("{}. {action}\n", option_letter(index)))
        .collect();

    ActionMenu {
        listing,
        count: actions.len(),
        actions,
    }
}
