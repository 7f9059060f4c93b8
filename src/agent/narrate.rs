//! Natural-language narration of the agent's progress.
//!
//! The narration is one paragraph assembled from independent fragments in a
//! fixed order: step counter, transported-goal summary, own holdings, current
//! room, partner state (two-agent episodes only), then the remaining rooms.
//! Every room's contents are rendered exactly once up front so the same
//! phrase appears wherever that room is mentioned.

use std::collections::{HashMap, HashSet};

use crate::agent::state::{Exploration, Holding, ObjectKind, ObjectRef, RoomContents, StepInput};
use crate::config::Persona;

/// Hard step limit of one episode, quoted in the step counter.
pub const EPISODE_STEP_LIMIT: usize = 3000;

/// Render the full progress paragraph for one decision step.
///
/// `rooms` is the episode's room list fixed at reset time; it drives the
/// order of the remaining-rooms report.
pub fn progress_text(persona: &Persona, rooms: &[String], input: &StepInput) -> String {
    let mut s = format!("I've taken {}/{} steps. ", input.step, EPISODE_STEP_LIMIT);

    let summaries: HashMap<&str, String> = input
        .per_room
        .iter()
        .map(|(room, contents)| (room.as_str(), room_phrase(contents)))
        .collect();

    s.push_str(&satisfied_phrase(persona, input));

    s.push_str(&format!("I'm holding {}", holdings_phrase(&input.holdings)));

    let current = input.current_room.as_str();
    let explored = exploration_label(input, current);
    let content = summaries.get(current).map(String::as_str).unwrap_or("nothing");
    if content == "nothing" {
        s.push_str(&format!(
            "I'm in the {current}, where I've explored {explored} of it. "
        ));
    } else {
        s.push_str(&format!(
            "I'm in the {current}, where I've explored {explored} of it and found {content}. "
        ));
    }

    if !persona.single {
        s.push_str(&opponent_phrase(persona, input));
    }

    for room in rooms {
        if room == current {
            continue;
        }
        let explored = exploration_label(input, room);
        let fully = matches!(input.rooms_explored.get(room.as_str()), Some(Exploration::All));
        let content = summaries.get(room.as_str()).map(String::as_str).unwrap_or("nothing");
        if !fully && content == "nothing" {
            s.push_str(&format!("I've explored {explored} of the {room}. "));
        } else {
            s.push_str(&format!(
                "I've explored {explored} of the {room}, and I found {content} there. "
            ));
        }
    }

    s
}

/// Render one room's contents as a phrase, `"nothing"` when empty.
fn room_phrase(contents: &RoomContents) -> String {
    let s_obj = match contents.targets.len() {
        0 => String::new(),
        1 => format!("a target object {}", contents.targets[0]),
        _ => format!("target objects {}", joined(&contents.targets)),
    };
    let s_con = match contents.containers.len() {
        0 => String::new(),
        1 => format!("a container {}", contents.containers[0]),
        _ => format!("containers {}", joined(&contents.containers)),
    };
    let s_bed = if contents.beds.is_empty() {
        ""
    } else {
        "the goal position bed"
    };

    match (s_obj.is_empty(), s_con.is_empty(), s_bed.is_empty()) {
        (true, true, true) => "nothing".to_string(),
        (false, false, true) => format!("{s_obj}, and {s_con}"),
        (false, true, false) => format!("{s_obj}, and {s_bed}"),
        (true, false, false) => format!("{s_con}, and {s_bed}"),
        (false, false, false) => format!("{s_obj}, {s_con}, and {s_bed}"),
        _ => format!("{s_obj}{s_con}{s_bed}"),
    }
}

/// Summary of what has already reached the bed, or where the bed still is.
fn satisfied_phrase(persona: &Persona, input: &StepInput) -> String {
    if input.satisfied.is_empty() {
        if input.visible.beds.is_empty() {
            return "I haven't found the goal position bed. ".to_string();
        }
        return String::new();
    }

    // The orchestrator may report the same delivery twice; count each id once.
    let mut seen = HashSet::new();
    let unique: Vec<&ObjectRef> = input
        .satisfied
        .iter()
        .filter(|obj| seen.insert(obj.id.as_str()))
        .filter(|obj| obj.kind == ObjectKind::Target)
        .collect();

    let subject = if persona.single { "I" } else { "We" };
    let mut s = format!("{subject}'ve already transported ");
    if unique.is_empty() {
        s.push_str("nothing");
    }
    s.push_str(
        &unique
            .iter()
            .map(|obj| obj.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );
    s.push_str(" to the bed. ");
    s
}

/// Both hands as one phrase: `"nothing. "`, a single item, two target
/// objects combined, or two items joined with `", and "`.
fn holdings_phrase(holdings: &[Holding; 2]) -> String {
    if let (Holding::Target(a), Holding::Target(b)) = (&holdings[0], &holdings[1]) {
        return format!("two target objects {a} and {b}. ");
    }
    let first = slot_phrase(&holdings[0]);
    let second = slot_phrase(&holdings[1]);
    match (first.is_empty(), second.is_empty()) {
        (true, true) => "nothing. ".to_string(),
        (false, false) => format!("{}, and {}", &first[..first.len() - 2], second),
        _ => format!("{first}{second}"),
    }
}

/// One hand as a sentence fragment ending `". "`, empty for an empty hand.
fn slot_phrase(slot: &Holding) -> String {
    match slot {
        Holding::Empty => String::new(),
        Holding::Target(obj) => format!("a target object {obj}. "),
        Holding::Container { container, .. } => {
            let held = slot.contained();
            let inner = if held.is_empty() {
                "nothing".to_string()
            } else {
                let plural = if held.len() > 1 { "s" } else { "" };
                format!(
                    "target object{plural} {}",
                    held.iter()
                        .map(|obj| obj.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            format!("a container {container} with {inner} in it. ")
        }
    }
}

/// Where the partner is and what it carries, as last observed.
fn opponent_phrase(persona: &Persona, input: &StepInput) -> String {
    let fallback = crate::agent::state::OpponentView::default();
    let opponent = input.opponent.as_ref().unwrap_or(&fallback);
    let held = holdings_phrase(&opponent.holdings);
    match opponent.room.as_deref() {
        None => format!("I don't know where {} is. ", persona.oppo_name),
        Some(room) if room == input.current_room => format!(
            "I also see {} here in the {room}, {} is holding {held}",
            persona.oppo_name, persona.oppo_pronoun
        ),
        Some(room) => format!(
            "Last time I saw {} was in the {room}, {} was holding {held}",
            persona.oppo_name, persona.oppo_pronoun
        ),
    }
}

fn exploration_label(input: &StepInput, room: &str) -> String {
    input
        .rooms_explored
        .get(room)
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn joined(objects: &[ObjectRef]) -> String {
    objects
        .iter()
        .map(|obj| obj.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::agent::state::OpponentView;

    fn apple() -> ObjectRef {
        ObjectRef::new("apple", "123", ObjectKind::Target)
    }

    fn plate() -> ObjectRef {
        ObjectRef::new("plate", "456", ObjectKind::Target)
    }

    fn basket() -> ObjectRef {
        ObjectRef::new("basket", "9", ObjectKind::Container)
    }

    fn bed() -> ObjectRef {
        ObjectRef::new("bed", "77", ObjectKind::Bed)
    }

    fn empty_input(current_room: &str, rooms_with_contents: &[&str]) -> StepInput {
        StepInput {
            step: 7,
            current_room: current_room.to_string(),
            rooms_explored: HashMap::new(),
            holdings: [Holding::Empty, Holding::Empty],
            satisfied: vec![],
            visible: RoomContents::default(),
            per_room: rooms_with_contents
                .iter()
                .map(|room| (room.to_string(), RoomContents::default()))
                .collect(),
            action_history: vec![],
            dialogue_history: vec![],
            opponent: None,
        }
    }

    fn single_persona() -> Persona {
        Persona::from_agent_id(0, true)
    }

    #[test]
    fn test_bare_session_full_paragraph() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.rooms_explored.insert("Kitchen".into(), Exploration::All);
        let rooms = vec!["Kitchen".to_string(), "Bedroom".to_string()];
        let text = progress_text(&single_persona(), &rooms, &input);
        assert_eq!(
            text,
            "I've taken 7/3000 steps. I haven't found the goal position bed. \
             I'm holding nothing. I'm in the Kitchen, where I've explored all of it. \
             I've explored none of the Bedroom. "
        );
    }

    #[test]
    fn test_fully_explored_empty_room_omits_found_clause() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.rooms_explored.insert("Kitchen".into(), Exploration::All);
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(text.contains("I'm in the Kitchen, where I've explored all of it. "));
        assert!(!text.contains("and found"));
    }

    #[test]
    fn test_narration_is_deterministic() {
        let mut input = empty_input("Kitchen", &["Kitchen", "Bedroom"]);
        input.per_room.get_mut("Bedroom").unwrap().targets.push(apple());
        input
            .rooms_explored
            .insert("Bedroom".into(), Exploration::Partial("part".into()));
        let rooms = vec!["Kitchen".to_string(), "Bedroom".to_string()];
        let persona = Persona::from_agent_id(0, false);
        let first = progress_text(&persona, &rooms, &input);
        let second = progress_text(&persona, &rooms, &input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_room_phrase_combinations() {
        let mut contents = RoomContents::default();
        assert_eq!(room_phrase(&contents), "nothing");

        contents.targets.push(apple());
        assert_eq!(room_phrase(&contents), "a target object <apple> (123)");

        contents.containers.push(basket());
        assert_eq!(
            room_phrase(&contents),
            "a target object <apple> (123), and a container <basket> (9)"
        );

        contents.beds.push(bed());
        assert_eq!(
            room_phrase(&contents),
            "a target object <apple> (123), a container <basket> (9), and the goal position bed"
        );

        contents.targets.push(plate());
        assert!(room_phrase(&contents)
            .starts_with("target objects <apple> (123), <plate> (456), "));
    }

    #[test]
    fn test_room_phrase_bed_only() {
        let contents = RoomContents {
            beds: vec![bed()],
            ..RoomContents::default()
        };
        assert_eq!(room_phrase(&contents), "the goal position bed");
    }

    #[test]
    fn test_satisfied_deduplicates_by_id() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.satisfied = vec![apple(), apple(), plate()];
        let persona = Persona::from_agent_id(0, false);
        let text = progress_text(&persona, &["Kitchen".to_string()], &input);
        assert!(text.contains(
            "We've already transported <apple> (123), <plate> (456) to the bed. "
        ));
        // The duplicate delivery shows up once.
        assert_eq!(text.matches("<apple> (123)").count(), 1);
    }

    #[test]
    fn test_satisfied_uses_first_person_when_single() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.satisfied = vec![apple()];
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(text.contains("I've already transported <apple> (123) to the bed. "));
    }

    #[test]
    fn test_bed_seen_suppresses_not_found_notice() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.visible.beds.push(bed());
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(!text.contains("haven't found the goal position bed"));
    }

    #[test]
    fn test_holding_two_target_objects() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.holdings = [Holding::Target(apple()), Holding::Target(plate())];
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(text.contains(
            "I'm holding two target objects <apple> (123) and <plate> (456). "
        ));
    }

    #[test]
    fn test_holding_container_lists_contents() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.holdings = [
            Holding::Container {
                container: basket(),
                contents: vec![Some(apple()), None, None],
            },
            Holding::Empty,
        ];
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(text.contains(
            "I'm holding a container <basket> (9) with target object <apple> (123) in it. "
        ));
    }

    #[test]
    fn test_holding_target_and_empty_container() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.holdings = [
            Holding::Target(plate()),
            Holding::Container {
                container: basket(),
                contents: vec![None, None],
            },
        ];
        let text = progress_text(&single_persona(), &["Kitchen".to_string()], &input);
        assert!(text.contains(
            "I'm holding a target object <plate> (456), and a container <basket> (9) \
             with nothing in it. "
        ));
    }

    #[test]
    fn test_opponent_never_observed() {
        let input = empty_input("Kitchen", &["Kitchen"]);
        let persona = Persona::from_agent_id(0, false);
        let text = progress_text(&persona, &["Kitchen".to_string()], &input);
        assert!(text.contains("I don't know where Bob is. "));
    }

    #[test]
    fn test_opponent_in_same_room() {
        let mut input = empty_input("Kitchen", &["Kitchen"]);
        input.opponent = Some(OpponentView {
            room: Some("Kitchen".into()),
            holdings: [Holding::Empty, Holding::Empty],
        });
        let persona = Persona::from_agent_id(0, false);
        let text = progress_text(&persona, &["Kitchen".to_string()], &input);
        assert!(text.contains("I also see Bob here in the Kitchen, he is holding nothing. "));
    }

    #[test]
    fn test_opponent_seen_elsewhere_with_holdings() {
        let mut input = empty_input("Kitchen", &["Kitchen", "Bedroom"]);
        input.opponent = Some(OpponentView {
            room: Some("Bedroom".into()),
            holdings: [Holding::Target(apple()), Holding::Empty],
        });
        let persona = Persona::from_agent_id(1, false);
        let text = progress_text(
            &persona,
            &["Kitchen".to_string(), "Bedroom".to_string()],
            &input,
        );
        assert!(text.contains(
            "Last time I saw Alice was in the Bedroom, she was holding \
             a target object <apple> (123). "
        ));
    }

    #[test]
    fn test_remaining_room_reports_contents() {
        let mut input = empty_input("Kitchen", &["Kitchen", "Bedroom"]);
        input.per_room.get_mut("Bedroom").unwrap().targets.push(apple());
        input
            .rooms_explored
            .insert("Bedroom".into(), Exploration::Partial("part".into()));
        let rooms = vec!["Kitchen".to_string(), "Bedroom".to_string()];
        let text = progress_text(&single_persona(), &rooms, &input);
        assert!(text.contains(
            "I've explored part of the Bedroom, and I found a target object \
             <apple> (123) there. "
        ));
    }

    #[test]
    fn test_remaining_room_fully_explored_but_empty_reports_nothing() {
        let mut input = empty_input("Kitchen", &["Kitchen", "Bedroom"]);
        input.rooms_explored.insert("Bedroom".into(), Exploration::All);
        let rooms = vec!["Kitchen".to_string(), "Bedroom".to_string()];
        let text = progress_text(&single_persona(), &rooms, &input);
        assert!(text.contains("I've explored all of the Bedroom, and I found nothing there. "));
    }
}
