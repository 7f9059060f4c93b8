//! Mapping free-text model output back onto one enumerated action.
//!
//! Matching is a fixed cascade of strategies, tried in order, first hit
//! wins: exact substring, option-letter token, entity match (name and id),
//! loose match (letter, verb, name, or id), single-character answer. When
//! every stage misses, an action is drawn uniformly at random so that an
//! incoherent reply never stalls the episode.

use rand::seq::SliceRandom;
use tracing::warn;

use crate::agent::actions::option_letter;

/// Tag on a successful clean match.
const ACCEPT: &str = "AC";
/// Tag on any fuzzy-stage match.
const FUZZY: &str = "Fuzzy match";
/// Tag on the random fallback.
const FAILED: &str = "failed to parse";

type MatchFn = fn(&[String], &str) -> Option<usize>;

/// The cascade, in authoritative order. Every stage is a pure function so
/// each can be exercised on its own.
const CASCADE: &[(MatchFn, &str)] = &[
    (match_exact, ACCEPT),
    (match_option_token, ACCEPT),
    (match_entity, FUZZY),
    (match_loose, FUZZY),
    (match_single_letter, FUZZY),
];

/// Select the action the model chose, together with a tag describing how the
/// match was made.
///
/// `actions` must be non-empty; the caller skips the decision step entirely
/// when nothing is available.
pub fn parse_answer(actions: &[String], text: &str) -> (String, &'static str) {
    for &(matcher, tag) in CASCADE {
        if let Some(index) = matcher(actions, text) {
            if tag != ACCEPT {
                warn!(action = %actions[index], "fuzzy-matched model output");
            }
            return (actions[index].clone(), tag);
        }
    }
    warn!("no action recognized in model output, choosing at random");
    let mut rng = rand::thread_rng();
    let action = actions
        .choose(&mut rng)
        .expect("action list must not be empty")
        .clone();
    (action, FAILED)
}

/// Stage 1: the full action text appears verbatim (case-insensitively) in
/// the output. A message action matches on its `"send a message"` stem so
/// the free-text payload doesn't have to be echoed back.
fn match_exact(actions: &[String], text: &str) -> Option<usize> {
    let haystack = text.to_lowercase();
    for (index, action) in actions.iter().enumerate() {
        let needle = if action.starts_with("send a message:") {
            "send a message"
        } else {
            action.as_str()
        };
        if haystack.contains(&needle.to_lowercase()) {
            return Some(index);
        }
    }
    None
}

/// Stage 2: the output names an option by its letter label, in any of the
/// common shapes (`option B`, `B.`, `B,`, `(B)`, `action B`, or a bare
/// letter when the whole output is at most two characters).
fn match_option_token(actions: &[String], text: &str) -> Option<usize> {
    let words: Vec<&str> = text
        .lines()
        .flat_map(|line| line.split(' '))
        .filter(|word| !word.is_empty())
        .collect();
    for index in 0..actions.len() {
        let letter = option_letter(index);
        let dotted = format!("{letter}.");
        let comma = format!("{letter},");
        let parenthesized = format!("({letter})");
        let trailing_newline = format!("{letter}\n");
        if text.contains(&format!("option {letter}"))
            || text.contains(&format!("Option {letter}"))
            || text.contains(&format!("action {letter}"))
            || words.iter().any(|w| *w == dotted || *w == comma || *w == parenthesized)
            || text.split(' ').any(|w| w == trailing_newline)
            || (text.len() <= 2 && text.contains(letter))
        {
            return Some(index);
        }
    }
    None
}

/// Stage 3: both the entity name and id of an action appear in the output.
fn match_entity(actions: &[String], text: &str) -> Option<usize> {
    for (index, action) in actions.iter().enumerate() {
        if action.starts_with("send a message") {
            continue;
        }
        if let Some((name, id)) = extract_entity(action) {
            if text.contains(&name) && text.contains(&id) {
                return Some(index);
            }
        }
    }
    None
}

/// Stage 4: very permissive. The letter token, the action's verb keyword,
/// its entity name, or its entity id anywhere in the output selects the
/// action; the first action satisfying any condition wins.
fn match_loose(actions: &[String], text: &str) -> Option<usize> {
    for (index, action) in actions.iter().enumerate() {
        if action.starts_with("send a message") {
            continue;
        }
        if text.contains(&format!("{} ", option_letter(index))) {
            return Some(index);
        }
        if let Some(verb) = verb_keyword(action) {
            if text.contains(verb) {
                return Some(index);
            }
        }
        if let Some((name, id)) = extract_entity(action) {
            if text.contains(&name) || text.contains(&id) {
                return Some(index);
            }
        }
    }
    None
}

/// Stage 5: a one-character output is read as a letter index.
fn match_single_letter(actions: &[String], text: &str) -> Option<usize> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let index = first as i64 - 'A' as i64;
    if (0..actions.len() as i64).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

/// Pull the `(name, id)` pair out of actions that reference a scene entity.
///
/// Entity-bearing actions end in `<name> (id)`, and the room operand of
/// `go to`/`explore` follows the same shape; the pair is recovered by
/// stripping the outer characters of the last two tokens. Put and transport
/// actions carry no single extractable entity.
fn extract_entity(action: &str) -> Option<(String, String)> {
    if !(action.starts_with("go to")
        || action.starts_with("explore")
        || action.starts_with("go grasp"))
    {
        return None;
    }
    let tokens: Vec<&str> = action.split(' ').collect();
    if tokens.len() < 2 {
        return None;
    }
    Some((
        strip_outer(tokens[tokens.len() - 2]),
        strip_outer(tokens[tokens.len() - 1]),
    ))
}

fn strip_outer(token: &str) -> String {
    let len = token.chars().count();
    if len < 2 {
        return String::new();
    }
    token.chars().skip(1).take(len - 2).collect()
}

fn verb_keyword(action: &str) -> Option<&'static str> {
    if action.starts_with("explore") {
        Some("explore")
    } else if action.starts_with("go grasp") {
        Some("grasp")
    } else if action.starts_with("put") {
        Some("put")
    } else if action.starts_with("transport") {
        Some("transport")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_actions(actions: &[&str]) -> Vec<String> {
        actions.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let actions = to_actions(&[
            "go grasp target object <apple> (123)",
            "explore current room <Kitchen> (0)",
        ]);
        let (action, tag) =
            parse_answer(&actions, "I will GO GRASP target object <apple> (123) right away");
        assert_eq!(action, actions[0]);
        assert_eq!(tag, "AC");
    }

    #[test]
    fn test_exact_match_normalizes_message_action() {
        let actions = to_actions(&[
            "send a message: \"meet me in the kitchen\"",
            "explore current room <Kitchen> (0)",
        ]);
        let (action, tag) = parse_answer(&actions, "I think I should send a message to Bob.");
        assert_eq!(action, actions[0]);
        assert_eq!(tag, "AC");
    }

    #[test]
    fn test_option_token_beats_fuzzy_stages() {
        let actions = to_actions(&["go to Kitchen", "explore current room Kitchen"]);
        let (action, tag) = parse_answer(&actions, "I choose B.");
        assert_eq!(action, "explore current room Kitchen");
        assert_eq!(tag, "AC");
    }

    #[test]
    fn test_option_token_shapes() {
        let actions = to_actions(&["go to <Bedroom> (2000)", "go to <Office> (3000)"]);
        for text in ["option B sounds best", "Option B", "action B", "(B) it is", "B,"] {
            assert_eq!(match_option_token(&actions, text), Some(1), "text: {text}");
        }
        assert_eq!(match_option_token(&actions, "B"), Some(1));
        assert_eq!(match_option_token(&actions, "nothing here"), None);
    }

    #[test]
    fn test_entity_match_needs_name_and_id() {
        let actions = to_actions(&["go to <Bedroom> (2000)", "go to <Office> (3000)"]);
        assert_eq!(
            match_entity(&actions, "the Office (3000) seems promising"),
            Some(1)
        );
        assert_eq!(match_entity(&actions, "the Office seems promising"), None);
    }

    #[test]
    fn test_entity_match_through_cascade() {
        let actions = to_actions(&["go to <Bedroom> (2000)", "go to <Office> (3000)"]);
        let (action, tag) = parse_answer(&actions, "heading for the Office, id 3000");
        assert_eq!(action, actions[1]);
        assert_eq!(tag, "Fuzzy match");
    }

    #[test]
    fn test_loose_match_on_verb() {
        let actions = to_actions(&[
            "go to <Bedroom> (2000)",
            "go grasp target object <apple> (123)",
        ]);
        assert_eq!(match_loose(&actions, "let us grasp something"), Some(1));
    }

    #[test]
    fn test_loose_match_skips_message_action() {
        let actions = to_actions(&[
            "send a message: \"hello\"",
            "transport objects I'm holding to the bed",
        ]);
        assert_eq!(match_loose(&actions, "time to transport things"), Some(1));
    }

    #[test]
    fn test_single_letter_stage() {
        let actions = to_actions(&["go to <Bedroom> (2000)", "go to <Office> (3000)"]);
        assert_eq!(match_single_letter(&actions, "B"), Some(1));
        assert_eq!(match_single_letter(&actions, "C"), None);
        assert_eq!(match_single_letter(&actions, "BC"), None);
    }

    #[test]
    fn test_unparseable_output_falls_back_to_random_member() {
        let actions = to_actions(&[
            "go to <Bedroom> (2000)",
            "explore current room <Office> (3000)",
        ]);
        for _ in 0..20 {
            let (action, tag) = parse_answer(&actions, "zzz qqq");
            assert!(actions.contains(&action));
            assert_eq!(tag, "failed to parse");
        }
    }
}
