//! Rendering of the episode goal into one instruction sentence.

use std::collections::BTreeMap;

/// Required transport count per target object type, fixed for an episode.
pub type GoalSpec = BTreeMap<String, usize>;

/// Render the goal as a single sentence, e.g.
/// `"Transport 1 apple, 2 cups to the bed."`.
///
/// Object type names are pluralized when their count exceeds one.
pub fn describe_goal(goal: &GoalSpec) -> String {
    let mut s = String::from("Transport ");
    for (name, count) in goal {
        let plural = if *count > 1 { "s" } else { "" };
        s.push_str(&format!("{count} {name}{plural}, "));
    }
    s.truncate(s.len() - 2);
    s.push_str(" to the bed.");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_plural_counts() {
        let goal = GoalSpec::from([("apple".to_string(), 1), ("cup".to_string(), 2)]);
        assert_eq!(describe_goal(&goal), "Transport 1 apple, 2 cups to the bed.");
    }

    #[test]
    fn test_always_ends_at_the_bed() {
        let goal = GoalSpec::from([
            ("bread".to_string(), 3),
            ("burger".to_string(), 1),
            ("pen".to_string(), 2),
        ]);
        let sentence = describe_goal(&goal);
        assert!(sentence.ends_with(" to the bed."));
        assert!(sentence.contains("3 breads"));
        assert!(sentence.contains("1 burger,"));
        assert!(sentence.contains("2 pens"));
    }

    #[test]
    fn test_empty_goal_degenerates() {
        // No goal entries leaves a truncated stem; callers never pass an
        // empty goal in practice.
        assert_eq!(describe_goal(&GoalSpec::new()), "Transpor to the bed.");
    }
}
