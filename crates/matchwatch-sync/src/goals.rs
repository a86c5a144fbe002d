use matchwatch_providers::GoalEvent;
use tracing::debug;

/// Scorer names split by side, in event order. A player who scored twice
/// appears twice; de-duplication happens when merging into a fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalScorers {
    pub home: Vec<String>,
    pub away: Vec<String>,
}

/// Split goal events into home and away scorers.
///
/// The provider fills only one scorer field per event: an empty home-scorer
/// field means the goal belongs to the away side, anything else is a home
/// goal. Events with no name on the chosen side are dropped.
pub fn partition_scorers(goals: &[GoalEvent]) -> GoalScorers {
    let mut scorers = GoalScorers::default();
    for goal in goals {
        let (side, name) = if goal.home_scorer.is_empty() {
            (&mut scorers.away, &goal.away_scorer)
        } else {
            (&mut scorers.home, &goal.home_scorer)
        };
        if name.is_empty() {
            debug!(time = %goal.time, "goal event without scorer name");
            continue;
        }
        side.push(name.clone());
    }
    scorers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(home: &str, away: &str) -> GoalEvent {
        GoalEvent {
            time: "10".into(),
            home_scorer: home.into(),
            away_scorer: away.into(),
        }
    }

    #[test]
    fn empty_home_field_is_an_away_goal() {
        let s = partition_scorers(&[goal("", "Smith")]);
        assert!(s.home.is_empty());
        assert_eq!(s.away, vec!["Smith"]);
    }

    #[test]
    fn filled_home_field_wins_even_if_away_is_filled() {
        let s = partition_scorers(&[goal("Saka", "Smith")]);
        assert_eq!(s.home, vec!["Saka"]);
        assert!(s.away.is_empty());
    }

    #[test]
    fn keeps_event_order_and_repeats() {
        let s = partition_scorers(&[goal("Saka", ""), goal("", "Smith"), goal("Saka", "")]);
        assert_eq!(s.home, vec!["Saka", "Saka"]);
        assert_eq!(s.away, vec!["Smith"]);
    }

    #[test]
    fn nameless_events_are_dropped() {
        let s = partition_scorers(&[goal("", "")]);
        assert_eq!(s, GoalScorers::default());
    }
}
