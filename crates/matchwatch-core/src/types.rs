use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the authoritative fixture provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixtureStatus {
    Scheduled,
    Timed,
    Postponed,
    InPlay,
    Paused,
    Suspended,
    Finished,
    Awarded,
    Cancelled,
}

impl FixtureStatus {
    /// Ordering used to keep status updates monotonic.
    ///
    /// Statuses sharing a rank may replace each other (IN_PLAY <-> PAUSED,
    /// SCHEDULED <-> POSTPONED); a lower rank never replaces a higher one.
    pub fn rank(self) -> u8 {
        match self {
            FixtureStatus::Scheduled | FixtureStatus::Timed | FixtureStatus::Postponed => 0,
            FixtureStatus::InPlay | FixtureStatus::Paused | FixtureStatus::Suspended => 1,
            FixtureStatus::Finished | FixtureStatus::Awarded | FixtureStatus::Cancelled => 2,
        }
    }

    /// True once the match has kicked off, including when it is already over.
    pub fn has_started(self) -> bool {
        matches!(
            self,
            FixtureStatus::InPlay | FixtureStatus::Paused | FixtureStatus::Finished
        )
    }

    pub fn is_finished(self) -> bool {
        matches!(self, FixtureStatus::Finished | FixtureStatus::Awarded)
    }

    /// No further status change is expected from upstream.
    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

impl std::fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FixtureStatus::Scheduled => "SCHEDULED",
            FixtureStatus::Timed => "TIMED",
            FixtureStatus::Postponed => "POSTPONED",
            FixtureStatus::InPlay => "IN_PLAY",
            FixtureStatus::Paused => "PAUSED",
            FixtureStatus::Suspended => "SUSPENDED",
            FixtureStatus::Finished => "FINISHED",
            FixtureStatus::Awarded => "AWARDED",
            FixtureStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for FixtureStatus {
    type Err = String;

    /// Parses an upstream status string, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(FixtureStatus::Scheduled),
            "TIMED" => Ok(FixtureStatus::Timed),
            "POSTPONED" => Ok(FixtureStatus::Postponed),
            "IN_PLAY" | "LIVE" => Ok(FixtureStatus::InPlay),
            "PAUSED" => Ok(FixtureStatus::Paused),
            "SUSPENDED" => Ok(FixtureStatus::Suspended),
            "FINISHED" => Ok(FixtureStatus::Finished),
            "AWARDED" => Ok(FixtureStatus::Awarded),
            "CANCELLED" | "CANCELED" => Ok(FixtureStatus::Cancelled),
            other => Err(format!("unknown fixture status: {other}")),
        }
    }
}

/// Static reference data for one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Reference id; shared with the secondary goal-detail provider.
    pub id: u64,
    /// Short code (TLA) used by the authoritative provider, e.g. "ARS".
    pub code: String,
    pub name: String,
    /// Only fixtures involving at least one tracked team are kept.
    #[serde(default)]
    pub tracked: bool,
    /// Home ground; becomes the fixture venue when this team plays at home.
    #[serde(default)]
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub position: String,
}

/// One match between two teams, as held in the fixture cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Authoritative provider id; unique within the cached list.
    pub id: u64,
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub home_code: String,
    pub away_code: String,
    /// Never changes once the fixture is first cached.
    pub kickoff: DateTime<Utc>,
    pub competition: String,
    pub status: FixtureStatus,
    pub venue: String,
    pub round: u32,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    #[serde(default)]
    pub home_players: Vec<Player>,
    #[serde(default)]
    pub away_players: Vec<Player>,
    #[serde(default)]
    pub home_scorers: Vec<String>,
    #[serde(default)]
    pub away_scorers: Vec<String>,
    /// Secondary provider's match id; resolved by team pair, then frozen.
    #[serde(default)]
    pub secondary_id: Option<String>,
}

impl Fixture {
    /// Calendar date of kickoff in the given timezone.
    pub fn kickoff_date(&self, tz: &Tz) -> NaiveDate {
        self.kickoff.with_timezone(tz).date_naive()
    }

    /// Apply an observed status. Returns `false` when it would regress.
    pub fn advance_status(&mut self, status: FixtureStatus) -> bool {
        if status.rank() < self.status.rank() {
            return false;
        }
        self.status = status;
        true
    }

    /// Set the correlation id unless one is already resolved.
    pub fn resolve_secondary_id(&mut self, id: &str) -> bool {
        if self.secondary_id.is_some() {
            return false;
        }
        self.secondary_id = Some(id.to_string());
        true
    }

    /// Union newly observed scorer names into this fixture.
    ///
    /// Names already present are skipped so repeated polls of the same
    /// goal list leave the fixture unchanged. Returns how many names were added.
    pub fn merge_scorers(&mut self, home: &[String], away: &[String]) -> usize {
        union_into(&mut self.home_scorers, home) + union_into(&mut self.away_scorers, away)
    }

    /// Copy state learned after the fixture was first cached from `cached`.
    ///
    /// Used when a fresh fixture list replaces the cached one: kickoff and
    /// correlation id stay frozen, status never regresses, and goal data
    /// gathered by the goal poller survives the refresh.
    pub fn carry_enrichment(&mut self, cached: &Fixture) {
        self.kickoff = cached.kickoff;
        if cached.status.rank() > self.status.rank() {
            self.status = cached.status;
        }
        if self.secondary_id.is_none() {
            self.secondary_id = cached.secondary_id.clone();
        }
        if self.home_score.is_none() {
            self.home_score = cached.home_score;
        }
        if self.away_score.is_none() {
            self.away_score = cached.away_score;
        }
        self.merge_scorers(&cached.home_scorers, &cached.away_scorers);
    }
}

fn union_into(target: &mut Vec<String>, names: &[String]) -> usize {
    let mut added = 0;
    for name in names {
        if !target.iter().any(|n| n == name) {
            target.push(name.clone());
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture() -> Fixture {
        Fixture {
            id: 1,
            home_team_id: 50,
            away_team_id: 42,
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            home_code: "ARS".into(),
            away_code: "CHE".into(),
            kickoff: Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap(),
            competition: "Premier League".into(),
            status: FixtureStatus::Timed,
            venue: "Emirates Stadium".into(),
            round: 10,
            home_score: None,
            away_score: None,
            home_players: Vec::new(),
            away_players: Vec::new(),
            home_scorers: Vec::new(),
            away_scorers: Vec::new(),
            secondary_id: None,
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("in_play".parse::<FixtureStatus>(), Ok(FixtureStatus::InPlay));
        assert_eq!(" IN_PLAY ".parse::<FixtureStatus>(), Ok(FixtureStatus::InPlay));
        assert!("HALF_TIME_SHOW".parse::<FixtureStatus>().is_err());
    }

    #[test]
    fn status_never_regresses() {
        let mut f = fixture();
        assert!(f.advance_status(FixtureStatus::InPlay));
        assert!(f.advance_status(FixtureStatus::Paused));
        assert!(f.advance_status(FixtureStatus::Finished));
        assert!(!f.advance_status(FixtureStatus::InPlay));
        assert_eq!(f.status, FixtureStatus::Finished);
    }

    #[test]
    fn secondary_id_is_never_overwritten() {
        let mut f = fixture();
        assert!(f.resolve_secondary_id("9001"));
        assert!(!f.resolve_secondary_id("9002"));
        assert_eq!(f.secondary_id.as_deref(), Some("9001"));
    }

    #[test]
    fn scorer_merge_is_idempotent() {
        let mut f = fixture();
        let home = vec!["Saka".to_string(), "Saka".to_string()];
        let away = vec!["Palmer".to_string()];
        assert_eq!(f.merge_scorers(&home, &away), 2);
        assert_eq!(f.merge_scorers(&home, &away), 0);
        assert_eq!(f.home_scorers, vec!["Saka"]);
        assert_eq!(f.away_scorers, vec!["Palmer"]);
    }

    #[test]
    fn carry_enrichment_keeps_goal_data() {
        let mut cached = fixture();
        cached.status = FixtureStatus::InPlay;
        cached.secondary_id = Some("77".into());
        cached.home_scorers = vec!["Saka".into()];
        cached.home_score = Some(1);

        let mut fresh = fixture();
        fresh.kickoff = Utc.with_ymd_and_hms(2025, 3, 1, 17, 30, 0).unwrap();
        fresh.carry_enrichment(&cached);

        assert_eq!(fresh, cached);
    }

    #[test]
    fn kickoff_date_uses_timezone() {
        let mut f = fixture();
        f.kickoff = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        let london = chrono_tz::Europe::London;
        let tokyo = chrono_tz::Asia::Tokyo;
        assert_eq!(f.kickoff_date(&london), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(f.kickoff_date(&tokyo), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }
}
