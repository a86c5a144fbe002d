// Verify the provider parsers accept the payloads the upstream APIs send.
// Field names here are the upstream contract, not ours.

use chrono::{TimeZone, Utc};
use matchwatch_providers::apifootball::parse_events;
use matchwatch_providers::football_data::{parse_current_round, parse_match, parse_matches};
use matchwatch_providers::{ProviderError, ScorePair};

const ROUND_BODY: &str = r#"{
  "filters": {"matchday": "10"},
  "matches": [
    {
      "id": 497410,
      "utcDate": "2025-03-01T15:00:00Z",
      "status": "TIMED",
      "matchday": 10,
      "competition": {"id": 2021, "name": "Premier League"},
      "homeTeam": {"id": 57, "name": "Arsenal FC", "shortName": "Arsenal", "tla": "ARS"},
      "awayTeam": {"id": 61, "name": "Chelsea FC", "shortName": "Chelsea", "tla": "CHE"},
      "score": {
        "winner": null,
        "fullTime": {"home": null, "away": null},
        "halfTime": {"home": null, "away": null}
      }
    },
    {
      "id": 497411,
      "utcDate": "2025-03-01T17:30:00+01:00",
      "status": "IN_PLAY",
      "matchday": 10,
      "homeTeam": {"id": 65, "name": "Manchester City FC", "tla": "MCI"},
      "awayTeam": {"id": 64, "name": "Liverpool FC", "shortName": "Liverpool", "tla": "LIV"},
      "score": {
        "fullTime": {"home": 1, "away": 2},
        "halfTime": {"home": 0, "away": 1}
      }
    }
  ]
}"#;

#[test]
fn round_listing_parses_codes_scores_and_offsets() {
    let matches = parse_matches(ROUND_BODY).unwrap();
    assert_eq!(matches.len(), 2);

    let first = &matches[0];
    assert_eq!(first.id, 497410);
    assert_eq!(first.status, "TIMED");
    assert_eq!(first.round, Some(10));
    assert_eq!(first.competition, "Premier League");
    assert_eq!(first.home_code, "ARS");
    assert_eq!(first.away_name, "Chelsea");
    assert_eq!(first.kickoff, Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap());
    assert_eq!(first.full_time, ScorePair::default());

    let second = &matches[1];
    // +01:00 offset is normalised to UTC
    assert_eq!(second.kickoff, Utc.with_ymd_and_hms(2025, 3, 1, 16, 30, 0).unwrap());
    // shortName missing -> falls back to name
    assert_eq!(second.home_name, "Manchester City FC");
    assert_eq!(second.full_time, ScorePair { home: Some(1), away: Some(2) });
    assert_eq!(second.half_time, ScorePair { home: Some(0), away: Some(1) });
}

#[test]
fn empty_or_missing_matches_is_empty_error() {
    assert!(matches!(
        parse_matches(r#"{"matches": []}"#),
        Err(ProviderError::Empty(_))
    ));
    assert!(matches!(
        parse_matches(r#"{"message": "restricted"}"#),
        Err(ProviderError::Empty(_))
    ));
    assert!(matches!(parse_matches("not json"), Err(ProviderError::Parse(_))));
}

#[test]
fn single_match_parses() {
    let body = r#"{
      "id": 497410,
      "utcDate": "2025-03-01T15:00:00Z",
      "status": "FINISHED",
      "matchday": 10,
      "homeTeam": {"tla": "ARS", "shortName": "Arsenal"},
      "awayTeam": {"tla": "CHE", "shortName": "Chelsea"},
      "score": {"fullTime": {"home": 2, "away": 0}, "halfTime": {"home": 1, "away": 0}}
    }"#;
    let m = parse_match(body).unwrap();
    assert_eq!(m.status, "FINISHED");
    assert_eq!(m.full_time.home, Some(2));
    assert_eq!(m.competition, "");
}

#[test]
fn current_round_from_competition() {
    let body = r#"{"id": 2021, "currentSeason": {"id": 2287, "currentMatchday": 27}}"#;
    assert_eq!(parse_current_round(body).unwrap(), 27);
    assert!(matches!(
        parse_current_round(r#"{"currentSeason": null}"#),
        Err(ProviderError::Empty(_))
    ));
}

#[test]
fn events_keep_raw_scorer_fields() {
    let body = r#"[
      {
        "match_id": "86392",
        "match_date": "2025-03-01",
        "match_hometeam_id": "50",
        "match_hometeam_name": "Arsenal",
        "match_awayteam_id": "42",
        "match_awayteam_name": "Chelsea",
        "goalscorer": [
          {"time": "12", "home_scorer": "Saka", "away_scorer": "", "score": "1 - 0"},
          {"time": "70", "home_scorer": "", "away_scorer": "Smith", "score": "1 - 1"}
        ]
      },
      {
        "match_id": "86393",
        "match_hometeam_id": "n/a",
        "match_awayteam_id": "7"
      }
    ]"#;
    let events = parse_events(body).unwrap();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.match_id, "86392");
    assert_eq!((e.home_team_id, e.away_team_id), (50, 42));
    assert_eq!(e.goals.len(), 2);
    assert_eq!(e.goals[1].home_scorer, "");
    assert_eq!(e.goals[1].away_scorer, "Smith");
}

#[test]
fn events_error_object_is_empty() {
    let body = r#"{"error": 404, "message": "No event found (please check your plan)!!"}"#;
    assert!(matches!(parse_events(body), Err(ProviderError::Empty(_))));
    assert!(matches!(parse_events("[]"), Err(ProviderError::Empty(_))));
    assert!(matches!(parse_events("   "), Err(ProviderError::Empty(_))));
}
