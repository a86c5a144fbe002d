//! Authoritative fixture provider speaking the football-data.org v4 API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use matchwatch_core::config::FixtureProviderConfig;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{FixtureSource, ProviderError, ScorePair, UpstreamMatch};

pub struct FootballDataClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
    api_key: String,
    competition: String,
}

impl FootballDataClient {
    pub fn new(config: &FixtureProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: config.auth_header.clone(),
            api_key: config.api_key.clone(),
            competition: config.competition.clone(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        debug!(%url, "football-data request");

        let resp = self
            .client
            .get(url)
            .header(self.auth_header.as_str(), self.api_key.as_str())
            .query(query)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = resp.status().as_u16();
        if status == 429 {
            // football-data reports seconds until the request counter resets.
            let retry_after_secs = resp
                .headers()
                .get("X-RequestCounter-Reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after_secs * 1000,
            });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "football-data API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let body = resp.text().await.map_err(ProviderError::from_transport)?;
        if body.trim().is_empty() {
            return Err(ProviderError::Empty(format!("empty body from {url}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl FixtureSource for FootballDataClient {
    fn name(&self) -> &str {
        "football-data"
    }

    async fn fixtures_for_round(&self, round: u32) -> Result<Vec<UpstreamMatch>, ProviderError> {
        let url = format!("{}/competitions/{}/matches", self.base_url, self.competition);
        let body = self.get(&url, &[("matchday", round.to_string())]).await?;
        parse_matches(&body)
    }

    async fn fixture(&self, id: u64) -> Result<UpstreamMatch, ProviderError> {
        let url = format!("{}/matches/{}", self.base_url, id);
        let body = self.get(&url, &[]).await?;
        parse_match(&body)
    }

    async fn current_round(&self) -> Result<u32, ProviderError> {
        let url = format!("{}/competitions/{}", self.base_url, self.competition);
        let body = self.get(&url, &[]).await?;
        parse_current_round(&body)
    }
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Option<Vec<ApiMatch>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    id: u64,
    utc_date: DateTime<FixedOffset>,
    status: String,
    #[serde(default)]
    matchday: Option<u32>,
    #[serde(default)]
    competition: Option<ApiCompetition>,
    home_team: ApiTeam,
    away_team: ApiTeam,
    #[serde(default)]
    score: ApiScore,
}

#[derive(Debug, Deserialize)]
struct ApiCompetition {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTeam {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    tla: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    #[serde(default)]
    full_time: ScorePair,
    #[serde(default)]
    half_time: ScorePair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitionResponse {
    current_season: Option<ApiSeason>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSeason {
    current_matchday: Option<u32>,
}

impl From<ApiMatch> for UpstreamMatch {
    fn from(m: ApiMatch) -> Self {
        UpstreamMatch {
            id: m.id,
            kickoff: m.utc_date.with_timezone(&Utc),
            status: m.status,
            round: m.matchday,
            competition: m.competition.map(|c| c.name).unwrap_or_default(),
            home_code: m.home_team.tla.clone().unwrap_or_default(),
            away_code: m.away_team.tla.clone().unwrap_or_default(),
            home_name: team_name(m.home_team),
            away_name: team_name(m.away_team),
            full_time: m.score.full_time,
            half_time: m.score.half_time,
        }
    }
}

fn team_name(team: ApiTeam) -> String {
    team.short_name.or(team.name).unwrap_or_default()
}

/// Parse a `/competitions/{code}/matches` body.
///
/// A missing or empty `matches` array is reported as [`ProviderError::Empty`].
pub fn parse_matches(body: &str) -> Result<Vec<UpstreamMatch>, ProviderError> {
    let resp: MatchesResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    match resp.matches {
        Some(matches) if !matches.is_empty() => {
            Ok(matches.into_iter().map(UpstreamMatch::from).collect())
        }
        _ => Err(ProviderError::Empty("no matches in response".to_string())),
    }
}

/// Parse a `/matches/{id}` body.
pub fn parse_match(body: &str) -> Result<UpstreamMatch, ProviderError> {
    let m: ApiMatch =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(m.into())
}

/// Parse a `/competitions/{code}` body into the current matchday.
pub fn parse_current_round(body: &str) -> Result<u32, ProviderError> {
    let resp: CompetitionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    resp.current_season
        .and_then(|s| s.current_matchday)
        .ok_or_else(|| ProviderError::Empty("no currentSeason.currentMatchday".to_string()))
}
