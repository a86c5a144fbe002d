//! Secondary goal-detail provider speaking the apifootball.com `get_events` API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use matchwatch_core::config::GoalProviderConfig;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{GoalDetailMatch, GoalEvent, GoalSource, ProviderError};

pub struct ApiFootballClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    league_id: String,
}

impl ApiFootballClient {
    pub fn new(config: &GoalProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            league_id: config.league_id.clone(),
        })
    }

    async fn get_events(
        &self,
        date: NaiveDate,
        match_id: Option<&str>,
    ) -> Result<Vec<GoalDetailMatch>, ProviderError> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("action", "get_events".to_string()),
            ("from", day.clone()),
            ("to", day),
            ("league_id", self.league_id.clone()),
            ("APIkey", self.api_key.clone()),
        ];
        if let Some(id) = match_id {
            query.push(("match_id", id.to_string()));
        }

        debug!(%date, match_id = ?match_id, "apifootball get_events");

        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "apifootball API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let body = resp.text().await.map_err(ProviderError::from_transport)?;
        parse_events(&body)
    }
}

#[async_trait]
impl GoalSource for ApiFootballClient {
    fn name(&self) -> &str {
        "apifootball"
    }

    async fn matches_on(&self, date: NaiveDate) -> Result<Vec<GoalDetailMatch>, ProviderError> {
        self.get_events(date, None).await
    }

    async fn match_detail(
        &self,
        match_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<GoalDetailMatch>, ProviderError> {
        self.get_events(date, Some(match_id)).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    match_id: String,
    match_hometeam_id: String,
    match_awayteam_id: String,
    #[serde(default)]
    match_hometeam_name: String,
    #[serde(default)]
    match_awayteam_name: String,
    #[serde(default)]
    goalscorer: Vec<ApiGoal>,
}

#[derive(Debug, Deserialize)]
struct ApiGoal {
    #[serde(default)]
    time: String,
    #[serde(default)]
    home_scorer: String,
    #[serde(default)]
    away_scorer: String,
}

/// The provider answers "nothing found" with an object instead of an array.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: serde_json::Value,
    #[serde(default)]
    message: String,
}

/// Parse a `get_events` body.
///
/// An empty body, an empty array or the provider's `{"error": ..}` object are
/// all [`ProviderError::Empty`]. Records whose team ids are not numeric are
/// skipped.
pub fn parse_events(body: &str) -> Result<Vec<GoalDetailMatch>, ProviderError> {
    if body.trim().is_empty() {
        return Err(ProviderError::Empty("empty body".to_string()));
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if value.is_object() {
        let err: ApiErrorBody =
            serde_json::from_value(value).map_err(|e| ProviderError::Parse(e.to_string()))?;
        return Err(ProviderError::Empty(format!("{} ({})", err.message, err.error)));
    }

    let events: Vec<ApiEvent> =
        serde_json::from_value(value).map_err(|e| ProviderError::Parse(e.to_string()))?;
    if events.is_empty() {
        return Err(ProviderError::Empty("no events".to_string()));
    }

    Ok(events
        .into_iter()
        .filter_map(|e| {
            let home_team_id = e.match_hometeam_id.trim().parse().ok();
            let away_team_id = e.match_awayteam_id.trim().parse().ok();
            let (Some(home_team_id), Some(away_team_id)) = (home_team_id, away_team_id) else {
                warn!(match_id = %e.match_id, "skipping event with non-numeric team ids");
                return None;
            };
            Some(GoalDetailMatch {
                match_id: e.match_id,
                home_team_id,
                away_team_id,
                home_team: e.match_hometeam_name,
                away_team: e.match_awayteam_name,
                goals: e
                    .goalscorer
                    .into_iter()
                    .map(|g| GoalEvent {
                        time: g.time,
                        home_scorer: g.home_scorer,
                        away_scorer: g.away_scorer,
                    })
                    .collect(),
            })
        })
        .collect())
}
