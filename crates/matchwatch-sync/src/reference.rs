use std::collections::HashMap;

use matchwatch_core::config::TeamConfig;
use matchwatch_core::{Player, Team};

/// Read-only team reference data owned outside this subsystem.
pub trait TeamDirectory: Send + Sync {
    /// Look a team up by the authoritative provider's short code.
    fn team_by_code(&self, code: &str) -> Option<Team>;

    /// Roster used to repopulate the roster cache on a miss.
    fn players(&self, team_id: u64) -> Vec<Player>;
}

/// Team directory built from the `[[teams]]` config section.
#[derive(Debug, Default)]
pub struct StaticTeamDirectory {
    by_code: HashMap<String, Team>,
    players: HashMap<u64, Vec<Player>>,
}

impl StaticTeamDirectory {
    pub fn from_config(teams: &[TeamConfig]) -> Self {
        let mut dir = Self::default();
        for entry in teams {
            dir.by_code
                .insert(entry.team.code.to_ascii_uppercase(), entry.team.clone());
            dir.players.insert(entry.team.id, entry.players.clone());
        }
        dir
    }
}

impl TeamDirectory for StaticTeamDirectory {
    fn team_by_code(&self, code: &str) -> Option<Team> {
        self.by_code.get(&code.to_ascii_uppercase()).cloned()
    }

    fn players(&self, team_id: u64) -> Vec<Player> {
        self.players.get(&team_id).cloned().unwrap_or_default()
    }
}
