use std::sync::Arc;

use tracing::info;

use crate::{
    error::{CacheError, Result},
    store::{FixtureCache, ROUND_KEY},
};

/// Accessor over the shared "current competition round" scalar.
///
/// Reading before any writer stored a value is [`CacheError::RoundNotConfigured`],
/// which callers must keep distinct from a stored round of zero.
#[derive(Clone)]
pub struct RoundTracker {
    cache: Arc<FixtureCache>,
}

impl RoundTracker {
    pub fn new(cache: Arc<FixtureCache>) -> Self {
        Self { cache }
    }

    pub fn active_round(&self) -> Result<u32> {
        let raw = self
            .cache
            .get_scalar(ROUND_KEY)?
            .ok_or(CacheError::RoundNotConfigured)?;
        raw.trim().parse().map_err(|e: std::num::ParseIntError| CacheError::Corrupt {
            key: ROUND_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn set_active_round(&self, round: u32) -> Result<()> {
        self.cache.set_scalar(ROUND_KEY, &round.to_string())?;
        info!(round, "active round stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RoundTracker {
        RoundTracker::new(Arc::new(FixtureCache::open_in_memory().unwrap()))
    }

    #[test]
    fn unset_round_is_not_zero() {
        let rounds = tracker();
        assert!(matches!(rounds.active_round(), Err(CacheError::RoundNotConfigured)));

        rounds.set_active_round(0).unwrap();
        assert_eq!(rounds.active_round().unwrap(), 0);
    }

    #[test]
    fn round_overwrites() {
        let rounds = tracker();
        rounds.set_active_round(9).unwrap();
        rounds.set_active_round(10).unwrap();
        assert_eq!(rounds.active_round().unwrap(), 10);
    }

    #[test]
    fn garbage_round_is_corrupt() {
        let cache = Arc::new(FixtureCache::open_in_memory().unwrap());
        cache.set_scalar(ROUND_KEY, "ten").unwrap();
        let rounds = RoundTracker::new(cache);
        assert!(matches!(rounds.active_round(), Err(CacheError::Corrupt { .. })));
    }
}
