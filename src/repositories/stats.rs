//! # Processing Stats Repository
//!
//! The stats row is a singleton. It is written explicitly by callers (or the
//! seeder) and never derived from entity mutations.

use chrono::Utc;

use crate::db::MemoryStore;
use crate::error::RepositoryError;
use crate::models::{ProcessingStats, ProcessingStatsPatch};

pub struct StatsRepository<'a> {
    db: &'a MemoryStore,
}

impl<'a> StatsRepository<'a> {
    pub fn new(db: &'a MemoryStore) -> Self {
        Self { db }
    }

    /// Current stats; `None` until the row has been initialized
    pub async fn get_stats(&self) -> Option<ProcessingStats> {
        self.db.read().await.stats.clone()
    }

    /// Merge `patch` into the stats row, starting from zeros if it does not exist yet
    pub async fn update_stats(
        &self,
        patch: ProcessingStatsPatch,
    ) -> Result<ProcessingStats, RepositoryError> {
        let now = Utc::now();
        let mut tables = self.db.write().await;

        let mut stats = tables
            .stats
            .clone()
            .unwrap_or_else(|| ProcessingStats::zeroed(now));
        stats.apply_patch(patch, now)?;

        tables.stats = Some(stats.clone());
        Ok(stats)
    }
}
