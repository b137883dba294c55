use rand::Rng;
use std::path::Path;
use std::time::Duration;

use crate::error::{FeedError, Result};
use crate::state::SeenSet;

/// Older comics fetched alongside the latest one in batch mode.
pub const MAX_BATCH_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Latest,
    RandomUnseen,
}

/// Whether the latest comic is itself a valid random pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRange {
    Inclusive,
    ExcludeLatest,
}

impl CandidateRange {
    fn upper(self, latest: u32) -> u32 {
        match self {
            CandidateRange::Inclusive => latest,
            CandidateRange::ExcludeLatest => latest.saturating_sub(1),
        }
    }
}

pub struct Selector {
    pub policy: Policy,
    pub range: CandidateRange,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Selector {
    /// Pick the next comic id. The caller marks it seen once the comic is fetched.
    ///
    /// When every candidate is already seen the history is cleared and written
    /// to `state_path` before drawing.
    pub async fn pick<R: Rng>(
        &self,
        latest: u32,
        seen: &mut SeenSet,
        state_path: &Path,
        rng: &mut R,
    ) -> Result<u32> {
        if latest == 0 {
            return Err(FeedError::InvalidLatest(latest));
        }
        if self.policy == Policy::Latest {
            return Ok(latest);
        }

        let upper = self.range.upper(latest);
        if upper == 0 {
            return Err(FeedError::InvalidLatest(latest));
        }

        let covered = seen.iter().filter(|&id| id <= upper).count();
        if covered >= upper as usize {
            tracing::info!("All {} comics seen, starting over", upper);
            seen.clear();
            seen.save(state_path)?;
        }

        for attempt in 1..=self.max_attempts {
            let candidate = rng.gen_range(1..=upper);
            if seen.is_new(candidate) {
                tracing::debug!("Picked #{} on attempt {}", candidate, attempt);
                return Ok(candidate);
            }
            tracing::debug!("#{} already seen, retrying", candidate);
            if attempt < self.max_attempts && !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
        }

        Err(FeedError::ExhaustedRetries {
            attempts: self.max_attempts,
        })
    }
}

/// Up to `count` distinct ids older than `latest`, never more than `MAX_BATCH_SIZE`.
pub fn pick_batch<R: Rng>(latest: u32, count: usize, rng: &mut R) -> Result<Vec<u32>> {
    if latest == 0 {
        return Err(FeedError::InvalidLatest(latest));
    }
    let pool = (latest - 1) as usize;
    let amount = count.min(MAX_BATCH_SIZE).min(pool);
    Ok(rand::seq::index::sample(rng, pool, amount)
        .into_iter()
        .map(|i| i as u32 + 1)
        .collect())
}
