use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-candidate mutual exclusion. Writers for one candidate serialize;
/// different candidates never contend.
#[derive(Clone, Default)]
pub struct CandidateLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl CandidateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, candidate_id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            map.entry(candidate_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Drops the entry for an abandoned candidate once nobody holds it.
    pub fn forget(&self, candidate_id: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if map.get(&candidate_id).is_some_and(|m| Arc::strong_count(m) == 1) {
            map.remove(&candidate_id);
        }
    }
}
