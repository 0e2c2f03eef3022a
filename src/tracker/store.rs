use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::db::models::{ActiveActivity, ActivityRecord};

/// Persistence seam for the recorder. Built once per session and handed to the
/// recorder; nothing in the crate reaches persistence through globals.
pub trait HistoryStore: Send + Sync {
    /// Records in insertion order, oldest first.
    fn load(&self) -> Result<Vec<ActivityRecord>>;

    /// Replace the stored history with `records`.
    fn save(&self, records: &[ActivityRecord]) -> Result<()>;

    fn load_active(&self) -> Result<Option<ActiveActivity>>;

    fn save_active(&self, active: Option<&ActiveActivity>) -> Result<()>;
}

/// Store kept entirely in memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    records: Vec<ActivityRecord>,
    active: Option<ActiveActivity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ActivityRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                records,
                active: None,
            })),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Vec<ActivityRecord>> {
        Ok(self.lock()?.records.clone())
    }

    fn save(&self, records: &[ActivityRecord]) -> Result<()> {
        self.lock()?.records = records.to_vec();
        Ok(())
    }

    fn load_active(&self) -> Result<Option<ActiveActivity>> {
        Ok(self.lock()?.active.clone())
    }

    fn save_active(&self, active: Option<&ActiveActivity>) -> Result<()> {
        self.lock()?.active = active.cloned();
        Ok(())
    }
}
