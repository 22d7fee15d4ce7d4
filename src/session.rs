// Viewer sessions - one SelectionState per active viewer
//
// The dataset is shared; each controller sits behind its own Mutex so that
// events for one viewer are applied one at a time, in arrival order.
// Sessions idle for longer than the TTL are swept on every create.

use crate::controller::CrossFilterController;
use crate::dashboard::Dashboard;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type SharedController = Arc<Mutex<CrossFilterController>>;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    controller: SharedController,
    last_seen: Instant,
}

pub struct SessionRegistry {
    dashboard: Arc<Dashboard>,
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self::with_ttl(dashboard, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(dashboard: Arc<Dashboard>, ttl: Duration) -> Self {
        SessionRegistry {
            dashboard,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn dashboard(&self) -> &Arc<Dashboard> {
        &self.dashboard
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create(&self) -> (Uuid, SharedController) {
        self.create_at(Instant::now())
    }

    pub fn create_at(&self, now: Instant) -> (Uuid, SharedController) {
        self.sweep_expired_at(now);

        let id = Uuid::new_v4();
        let controller = Arc::new(Mutex::new(self.dashboard.new_session()));

        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                id,
                SessionEntry {
                    controller: Arc::clone(&controller),
                    last_seen: now,
                },
            );

        tracing::info!(session = %id, "viewer session created");
        (id, controller)
    }

    /// Look up a session and mark it as seen
    pub fn get(&self, id: &Uuid) -> Option<SharedController> {
        self.get_at(id, Instant::now())
    }

    pub fn get_at(&self, id: &Uuid, now: Instant) -> Option<SharedController> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.controller))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
            .is_some()
    }

    /// Drop sessions not seen for longer than the TTL. Returns how many went.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let ttl = self.ttl;
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "expired viewer sessions swept");
        }
        removed
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
