//! Save session registry
//!
//! Process-wide table mapping session tokens to the items created under them.
//! The outer map lock covers lookup and insertion; each session carries its
//! own lock serializing record/update against eviction, so the sweep can
//! never pull a session out from under a running update.
//!
//! Retention is bounded twice over: an idle TTL enforced by a periodic sweep,
//! and a hard cap on concurrent sessions enforced at insertion by evicting
//! the oldest idle entry. Eviction is lossy; updates against an evicted
//! session fail explicitly with `SessionNotFound`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::interval;
use uuid::Uuid;

use refstash_core::models::{Destination, SaveSession, TargetRef};
use refstash_core::{AppError, Config};
use refstash_store::ItemStore;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub idle_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_sessions: usize,
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            idle_secs: config.session_idle_secs,
            sweep_interval_secs: config.session_sweep_interval_secs,
            max_sessions: config.max_sessions,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_secs: 600,
            sweep_interval_secs: 60,
            max_sessions: 100,
        }
    }
}

pub struct SaveSessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<SaveSession>>>>,
    config: SessionConfig,
}

impl SaveSessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Start the background eviction sweep.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut sweep_interval =
                interval(Duration::from_secs(registry.config.sweep_interval_secs.max(1)));
            loop {
                sweep_interval.tick().await;
                registry.sweep().await;
            }
        })
    }

    /// Ensure a session exists for this token. Idempotent: an existing
    /// session is reused and keeps its original destination.
    pub async fn begin(&self, session_id: &str, destination: Destination) {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(session_id) {
            existing.lock().await.touch();
            return;
        }
        if sessions.len() >= self.config.max_sessions {
            Self::evict_oldest(&mut sessions);
        }
        tracing::debug!(session_id = %session_id, "Created save session");
        sessions.insert(
            session_id.to_string(),
            Arc::new(Mutex::new(SaveSession::new(session_id, destination))),
        );
    }

    /// Append created item IDs to a session, in call order. Unknown sessions
    /// are a silent no-op so callers can distinguish "unknown" (via `update`)
    /// from "empty".
    pub async fn record_items(&self, session_id: &str, item_ids: &[Uuid]) {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).cloned()
        };
        let Some(session) = session else {
            tracing::debug!(session_id = %session_id, "No session to record items under");
            return;
        };
        let mut session = session.lock().await;
        session.item_ids.extend_from_slice(item_ids);
        session.touch();
    }

    /// Snapshot of a session, if present.
    pub async fn lookup(&self, session_id: &str) -> Option<SaveSession> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).cloned()
        };
        match session {
            Some(session) => Some(session.lock().await.clone()),
            None => None,
        }
    }

    /// Retarget every item recorded under the session: add to the target
    /// collection (prior memberships kept) and add the comma-separated tags
    /// (idempotent). Returns the affected item IDs.
    ///
    /// The per-session lock is held across the store mutations, so a sweep
    /// cannot evict the session mid-update.
    pub async fn update(
        &self,
        session_id: &str,
        target: Option<TargetRef>,
        tags_csv: Option<&str>,
        store: &dyn ItemStore,
    ) -> Result<Vec<Uuid>, AppError> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).cloned()
        };
        let Some(session) = session else {
            return Err(AppError::SessionNotFound(session_id.to_string()));
        };
        let mut session = session.lock().await;

        let tags: Vec<String> = tags_csv
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut affected = Vec::new();
        for &item_id in &session.item_ids {
            let mut touched = false;
            if let Some(TargetRef::Collection(collection_id)) = target {
                match store.add_to_collection(item_id, collection_id).await {
                    Ok(()) => touched = true,
                    Err(e) => {
                        // Item deleted since the save; retargeting is best-effort per item.
                        tracing::debug!(item_id = %item_id, error = %e, "Skipping collection add");
                        continue;
                    }
                }
            }
            if !tags.is_empty() {
                match store.add_tags(item_id, &tags).await {
                    Ok(()) => touched = true,
                    Err(e) => {
                        tracing::debug!(item_id = %item_id, error = %e, "Skipping tag add");
                        continue;
                    }
                }
            }
            if touched || (target.is_none() && tags.is_empty()) {
                affected.push(item_id);
            }
        }

        session.touch();
        tracing::info!(
            session_id = %session_id,
            affected = affected.len(),
            "Updated save session"
        );
        Ok(affected)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle past the TTL. Sessions whose lock is held (an
    /// update in flight) are skipped and re-checked on the next pass.
    pub async fn sweep(&self) {
        let now = Utc::now();
        let idle_secs = self.config.idle_secs;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session_id, session| match session.try_lock() {
            Ok(session) => {
                let keep = !session.is_idle(now, idle_secs);
                if !keep {
                    tracing::debug!(session_id = %session_id, "Evicting idle save session");
                }
                keep
            }
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Session sweep completed");
        }
    }

    /// Evict the least-recently-active unlocked session to make room.
    fn evict_oldest(sessions: &mut HashMap<String, Arc<Mutex<SaveSession>>>) {
        let oldest = sessions
            .iter()
            .filter_map(|(id, session)| {
                session
                    .try_lock()
                    .ok()
                    .map(|s| (id.clone(), s.last_activity))
            })
            .min_by_key(|(_, last_activity)| *last_activity)
            .map(|(id, _)| id);
        if let Some(id) = oldest {
            tracing::debug!(session_id = %id, "Evicting oldest session at capacity");
            sessions.remove(&id);
        }
    }
}
