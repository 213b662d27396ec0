use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::item::Destination;
use uuid::Uuid;

/// A save session: links a caller-chosen token to the items created by one or
/// more related save calls so a follow-up request can retarget them.
///
/// Lifecycle: created on the first save under a session ID, then `Open` while
/// activity continues, `Idle` once past the idle window, and eventually
/// evicted by the registry sweep. Eviction is lossy; an update against an
/// evicted session fails explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSession {
    pub session_id: String,
    /// Destination resolved when the session was first created. A repeated
    /// `begin` with the same ID does not reset it.
    pub destination: Destination,
    /// Created item identifiers in creation order, parents before children.
    pub item_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SaveSession {
    pub fn new(session_id: impl Into<String>, destination: Destination) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            destination,
            item_ids: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Past the idle window and eligible for eviction.
    pub fn is_idle(&self, now: DateTime<Utc>, idle_secs: u64) -> bool {
        now - self.last_activity >= Duration::seconds(idle_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_not_idle() {
        let session = SaveSession::new("abc", Destination::library_root(Uuid::new_v4()));
        assert!(session.item_ids.is_empty());
        assert!(!session.is_idle(Utc::now(), 600));
    }

    #[test]
    fn session_idles_out_after_window() {
        let session = SaveSession::new("abc", Destination::library_root(Uuid::new_v4()));
        let later = Utc::now() + Duration::seconds(601);
        assert!(session.is_idle(later, 600));
    }
}
