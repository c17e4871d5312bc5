use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::scratch::ScratchDir;
use crate::session::InterviewSession;

pub type SharedSession = Arc<Mutex<InterviewSession>>;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// In-memory session registry. Each session has its own mutex, so actions on
/// one session run one at a time while different sessions proceed independently.
///
/// Sessions are released by an explicit delete or, failing that, by the idle
/// sweep once nothing has touched them for the configured time.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: InterviewSession) -> Uuid {
        let id = session.id;
        self.sessions.write().await.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Looks a session up and marks it as active.
    pub async fn get(&self, id: Uuid) -> Result<SharedSession, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for at least `max_idle` and returns their ids.
    /// A session whose lock is held (an action in flight) is kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<Uuid> {
        let now = Instant::now();
        let mut evicted = Vec::new();
        self.sessions.write().await.retain(|id, entry| {
            let idle = now.duration_since(entry.last_seen) >= max_idle
                && entry.session.try_lock().is_ok();
            if idle {
                evicted.push(*id);
            }
            !idle
        });
        evicted
    }
}

/// Evicts idle sessions and removes their scratch directories.
pub async fn sweep_idle_sessions(
    sessions: &SessionStore,
    scratch: &ScratchDir,
    max_idle: Duration,
) -> usize {
    let evicted = sessions.evict_idle(max_idle).await;
    for id in &evicted {
        let wipe = scratch.remove_session(*id).await;
        info!(
            "Expired idle session {id} ({} files removed, {} failures)",
            wipe.removed,
            wipe.failures.len()
        );
    }
    evicted.len()
}

/// Runs `sweep_idle_sessions` every minute for the life of the process.
pub fn spawn_idle_sweeper(
    sessions: SessionStore,
    scratch: ScratchDir,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweep_idle_sessions(&sessions, &scratch, max_idle).await;
        }
    })
}
