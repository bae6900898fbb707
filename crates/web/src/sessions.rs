use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use jogging::session::JogSession;
use model::jog::JogRecord;
use tokio::sync::RwLock;
use utility::id::Id;

/// The live jog sessions of the server, keyed by the id their record will be
/// stored under.
#[derive(Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: RwLock<HashMap<Id<JogRecord>, Arc<JogSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> Id<JogRecord> {
        Id::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn insert(&self, session: Arc<JogSession>) {
        self.sessions
            .write()
            .await
            .insert(session.jog_id(), session);
    }

    pub async fn get(&self, id: Id<JogRecord>) -> Option<Arc<JogSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Id<JogRecord>) -> Option<Arc<JogSession>> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
