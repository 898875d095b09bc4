use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::Session;

pub type SessionHandle = Arc<RwLock<Session>>;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub persona_id: String,
    pub message_count: usize,
    pub total_tokens: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Owns every live session. Each session sits behind its own lock so work on
/// one session never blocks another.
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn create(&self, persona_id: &str) -> SessionHandle {
        let session = Session::new(Uuid::new_v4().to_string()).with_persona(persona_id);
        self.insert(session)
    }

    pub fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(RwLock::new(session));
        self.sessions.insert(id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Newest first.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::with_capacity(self.len());
        for handle in self.handles() {
            let session = handle.read().await;
            summaries.push(SessionSummary {
                id: session.id.clone(),
                title: session.title.clone(),
                persona_id: session.persona_id.clone(),
                message_count: session.messages.len(),
                total_tokens: session.total_tokens,
                created_at: session.created_at,
            });
        }
        summaries.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_remove() {
        let store = SessionStore::new();
        let handle = store.create("sandbox");
        let id = tokio_test::block_on(async { handle.read().await.id.clone() });

        assert!(store.contains(&id));
        assert!(store.get(&id).is_some());
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn summaries_reflect_session_state() {
        let store = SessionStore::new();
        let handle = store.create("gamedev");
        {
            let mut session = handle.write().await;
            session.title = "Platformer".to_string();
            session.add_message(crate::session::Message::user("jump"));
        }

        let summaries = store.summaries().await;

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Platformer");
        assert_eq!(summaries[0].persona_id, "gamedev");
        assert_eq!(summaries[0].message_count, 1);
    }
}
