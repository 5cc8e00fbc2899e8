use uuid::Uuid;

use crate::storage::SessionStore;

/// Storage key holding the tab's session id
pub const SESSION_KEY: &str = "chat_session_id";

/// Owns the session identifier for one tab
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    current: Option<String>,
}

impl SessionManager {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Return the tab's session id, creating and persisting one when absent.
    ///
    /// Repeated calls return the same value until [`SessionManager::adopt`]
    /// replaces it.
    pub fn get_or_create_session_id(&mut self) -> String {
        if let Some(id) = &self.current {
            return id.clone();
        }

        let id = match self.store.get(SESSION_KEY).filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                tracing::debug!(session_id = %id, "resumed session");
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                tracing::info!(session_id = %id, "created session");
                self.persist(&id);
                id
            }
        };

        self.current = Some(id.clone());
        id
    }

    /// Switch to a session id issued by the backend.
    ///
    /// Returns true when the id changed. Empty ids are ignored.
    pub fn adopt(&mut self, id: &str) -> bool {
        if id.is_empty() || self.current.as_deref() == Some(id) {
            return false;
        }

        tracing::info!(from = ?self.current, to = %id, "session migrated by backend");
        self.persist(id);
        self.current = Some(id.to_string());
        true
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn persist(&mut self, id: &str) {
        if let Err(e) = self.store.set(SESSION_KEY, id) {
            tracing::warn!(error = %e, "could not persist session id");
        }
    }
}
