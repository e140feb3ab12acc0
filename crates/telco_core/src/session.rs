//! In-memory session manager.
//!
//! Keeps each open session's role and history between runs and allows only
//! one in-flight workflow per session, so history appends never race. Runs
//! for different sessions proceed independently. Nothing is persisted; a
//! closed session (logout) forgets its history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::orchestrator::Orchestrator;
use crate::state::{Exchange, Role, SessionContext, SessionState};

#[derive(Debug)]
struct SessionRecord {
    customer_id: String,
    role: Role,
    history: Vec<Exchange>,
    opened_at: DateTime<Utc>,
}

/// Summary of an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub customer_id: String,
    pub role: Role,
    pub turns: usize,
    pub opened_at: DateTime<Utc>,
}

/// Runs queries on behalf of open sessions.
pub struct SessionManager {
    orchestrator: Arc<Orchestrator>,
    sessions: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<SessionRecord>>>>,
}

impl SessionManager {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for an already-resolved customer.
    ///
    /// Opening a session that is already open keeps it as it is, including
    /// its original role.
    pub fn open(&self, customer_id: &str, role: Role) -> CoreResult<()> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() {
            return Err(CoreError::InvalidInput("customer_id is required".to_string()));
        }

        let mut sessions = self.sessions.lock();
        if sessions.contains_key(customer_id) {
            debug!("Session already open: {}", customer_id);
            return Ok(());
        }

        info!("Opening {} session: {}", role, customer_id);
        sessions.insert(
            customer_id.to_string(),
            Arc::new(AsyncMutex::new(SessionRecord {
                customer_id: customer_id.to_string(),
                role,
                history: Vec::new(),
                opened_at: Utc::now(),
            })),
        );
        Ok(())
    }

    /// Run `query` for an open session and record the exchange on success.
    ///
    /// Concurrent calls for the same session are serialized.
    pub async fn ask(&self, customer_id: &str, query: &str) -> CoreResult<SessionState> {
        let entry = self.entry(customer_id)?;
        let mut record = entry.lock().await;

        let context = SessionContext::new(record.customer_id.clone(), record.role)
            .with_history(record.history.clone());
        let state = self.orchestrator.run(query, context).await;

        if state.succeeded() {
            let known = record.history.len();
            record
                .history
                .extend(state.history()[known..].iter().cloned());
        }
        Ok(state)
    }

    /// History of an open session, oldest first.
    pub async fn history(&self, customer_id: &str) -> CoreResult<Vec<Exchange>> {
        let entry = self.entry(customer_id)?;
        let record = entry.lock().await;
        Ok(record.history.clone())
    }

    pub async fn info(&self, customer_id: &str) -> CoreResult<SessionInfo> {
        let entry = self.entry(customer_id)?;
        let record = entry.lock().await;
        Ok(SessionInfo {
            customer_id: record.customer_id.clone(),
            role: record.role,
            turns: record.history.len(),
            opened_at: record.opened_at,
        })
    }

    /// Close a session. Returns whether it was open.
    pub fn close(&self, customer_id: &str) -> bool {
        let removed = self.sessions.lock().remove(customer_id.trim()).is_some();
        if removed {
            info!("Closed session: {}", customer_id);
        }
        removed
    }

    pub fn is_open(&self, customer_id: &str) -> bool {
        self.sessions.lock().contains_key(customer_id.trim())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn entry(&self, customer_id: &str) -> CoreResult<Arc<AsyncMutex<SessionRecord>>> {
        self.sessions
            .lock()
            .get(customer_id.trim())
            .cloned()
            .ok_or_else(|| CoreError::SessionNotFound(customer_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;
    use crate::handler::HandlerSet;
    use crate::state::ErrorKind;
    use telco_llm::ScriptedModel;

    fn manager(model: ScriptedModel) -> SessionManager {
        let orchestrator =
            Orchestrator::with_model(Arc::new(model), HandlerSet::stubs(), &AssistantConfig::default());
        SessionManager::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn test_history_grows_only_on_success() {
        let model = ScriptedModel::new().reply("billing").fail("down").reply("network");
        let sessions = manager(model);
        sessions.open("CUST001", Role::Customer).unwrap();

        let first = sessions.ask("CUST001", "Why is my bill higher?").await.unwrap();
        assert!(first.succeeded());
        assert_eq!(sessions.history("CUST001").await.unwrap().len(), 1);

        let second = sessions.ask("CUST001", "And now?").await.unwrap();
        assert_eq!(second.error().unwrap().kind, ErrorKind::ClassificationFailure);
        assert_eq!(sessions.history("CUST001").await.unwrap().len(), 1);

        let third = sessions.ask("CUST001", "I can't make calls").await.unwrap();
        assert!(third.succeeded());
        let history = sessions.history("CUST001").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].query, "I can't make calls");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let sessions = manager(ScriptedModel::new());
        let err = sessions.ask("nobody", "hello").await.unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_reopen_keeps_role_and_close_forgets() {
        let sessions = manager(ScriptedModel::new().reply("technical"));
        sessions.open("admin", Role::Admin).unwrap();
        sessions.ask("admin", "APN settings?").await.unwrap();

        sessions.open("admin", Role::Customer).unwrap();
        let info = sessions.info("admin").await.unwrap();
        assert_eq!(info.role, Role::Admin);
        assert_eq!(info.turns, 1);

        assert!(sessions.close("admin"));
        assert!(!sessions.is_open("admin"));
        assert!(!sessions.close("admin"));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_blank_customer_cannot_open() {
        let sessions = manager(ScriptedModel::new());
        assert!(matches!(
            sessions.open("  ", Role::Customer),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
