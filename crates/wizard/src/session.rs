//! Wizard sessions and the registry that owns them.

use std::collections::HashMap;
use std::sync::Arc;

use common::SessionId;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::command::StepCommand;
use crate::error::WizardError;
use crate::flow::FlowKind;
use crate::store::StepStore;

/// One running wizard: its flow and the current store value.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    id: SessionId,
    flow: FlowKind,
    store: StepStore,
}

impl WizardSession {
    /// Starts a session for `flow` with a fresh store.
    pub fn create(flow: FlowKind) -> Self {
        Self {
            id: SessionId::new(),
            flow,
            store: flow.initial_state(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn flow(&self) -> FlowKind {
        self.flow
    }

    pub fn store(&self) -> &StepStore {
        &self.store
    }

    /// Applies commands to the session's store, all or nothing.
    pub fn apply(&mut self, commands: Vec<StepCommand>) -> Result<&StepStore, WizardError> {
        self.store = self.store.dispatch_all(commands)?;
        Ok(&self.store)
    }

    /// Ends the session, returning its last store.
    pub fn dispose(self) -> StepStore {
        self.store
    }
}

#[derive(Debug)]
struct Entry {
    session: WizardSession,
    turn: Arc<Mutex<()>>,
}

/// Exclusive right to run one action against a session.
///
/// Holds the session's turn lock from [`SessionRegistry::begin`] until the
/// action's commands are dispatched or the turn is dropped. A second action
/// on the same session waits and then sees the first one's result.
#[derive(Debug)]
pub struct SessionTurn {
    registry: SessionRegistry,
    session: WizardSession,
    _guard: OwnedMutexGuard<()>,
}

impl SessionTurn {
    /// The session as it was when the turn started.
    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Dispatches the action's commands and ends the turn.
    pub async fn dispatch_all(
        self,
        commands: Vec<StepCommand>,
    ) -> Result<WizardSession, WizardError> {
        self.registry
            .dispatch_all(self.session.id(), commands)
            .await
    }
}

/// In-memory set of live wizard sessions.
///
/// Clones share the same sessions. Every dispatch holds the write lock for
/// the whole batch, so concurrent dispatches on one session are applied one
/// after the other. Actions that call out to other services between reading
/// a session and dispatching take a [`SessionTurn`] first.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a session for `flow`.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, flow: FlowKind) -> WizardSession {
        let session = WizardSession::create(flow);
        let entry = Entry {
            session: session.clone(),
            turn: Arc::new(Mutex::new(())),
        };
        self.sessions.write().await.insert(session.id(), entry);

        metrics::counter!("wizard_sessions_created_total", "flow" => flow.as_str()).increment(1);
        tracing::info!(session_id = %session.id(), "wizard session created");
        session
    }

    /// Returns a snapshot of the session.
    pub async fn get(&self, id: SessionId) -> Result<WizardSession, WizardError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.session.clone())
            .ok_or(WizardError::SessionNotFound(id))
    }

    /// Waits for the session's turn and returns it with a fresh snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn begin(&self, id: SessionId) -> Result<SessionTurn, WizardError> {
        let turn = self
            .sessions
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.turn))
            .ok_or(WizardError::SessionNotFound(id))?;
        let guard = turn.lock_owned().await;

        // The session may have been disposed while waiting.
        let session = self.get(id).await?;
        Ok(SessionTurn {
            registry: self.clone(),
            session,
            _guard: guard,
        })
    }

    /// Applies a single command to the session's store.
    pub async fn dispatch(
        &self,
        id: SessionId,
        command: StepCommand,
    ) -> Result<WizardSession, WizardError> {
        self.dispatch_all(id, vec![command]).await
    }

    /// Applies commands to the session's store as one atomic update.
    #[tracing::instrument(skip(self, commands), fields(count = commands.len()))]
    pub async fn dispatch_all(
        &self,
        id: SessionId,
        commands: Vec<StepCommand>,
    ) -> Result<WizardSession, WizardError> {
        let mut sessions = self.sessions.write().await;
        let session = &mut sessions
            .get_mut(&id)
            .ok_or(WizardError::SessionNotFound(id))?
            .session;

        for command in &commands {
            metrics::counter!("wizard_commands_total", "command" => command.name()).increment(1);
        }

        if let Err(e) = session.apply(commands) {
            tracing::warn!(session_id = %id, error = %e, "wizard command rejected");
            return Err(e);
        }
        Ok(session.clone())
    }

    /// Removes the session and returns its final store.
    #[tracing::instrument(skip(self))]
    pub async fn dispose(&self, id: SessionId) -> Result<StepStore, WizardError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(WizardError::SessionNotFound(id))?
            .session;

        metrics::counter!("wizard_sessions_disposed_total").increment(1);
        tracing::info!(session_id = %id, "wizard session disposed");
        Ok(session.dispose())
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::booking;
    use serde_json::json;

    #[tokio::test]
    async fn create_get_dispose() {
        let registry = SessionRegistry::new();
        let session = registry.create(FlowKind::Booking).await;

        let loaded = registry.get(session.id()).await.unwrap();
        assert_eq!(loaded, session);
        assert_eq!(registry.len().await, 1);

        let store = registry.dispose(session.id()).await.unwrap();
        assert!(store.is_pristine());
        assert!(registry.is_empty().await);
        assert_eq!(
            registry.get(session.id()).await.unwrap_err(),
            WizardError::SessionNotFound(session.id())
        );
    }

    #[tokio::test]
    async fn dispatch_updates_stored_session() {
        let registry = SessionRegistry::new();
        let id = registry.create(FlowKind::Booking).await.id();

        registry
            .dispatch(id, StepCommand::save(booking::GUESTS, json!({ "adults": 2 })))
            .await
            .unwrap();

        let session = registry.get(id).await.unwrap();
        let guests = session.store().get_step_by_path(booking::GUESTS).unwrap();
        assert_eq!(guests.value("adults"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn failed_batch_leaves_session_untouched() {
        let registry = SessionRegistry::new();
        let id = registry.create(FlowKind::Booking).await.id();

        let result = registry
            .dispatch_all(
                id,
                vec![
                    StepCommand::save(booking::GUESTS, json!({ "adults": 2 })),
                    StepCommand::set_current("nowhere"),
                ],
            )
            .await;

        assert!(result.is_err());
        assert!(registry.get(id).await.unwrap().store().is_pristine());
    }

    #[tokio::test]
    async fn dispatch_to_unknown_session_fails() {
        let registry = SessionRegistry::new();
        let missing = SessionId::new();
        let result = registry.dispatch(missing, StepCommand::Reset).await;
        assert_eq!(result.unwrap_err(), WizardError::SessionNotFound(missing));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let registry = SessionRegistry::new();
        let a = registry.create(FlowKind::Booking).await.id();
        let b = registry.create(FlowKind::TokenSale).await.id();

        registry
            .dispatch(a, StepCommand::save(booking::GUESTS, json!({ "adults": 1 })))
            .await
            .unwrap();

        let b = registry.get(b).await.unwrap();
        assert_eq!(b.flow(), FlowKind::TokenSale);
        assert!(b.store().is_pristine());
    }

    #[tokio::test]
    async fn turns_on_one_session_run_one_after_the_other() {
        let registry = SessionRegistry::new();
        let id = registry.create(FlowKind::Booking).await.id();

        let first = registry.begin(id).await.unwrap();
        let waiting = registry.clone();
        let second = tokio::spawn(async move {
            let turn = waiting.begin(id).await.unwrap();
            turn.session().store().clone()
        });
        tokio::task::yield_now().await;
        assert!(!second.is_finished());

        first
            .dispatch_all(vec![StepCommand::save(booking::GUESTS, json!({ "adults": 3 }))])
            .await
            .unwrap();

        let seen = second.await.unwrap();
        let guests = seen.get_step_by_path(booking::GUESTS).unwrap();
        assert_eq!(guests.value("adults"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn turn_on_disposed_session_fails() {
        let registry = SessionRegistry::new();
        let id = registry.create(FlowKind::Booking).await.id();
        registry.dispose(id).await.unwrap();

        assert_eq!(
            registry.begin(id).await.unwrap_err(),
            WizardError::SessionNotFound(id)
        );
    }

    #[test]
    fn session_apply_and_dispose() {
        let mut session = WizardSession::create(FlowKind::Subscription);
        session
            .apply(vec![StepCommand::set_current("summary")])
            .unwrap();
        let store = session.dispose();
        assert_eq!(store.current_step().path, "summary");
    }
}
