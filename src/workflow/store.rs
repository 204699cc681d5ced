use crate::shared::ids::SessionId;
use crate::workflow::session::{Session, StepOutput};
use crate::workflow::step::Step;
use crate::workflow::WorkflowError;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process session registry. One human edits one session at a time, so the
/// only guarantee needed from concurrent access is isolation between session
/// ids and last-writer-wins within one.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<BTreeMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.session_id.clone(), session);
    }

    pub fn get(&self, session_id: &SessionId) -> Result<Session, WorkflowError> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownSession {
                session_id: session_id.to_string(),
            })
    }

    pub fn put_step_output(
        &self,
        session_id: &SessionId,
        step: Step,
        output: StepOutput,
        now: &str,
    ) -> Result<(), WorkflowError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session =
            sessions
                .get_mut(session_id)
                .ok_or_else(|| WorkflowError::UnknownSession {
                    session_id: session_id.to_string(),
                })?;
        session.put_step_output(step, output, now);
        Ok(())
    }

    pub fn invalidate_downstream(
        &self,
        session_id: &SessionId,
        from: Step,
        now: &str,
    ) -> Result<(), WorkflowError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session =
            sessions
                .get_mut(session_id)
                .ok_or_else(|| WorkflowError::UnknownSession {
                    session_id: session_id.to_string(),
                })?;
        session.invalidate_downstream(from, now);
        Ok(())
    }

    /// Move the cursor without touching stored outputs, for revisiting an
    /// earlier step before deciding to rewrite it.
    pub fn set_current_step(
        &self,
        session_id: &SessionId,
        step: Step,
        now: &str,
    ) -> Result<(), WorkflowError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session =
            sessions
                .get_mut(session_id)
                .ok_or_else(|| WorkflowError::UnknownSession {
                    session_id: session_id.to_string(),
                })?;
        session.current_step = step.index();
        session.updated_at = now.to_string();
        Ok(())
    }

    /// Replace the stored session wholesale (last-writer-wins).
    pub fn save(&self, session: Session) -> Result<(), WorkflowError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(&session.session_id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(WorkflowError::UnknownSession {
                session_id: session.session_id.to_string(),
            }),
        }
    }

    pub fn remove(&self, session_id: &SessionId) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.keys().cloned().collect()
    }
}
