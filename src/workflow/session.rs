use crate::shared::ids::SessionId;
use crate::workflow::step::{Step, STEP_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structured result of one completed step, plus generation provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub fields: Map<String, Value>,
    pub model_used: String,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    pub generated_at: String,
}

/// The full state of one user's workflow run. Step outputs are keyed by index
/// 1..=8; everything downstream of a rewritten step is derived data and is
/// cleared when that step is written again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub project_name: String,
    pub selected_model: String,
    pub current_step: u8,
    #[serde(default)]
    pub outputs: BTreeMap<u8, StepOutput>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionCodecError {
    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode session: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Session {
    pub fn new(
        session_id: SessionId,
        project_name: impl Into<String>,
        selected_model: impl Into<String>,
        now: &str,
    ) -> Self {
        Self {
            session_id,
            project_name: project_name.into(),
            selected_model: selected_model.into(),
            current_step: 1,
            outputs: BTreeMap::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn step_output(&self, step: Step) -> Option<&StepOutput> {
        self.outputs.get(&step.index())
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        self.outputs.contains_key(&step.index())
    }

    /// Indices of the steps before `step` that have no stored output yet.
    pub fn missing_prerequisites(&self, step: Step) -> Vec<u8> {
        (1..step.index())
            .filter(|index| !self.outputs.contains_key(index))
            .collect()
    }

    /// Indices of any of the eight steps still without output.
    pub fn missing_steps(&self) -> Vec<u8> {
        (1..=STEP_COUNT)
            .filter(|index| !self.outputs.contains_key(index))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_steps().is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.outputs.len()
    }

    /// Write the output for `step`, clearing every later index: those entries
    /// were derived from the value this write supersedes. Advances
    /// `current_step` to the next unfinished step.
    pub fn put_step_output(&mut self, step: Step, output: StepOutput, now: &str) {
        self.invalidate_downstream(step, now);
        self.outputs.insert(step.index(), output);
        if step.index() < STEP_COUNT {
            self.current_step = step.index() + 1;
        } else {
            self.current_step = STEP_COUNT;
        }
        self.updated_at = now.to_string();
    }

    /// Clear outputs at indices strictly greater than `from`.
    pub fn invalidate_downstream(&mut self, from: Step, now: &str) {
        let stale: Vec<u8> = self
            .outputs
            .keys()
            .copied()
            .filter(|index| *index > from.index())
            .collect();
        if stale.is_empty() {
            return;
        }
        for index in stale {
            self.outputs.remove(&index);
        }
        self.updated_at = now.to_string();
    }

    pub fn to_json(&self) -> Result<String, SessionCodecError> {
        serde_json::to_string_pretty(self).map_err(SessionCodecError::Encode)
    }

    pub fn from_json(raw: &str) -> Result<Self, SessionCodecError> {
        serde_json::from_str(raw).map_err(SessionCodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(label: &str) -> StepOutput {
        let mut fields = Map::new();
        fields.insert("label".to_string(), json!(label));
        StepOutput {
            fields,
            model_used: "gpt-4".to_string(),
            tokens_used: Some(100),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn session() -> Session {
        Session::new(
            SessionId::parse("sess-test-0001").expect("session id"),
            "KetoBurn Launch",
            "gpt-4",
            "2026-01-01T00:00:00Z",
        )
    }

    #[test]
    fn writing_a_step_advances_the_cursor() {
        let mut session = session();
        session.put_step_output(Step::Research, output("research"), "2026-01-01T00:01:00Z");
        assert_eq!(session.current_step, 2);
        assert!(session.is_step_completed(Step::Research));
        assert_eq!(session.updated_at, "2026-01-01T00:01:00Z");
    }

    #[test]
    fn rewriting_an_early_step_clears_everything_downstream() {
        let mut session = session();
        for step in [
            Step::Research,
            Step::Outline,
            Step::Hero,
            Step::PasCopy,
            Step::SocialProof,
        ] {
            session.put_step_output(step, output(step.slug()), "2026-01-01T00:01:00Z");
        }
        session.put_step_output(Step::Hero, output("hero-v2"), "2026-01-01T00:02:00Z");

        assert!(session.is_step_completed(Step::Research));
        assert!(session.is_step_completed(Step::Outline));
        assert!(session.is_step_completed(Step::Hero));
        assert!(!session.is_step_completed(Step::PasCopy));
        assert!(!session.is_step_completed(Step::SocialProof));
        assert_eq!(session.current_step, 4);
    }

    #[test]
    fn missing_steps_and_prerequisites_are_reported_in_order() {
        let mut session = session();
        session.put_step_output(Step::Research, output("research"), "2026-01-01T00:01:00Z");
        assert_eq!(session.missing_prerequisites(Step::Hero), vec![2]);
        assert_eq!(session.missing_steps(), vec![2, 3, 4, 5, 6, 7, 8]);
        assert!(!session.is_complete());
    }

    #[test]
    fn sessions_round_trip_through_json() {
        let mut session = session();
        session.put_step_output(Step::Research, output("research"), "2026-01-01T00:01:00Z");
        let encoded = session.to_json().expect("encode");
        let decoded = Session::from_json(&encoded).expect("decode");
        assert_eq!(decoded, session);
    }
}
