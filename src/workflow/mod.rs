pub mod prompt;
pub mod runner;
pub mod session;
pub mod step;
pub mod store;

use crate::provider::ProviderError;
use crate::validation::Violation;

pub use runner::StepRunner;
pub use session::{Session, SessionCodecError, StepOutput};
pub use step::{Step, STEP_COUNT};
pub use store::SessionStore;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("no session with id `{session_id}`")]
    UnknownSession { session_id: String },
    #[error("step `{step}` requires completed steps {missing:?}")]
    StepOrder { step: String, missing: Vec<u8> },
    #[error("input validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),
    #[error("failed to render prompt for step `{step}`: {reason}")]
    PromptRender { step: String, reason: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("step `{step}` response is missing required keys: {}", .missing.join(", "))]
    SchemaMismatch { step: String, missing: Vec<String> },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| violation.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl WorkflowError {
    /// Retryable failures can be re-run with identical input; the rest need
    /// user or operator action first.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::SchemaMismatch { .. } => true,
            WorkflowError::Provider(err) => err.is_retryable(),
            _ => false,
        }
    }
}
