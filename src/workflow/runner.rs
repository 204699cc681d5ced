use crate::provider::{ProviderKind, ProviderRequest, TextGenerator};
use crate::validation::validate_step_input;
use crate::workflow::session::{Session, StepOutput};
use crate::workflow::step::Step;
use crate::workflow::{prompt, WorkflowError};
use serde_json::{Map, Value};

/// Shared step-processor contract: every one of the eight steps runs through
/// this path. Validation happens before any outbound call; exactly one
/// provider request is issued; the session is only written after the response
/// passes the step's schema. No retries here; the caller owns retry policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner;

impl StepRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn run(
        &self,
        session: &mut Session,
        step: Step,
        input: &Map<String, Value>,
        generator: &dyn TextGenerator,
        now: &str,
    ) -> Result<StepOutput, WorkflowError> {
        let missing = session.missing_prerequisites(step);
        if !missing.is_empty() {
            return Err(WorkflowError::StepOrder {
                step: step.slug().to_string(),
                missing,
            });
        }

        let violations = validate_step_input(step, input);
        if !violations.is_empty() {
            return Err(WorkflowError::Validation(violations));
        }

        let rendered = prompt::render_step_prompt(session, step, input)?;
        let provider = ProviderKind::for_model(&session.selected_model)?;
        let request = ProviderRequest::new(rendered, session.selected_model.clone())
            .with_temperature(step.temperature())
            .with_max_tokens(step.max_tokens())
            .structured();

        let response = generator.generate(&request, provider)?;
        let fields = response
            .structured
            .ok_or_else(|| WorkflowError::SchemaMismatch {
                step: step.slug().to_string(),
                missing: step
                    .required_output_keys()
                    .iter()
                    .map(|key| key.to_string())
                    .collect(),
            })?;

        let mut absent: Vec<String> = step
            .required_output_keys()
            .iter()
            .filter(|key| !fields.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !absent.is_empty() {
            absent.sort();
            return Err(WorkflowError::SchemaMismatch {
                step: step.slug().to_string(),
                missing: absent,
            });
        }

        let output = StepOutput {
            fields,
            model_used: response.model,
            tokens_used: response.tokens_used,
            generated_at: now.to_string(),
        };
        session.put_step_output(step, output.clone(), now);
        Ok(output)
    }
}
