use pageforge::shared::ids::SessionId;
use pageforge::workflow::{Session, Step, StepOutput, STEP_COUNT};
use serde_json::{json, Map, Value};

fn output_for(step: Step, stamp: &str) -> StepOutput {
    let mut fields = Map::new();
    for key in step.required_output_keys() {
        fields.insert((*key).to_string(), json!(format!("{key} value")));
    }
    StepOutput {
        fields,
        model_used: "gemini-1.5-pro".to_string(),
        tokens_used: Some(100),
        generated_at: stamp.to_string(),
    }
}

fn new_session() -> Session {
    Session::new(
        SessionId::parse("sess-test-0001").expect("session id"),
        "Acme Launch",
        "gemini-1.5-pro",
        "2026-08-01T00:00:00+00:00",
    )
}

#[test]
fn session_module_tracks_completion_in_step_order() {
    let mut session = new_session();
    assert_eq!(session.current_step, 1);
    assert!(!session.is_complete());
    assert_eq!(session.missing_steps(), (1..=STEP_COUNT).collect::<Vec<_>>());

    for step in Step::ALL {
        assert!(session
            .missing_prerequisites(step)
            .iter()
            .all(|idx| *idx < step.index()));
        session.put_step_output(step, output_for(step, "2026-08-01T01:00:00+00:00"), "2026-08-01T01:00:00+00:00");
        assert!(session.is_step_completed(step));
    }

    assert!(session.is_complete());
    assert_eq!(session.completed_count(), STEP_COUNT as usize);
    assert!(session.missing_steps().is_empty());
    assert_eq!(session.updated_at, "2026-08-01T01:00:00+00:00");
}

#[test]
fn session_module_rewriting_a_step_clears_everything_downstream() {
    let mut session = new_session();
    let stamp = "2026-08-01T01:00:00+00:00";
    for step in Step::ALL {
        session.put_step_output(step, output_for(step, stamp), stamp);
    }

    let later = "2026-08-02T00:00:00+00:00";
    session.put_step_output(Step::Hero, output_for(Step::Hero, later), later);

    assert!(session.is_step_completed(Step::Research));
    assert!(session.is_step_completed(Step::Outline));
    assert!(session.is_step_completed(Step::Hero));
    for step in [
        Step::PasCopy,
        Step::SocialProof,
        Step::FinalCta,
        Step::Assembly,
        Step::Design,
    ] {
        assert!(!session.is_step_completed(step), "step {step} should be cleared");
    }
    assert_eq!(session.missing_steps(), vec![4, 5, 6, 7, 8]);
    assert_eq!(session.updated_at, later);
}

#[test]
fn session_module_prerequisites_report_only_missing_earlier_steps() {
    let mut session = new_session();
    let stamp = "2026-08-01T01:00:00+00:00";
    session.put_step_output(Step::Research, output_for(Step::Research, stamp), stamp);

    assert!(session.missing_prerequisites(Step::Outline).is_empty());
    assert_eq!(session.missing_prerequisites(Step::Hero), vec![2]);
    assert_eq!(session.missing_prerequisites(Step::Design), vec![2, 3, 4, 5, 6, 7]);
}

#[test]
fn session_module_json_round_trip_preserves_state() {
    let mut session = new_session();
    let stamp = "2026-08-01T01:00:00+00:00";
    session.put_step_output(Step::Research, output_for(Step::Research, stamp), stamp);
    session.put_step_output(Step::Outline, output_for(Step::Outline, stamp), stamp);

    let encoded = session.to_json().expect("encode");
    let decoded = Session::from_json(&encoded).expect("decode");
    assert_eq!(decoded, session);

    let parsed: Value = serde_json::from_str(&encoded).expect("raw json");
    assert_eq!(parsed["session_id"], json!("sess-test-0001"));
    assert_eq!(parsed["current_step"], json!(3));
}

#[test]
fn session_module_rejects_malformed_records() {
    assert!(Session::from_json("{").is_err());
    assert!(Session::from_json("{\"session_id\":\"bad/id\"}").is_err());
}
