use pageforge::shared::ids::SessionId;
use pageforge::workflow::{Session, SessionStore, Step, StepOutput, WorkflowError};
use serde_json::{json, Map};
use std::sync::Arc;
use std::thread;

const NOW: &str = "2026-08-01T00:00:00+00:00";

fn session(id: &str) -> Session {
    Session::new(
        SessionId::parse(id).expect("session id"),
        "Acme Launch",
        "gemini-1.5-pro",
        NOW,
    )
}

fn output_for(step: Step) -> StepOutput {
    let mut fields = Map::new();
    for key in step.required_output_keys() {
        fields.insert((*key).to_string(), json!(format!("{key} value")));
    }
    StepOutput {
        fields,
        model_used: "gemini-1.5-pro".to_string(),
        tokens_used: None,
        generated_at: NOW.to_string(),
    }
}

#[test]
fn store_module_get_clones_and_unknown_ids_are_errors() {
    let store = SessionStore::new();
    store.insert(session("sess-a"));

    let mut copy = store.get(&SessionId::parse("sess-a").expect("id")).expect("get");
    copy.project_name = "mutated locally".to_string();
    let fresh = store.get(&SessionId::parse("sess-a").expect("id")).expect("get again");
    assert_eq!(fresh.project_name, "Acme Launch");

    let err = store
        .get(&SessionId::parse("sess-missing").expect("id"))
        .expect_err("unknown id");
    assert!(matches!(err, WorkflowError::UnknownSession { .. }));
}

#[test]
fn store_module_step_writes_invalidate_downstream_in_place() {
    let store = SessionStore::new();
    store.insert(session("sess-a"));
    let id = SessionId::parse("sess-a").expect("id");

    store
        .put_step_output(&id, Step::Research, output_for(Step::Research), NOW)
        .expect("step 1");
    store
        .put_step_output(&id, Step::Outline, output_for(Step::Outline), NOW)
        .expect("step 2");
    store
        .put_step_output(&id, Step::Hero, output_for(Step::Hero), NOW)
        .expect("step 3");

    let later = "2026-08-02T00:00:00+00:00";
    store
        .put_step_output(&id, Step::Research, output_for(Step::Research), later)
        .expect("rewrite step 1");

    let current = store.get(&id).expect("get");
    assert!(current.is_step_completed(Step::Research));
    assert!(!current.is_step_completed(Step::Outline));
    assert!(!current.is_step_completed(Step::Hero));
    assert_eq!(current.updated_at, later);
}

#[test]
fn store_module_moving_the_cursor_keeps_outputs_intact() {
    let store = SessionStore::new();
    store.insert(session("sess-a"));
    let id = SessionId::parse("sess-a").expect("id");

    store
        .put_step_output(&id, Step::Research, output_for(Step::Research), NOW)
        .expect("step 1");
    store
        .put_step_output(&id, Step::Outline, output_for(Step::Outline), NOW)
        .expect("step 2");

    store
        .set_current_step(&id, Step::Research, NOW)
        .expect("revisit step 1");
    let current = store.get(&id).expect("get");
    assert_eq!(current.current_step, 1);
    assert!(current.is_step_completed(Step::Research));
    assert!(current.is_step_completed(Step::Outline));
}

#[test]
fn store_module_save_is_last_writer_wins() {
    let store = SessionStore::new();
    store.insert(session("sess-a"));
    let id = SessionId::parse("sess-a").expect("id");

    let mut first = store.get(&id).expect("get");
    let mut second = store.get(&id).expect("get");
    first.selected_model = "gpt-4".to_string();
    second.selected_model = "claude-3-5-sonnet-20240620".to_string();

    store.save(first).expect("save first");
    store.save(second).expect("save second");
    assert_eq!(
        store.get(&id).expect("get").selected_model,
        "claude-3-5-sonnet-20240620"
    );

    assert!(store.save(session("sess-never-inserted")).is_err());
}

#[test]
fn store_module_isolates_sessions_under_concurrent_writers() {
    let store = Arc::new(SessionStore::new());
    store.insert(session("sess-a"));
    store.insert(session("sess-b"));

    let handles: Vec<_> = ["sess-a", "sess-b"]
        .into_iter()
        .map(|id| {
            let store = Arc::clone(&store);
            let id = SessionId::parse(id).expect("id");
            thread::spawn(move || {
                for _ in 0..50 {
                    store
                        .put_step_output(&id, Step::Research, output_for(Step::Research), NOW)
                        .expect("write");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    for id in ["sess-a", "sess-b"] {
        let current = store
            .get(&SessionId::parse(id).expect("id"))
            .expect("get");
        assert!(current.is_step_completed(Step::Research));
    }
    let mut ids = store.session_ids();
    ids.sort();
    assert_eq!(ids.len(), 2);

    store.remove(&SessionId::parse("sess-a").expect("id"));
    assert_eq!(store.session_ids().len(), 1);
}
