use pageforge::commands::run_cli;
use std::fs;

fn run(args: &[&str]) -> Result<String, String> {
    run_cli(args.iter().map(|arg| arg.to_string()).collect())
}

#[test]
fn commands_module_help_lists_every_verb() {
    let help = run(&[]).expect("help");
    for verb in ["session new", "session show", "step inputs", "step run", "export"] {
        assert!(help.contains(verb), "help must mention `{verb}`");
    }
    assert_eq!(run(&["help"]).expect("explicit help"), help);
    assert!(run(&["bogus"]).expect_err("unknown verb").contains("bogus"));
}

#[test]
fn commands_module_step_inputs_describes_fields_without_touching_state() {
    let described = run(&["step", "inputs", "3"]).expect("hero inputs");
    assert!(described.contains("Hero Section Copy"));
    assert!(described.contains("headline_style"));
    assert!(described.contains("required"));
    assert!(described.contains("variants"));
    assert!(described.contains("integer 2..5"));

    assert!(run(&["step", "inputs", "0"]).is_err());
    assert!(run(&["step", "inputs", "9"]).is_err());
    assert!(run(&["step", "inputs", "three"]).is_err());
}

// One test owns the process-wide state root override; splitting it across
// tests would race on the environment variable.
#[test]
fn commands_module_session_lifecycle_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::env::set_var("PAGEFORGE_STATE_ROOT", dir.path());

    let created = run(&["session", "new", "KetoBurn Launch", "--model", "gpt-4"])
        .expect("session new");
    assert!(created.contains("project=KetoBurn Launch"));
    assert!(created.contains("model=gpt-4"));
    let session_id = created
        .lines()
        .find_map(|line| line.strip_prefix("session_id="))
        .expect("session id line")
        .to_string();
    assert!(session_id.starts_with("sess-"));
    assert!(dir
        .path()
        .join("sessions")
        .join(format!("{session_id}.json"))
        .is_file());

    let listed = run(&["session", "list"]).expect("session list");
    assert!(listed.contains(&session_id));

    let shown = run(&["session", "show", &session_id]).expect("session show");
    assert!(shown.contains("current_step=1"));
    assert!(shown.contains("completed=0/8"));

    // Invalid step input fails validation before any provider traffic.
    let input_path = dir.path().join("input.json");
    fs::write(&input_path, "{\"product_name\": \"X\"}").expect("write input");
    let err = run(&[
        "step",
        "run",
        &session_id,
        "1",
        "--input",
        input_path.to_str().expect("utf8 path"),
    ])
    .expect_err("invalid step input");
    assert!(err.contains("target_audience"));

    let err = run(&["export", &session_id, "html"]).expect_err("incomplete session");
    assert!(err.contains("incomplete"));

    let err = run(&["session", "show", "sess-no-such-0001"]).expect_err("unknown session");
    assert!(err.contains("unknown session"));

    let deleted = run(&["session", "delete", &session_id]).expect("session delete");
    assert!(deleted.contains(&session_id));
    assert!(run(&["session", "show", &session_id]).is_err());

    let log = fs::read_to_string(dir.path().join("logs/pageforge.log")).expect("activity log");
    assert!(log.contains("session.new"));
    assert!(log.contains("session.delete"));

    std::env::remove_var("PAGEFORGE_STATE_ROOT");
}
