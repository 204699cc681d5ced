use crate::config::{ensure_state_root, resolve_state_root, ProviderCredentials, Settings};
use crate::output::{export, ExportFormat};
use crate::provider::ProviderClient;
use crate::shared::ids::{generate_session_id, SessionId};
use crate::shared::logging::append_activity_log_line;
use crate::workflow::step::{FieldKind, Step};
use crate::workflow::{Session, StepRunner, STEP_COUNT};
use chrono::Utc;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn help_text() -> String {
    [
        "usage: pageforge <command> ...",
        "",
        "commands:",
        "  session new <project_name> [--model <model>]   create a session",
        "  session list                                   list session ids",
        "  session show <session_id>                      print session state",
        "  session delete <session_id>                    remove a session",
        "  step inputs <step_index>                       describe a step's input fields",
        "  step run <session_id> <step_index> --input <file.json>",
        "                                                 run one step against the model",
        "  export <session_id> <html|markdown|docx|bundle> [--out <dir>]",
        "                                                 render a completed session",
    ]
    .join("\n")
}

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match args[0].as_str() {
        "help" | "--help" | "-h" => Ok(help_text()),
        "session" => cmd_session(&args[1..]),
        "step" => cmd_step(&args[1..]),
        "export" => cmd_export(&args[1..]),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn cmd_session(args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: session <new|list|show|delete> ...".to_string());
    }

    match args[0].as_str() {
        "new" => {
            if args.len() < 2 {
                return Err("usage: session new <project_name> [--model <model>]".to_string());
            }
            let project_name = args[1].trim();
            if project_name.is_empty() {
                return Err("project name must be non-empty".to_string());
            }
            let model = parse_model_flag(&args[2..])?;
            let state_root = prepare_state_root()?;
            let settings = Settings::load(&state_root).map_err(|e| e.to_string())?;
            let model = model.unwrap_or(settings.default_model);

            let now = Utc::now();
            let session_id = generate_session_id(now.timestamp())?;
            let session = Session::new(
                session_id.clone(),
                project_name,
                model.clone(),
                &now.to_rfc3339(),
            );
            save_session(&state_root, &session)?;
            log_activity(
                &state_root,
                &format!("session.new id={session_id} project={project_name} model={model}"),
            );
            Ok(format!(
                "session created\nsession_id={session_id}\nproject={project_name}\nmodel={model}"
            ))
        }
        "list" => {
            if args.len() != 1 {
                return Err("usage: session list".to_string());
            }
            let state_root = prepare_state_root()?;
            let mut ids = session_ids_on_disk(&state_root)?;
            ids.sort();
            Ok(ids.join("\n"))
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: session show <session_id>".to_string());
            }
            let state_root = prepare_state_root()?;
            let session = load_session(&state_root, &args[1])?;
            let completed: Vec<String> = Step::ALL
                .iter()
                .filter(|step| session.is_step_completed(**step))
                .map(|step| format!("{}:{}", step.index(), step.slug()))
                .collect();
            Ok(format!(
                "session_id={}\nproject={}\nmodel={}\ncurrent_step={}\ncompleted={}/{}\nsteps={}\nupdated_at={}",
                session.session_id,
                session.project_name,
                session.selected_model,
                session.current_step,
                session.completed_count(),
                STEP_COUNT,
                completed.join(","),
                session.updated_at
            ))
        }
        "delete" => {
            if args.len() != 2 {
                return Err("usage: session delete <session_id>".to_string());
            }
            let state_root = prepare_state_root()?;
            let session_id = SessionId::parse(&args[1])?;
            let path = session_path(&state_root, session_id.as_str());
            if !path.is_file() {
                return Err(format!("unknown session `{session_id}`"));
            }
            fs::remove_file(&path)
                .map_err(|e| format!("failed to remove {}: {e}", path.display()))?;
            log_activity(&state_root, &format!("session.delete id={session_id}"));
            Ok(format!("session deleted\nsession_id={session_id}"))
        }
        other => Err(format!("unknown session subcommand `{other}`")),
    }
}

fn cmd_step(args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: step <inputs|run> ...".to_string());
    }

    match args[0].as_str() {
        "inputs" => {
            if args.len() != 2 {
                return Err("usage: step inputs <step_index>".to_string());
            }
            let step = parse_step_index(&args[1])?;
            let mut lines = vec![format!("step {}: {}", step.index(), step.title())];
            for field in step.input_fields() {
                let requirement = if field.required { "required" } else { "optional" };
                lines.push(format!(
                    "  {} ({requirement}, {})",
                    field.name,
                    describe_field_kind(&field.kind)
                ));
            }
            Ok(lines.join("\n"))
        }
        "run" => {
            if args.len() != 5 || args[3] != "--input" {
                return Err(
                    "usage: step run <session_id> <step_index> --input <file.json>".to_string(),
                );
            }
            let state_root = prepare_state_root()?;
            let mut session = load_session(&state_root, &args[1])?;
            let step = parse_step_index(&args[2])?;
            let input = read_input_file(Path::new(&args[4]))?;

            let settings = Settings::load(&state_root).map_err(|e| e.to_string())?;
            let client = ProviderClient::new(
                ProviderCredentials::from_env(),
                Duration::from_secs(settings.request_timeout_seconds),
            );
            let now = Utc::now().to_rfc3339();
            let output = StepRunner::new()
                .run(&mut session, step, &input, &client, &now)
                .map_err(|e| e.to_string())?;
            save_session(&state_root, &session)?;
            log_activity(
                &state_root,
                &format!(
                    "step.run id={} step={} model={} tokens={}",
                    session.session_id,
                    step.slug(),
                    output.model_used,
                    output
                        .tokens_used
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
            );
            Ok(format!(
                "step completed\nsession_id={}\nstep={}\ncompleted={}/{}\noutput_keys={}",
                session.session_id,
                step.slug(),
                session.completed_count(),
                STEP_COUNT,
                output
                    .fields
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(",")
            ))
        }
        other => Err(format!("unknown step subcommand `{other}`")),
    }
}

fn cmd_export(args: &[String]) -> Result<String, String> {
    if args.len() < 2 {
        return Err(
            "usage: export <session_id> <html|markdown|docx|bundle> [--out <dir>]".to_string(),
        );
    }
    let out_dir = parse_out_flag(&args[2..])?;
    let state_root = prepare_state_root()?;
    let session = load_session(&state_root, &args[0])?;
    let format = ExportFormat::parse(&args[1])?;
    let artifact = export(&session, format).map_err(|e| e.to_string())?;

    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)
        .map_err(|e| format!("failed to create {}: {e}", out_dir.display()))?;
    let path = out_dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    log_activity(
        &state_root,
        &format!(
            "export id={} format={} bytes={}",
            session.session_id,
            format.as_str(),
            artifact.bytes.len()
        ),
    );
    Ok(format!(
        "export written\nsession_id={}\nformat={}\npath={}\nbytes={}",
        session.session_id,
        format.as_str(),
        path.display(),
        artifact.bytes.len()
    ))
}

fn parse_model_flag(args: &[String]) -> Result<Option<String>, String> {
    match args {
        [] => Ok(None),
        [flag, model] if flag == "--model" => Ok(Some(model.clone())),
        _ => Err("usage: session new <project_name> [--model <model>]".to_string()),
    }
}

fn parse_out_flag(args: &[String]) -> Result<Option<PathBuf>, String> {
    match args {
        [] => Ok(None),
        [flag, dir] if flag == "--out" => Ok(Some(PathBuf::from(dir))),
        _ => Err("usage: export <session_id> <format> [--out <dir>]".to_string()),
    }
}

fn parse_step_index(raw: &str) -> Result<Step, String> {
    let index: u8 = raw
        .parse()
        .map_err(|_| format!("invalid step index `{raw}`"))?;
    Step::from_index(index).ok_or_else(|| format!("step index must be 1..={STEP_COUNT}"))
}

fn describe_field_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text { min, max } => format!("text {min}..{max} chars"),
        FieldKind::Choice(options) => format!("one of: {}", options.join(" | ")),
        FieldKind::Url => "http(s) url".to_string(),
        FieldKind::Integer { min, max } => format!("integer {min}..{max}"),
        FieldKind::Flag => "true|false".to_string(),
    }
}

fn prepare_state_root() -> Result<PathBuf, String> {
    let state_root = resolve_state_root().map_err(|e| e.to_string())?;
    ensure_state_root(&state_root).map_err(|e| e.to_string())?;
    Ok(state_root)
}

fn session_path(state_root: &Path, session_id: &str) -> PathBuf {
    state_root.join("sessions").join(format!("{session_id}.json"))
}

fn load_session(state_root: &Path, raw_id: &str) -> Result<Session, String> {
    let session_id = SessionId::parse(raw_id)?;
    let path = session_path(state_root, session_id.as_str());
    if !path.is_file() {
        return Err(format!("unknown session `{session_id}`"));
    }
    let raw =
        fs::read_to_string(&path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    Session::from_json(&raw).map_err(|e| e.to_string())
}

fn save_session(state_root: &Path, session: &Session) -> Result<(), String> {
    let path = session_path(state_root, session.session_id.as_str());
    let encoded = session.to_json().map_err(|e| e.to_string())?;
    fs::write(&path, encoded).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

fn session_ids_on_disk(state_root: &Path) -> Result<Vec<String>, String> {
    let dir = state_root.join("sessions");
    let entries =
        fs::read_dir(&dir).map_err(|e| format!("failed to read {}: {e}", dir.display()))?;
    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("failed to read {}: {e}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(id) = name.strip_suffix(".json") {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

fn read_input_file(path: &Path) -> Result<Map<String, Value>, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid json in {}: {e}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(format!(
            "input file {} must contain a json object",
            path.display()
        )),
    }
}

// Activity logging is best-effort. A failed log write never fails the command.
fn log_activity(state_root: &Path, line: &str) {
    let stamped = format!("{} {line}", Utc::now().to_rfc3339());
    let _ = append_activity_log_line(state_root, &stamped);
}
