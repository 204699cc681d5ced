use crate::output::{docx, html, markdown, project_slug, ExportError};
use crate::workflow::session::Session;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

fn render_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Render {
        format: "bundle",
        reason: err.to_string(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Zip archive holding every export format plus the raw session record and a
/// manifest with SHA-256 digests of each entry. Entry timestamps are fixed so
/// the archive bytes depend only on session content.
pub(crate) fn render(session: &Session) -> Result<Vec<u8>, ExportError> {
    let slug = project_slug(session);
    let session_json = session.to_json().map_err(render_error)?;
    let entries: Vec<(String, Vec<u8>)> = vec![
        (format!("{slug}.html"), html::render(session).into_bytes()),
        (format!("{slug}.md"), markdown::render(session).into_bytes()),
        (format!("{slug}.docx"), docx::render(session)?),
        ("session.json".to_string(), session_json.into_bytes()),
    ];

    let mut manifest_entries: Vec<Value> = entries
        .iter()
        .map(|(name, bytes)| {
            json!({
                "file": name,
                "bytes": bytes.len(),
                "sha256": sha256_hex(bytes),
            })
        })
        .collect();
    manifest_entries.sort_by(|a, b| a["file"].as_str().cmp(&b["file"].as_str()));
    let manifest = json!({
        "session_id": session.session_id.to_string(),
        "project_name": session.project_name,
        "generated_at": session.updated_at,
        "files": manifest_entries,
    });
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).map_err(render_error)?;

    let entry_time = zip::DateTime::from_date_and_time(2020, 1, 1, 0, 0, 0).map_err(|_| {
        ExportError::Render {
            format: "bundle",
            reason: "invalid fixed archive timestamp".to_string(),
        }
    })?;
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(entry_time);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries
        .into_iter()
        .chain(std::iter::once(("manifest.json".to_string(), manifest_bytes)))
    {
        writer.start_file(name, options).map_err(render_error)?;
        writer.write_all(&bytes).map_err(render_error)?;
    }
    let cursor = writer.finish().map_err(render_error)?;
    Ok(cursor.into_inner())
}
