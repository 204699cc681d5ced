use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn activity_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/pageforge.log")
}

pub fn append_activity_log_line(state_root: &Path, line: &str) -> std::io::Result<()> {
    let path = activity_log_path(state_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_lines_and_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        append_activity_log_line(dir.path(), "session=sess-1 event=created").expect("first line");
        append_activity_log_line(dir.path(), "session=sess-1 step=1 event=completed")
            .expect("second line");
        let contents =
            fs::read_to_string(activity_log_path(dir.path())).expect("read activity log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("step=1"));
    }
}
