// The `vet` command: parse every .proto under a directory and report
// diagnostics. Exit code 0 means a clean workspace.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Diagnostics gathered over one workspace sweep.
pub struct VetReport {
    /// `file:line:col: message` lines, in walk order.
    pub messages: Vec<String>,
    /// Number of .proto files visited.
    pub files: usize,
}

impl VetReport {
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Run vet over the working directory, printing each diagnostic.
/// Returns the process exit code.
pub fn run() -> i32 {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("pbls vet: {e}");
            return 1;
        }
    };
    let report = vet_dir(&cwd);
    for message in &report.messages {
        println!("{message}");
    }
    tracing::debug!(files = report.files, "vet finished");
    if report.is_clean() {
        0
    } else {
        1
    }
}

/// Sweep `root` for .proto files and parse each one.
pub fn vet_dir(root: &Path) -> VetReport {
    let mut messages = Vec::new();
    let mut files = 0usize;
    for path in proto_files(root) {
        files += 1;
        let shown = path.strip_prefix(root).unwrap_or(&path);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                let parsed = pb_parse::parse(&source);
                for message in parsed.messages() {
                    messages.push(format!("{}:{}", shown.display(), message));
                }
            }
            Err(e) => messages.push(format!("{}: {e}", shown.display())),
        }
    }
    VetReport { messages, files }
}

fn proto_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "proto")
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn clean_workspace_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ok.proto"),
            "syntax = \"proto3\";\nmessage M {}\n",
        )
        .unwrap();
        let report = vet_dir(dir.path());
        assert_eq!(report.files, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn broken_file_is_reported_with_position() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.proto"), "message {\n").unwrap();
        let report = vet_dir(dir.path());
        assert_eq!(report.files, 1);
        assert!(!report.is_clean());
        assert!(report.messages[0].starts_with("bad.proto:"));
    }

    #[test]
    fn non_proto_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not proto").unwrap();
        fs::write(dir.path().join("sub.proto"), "syntax = \"proto3\";\n").unwrap();
        let report = vet_dir(dir.path());
        assert_eq!(report.files, 1);
    }

    #[test]
    fn nested_directories_are_swept() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(
            dir.path().join("a/b/deep.proto"),
            "syntax = \"proto3\";\n",
        )
        .unwrap();
        let report = vet_dir(dir.path());
        assert_eq!(report.files, 1);
        assert!(report.is_clean());
    }
}
