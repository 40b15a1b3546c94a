//! `LIST` output parsing

use std::str::FromStr;

use scanfiler_core::domain::RemoteEntry;
use tracing::debug;

/// Converts raw `LIST` lines into remote entries
///
/// Understands the POSIX (`ls -l`) and DOS formats. Unparseable lines, the
/// `.` and `..` entries and symlinks are skipped.
pub fn parse_listing<S: AsRef<str>>(lines: &[S]) -> Vec<RemoteEntry> {
    lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect()
}

fn parse_line(line: &str) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line.starts_with("total ") {
        return None;
    }

    let file = match suppaftp::list::File::from_str(line) {
        Ok(file) => file,
        Err(err) => {
            debug!(line, error = %err, "Skipping unparseable LIST line");
            return None;
        }
    };

    let name = file.name();
    if name == "." || name == ".." {
        return None;
    }

    if file.is_directory() {
        Some(RemoteEntry::folder(name))
    } else if file.is_file() {
        Some(RemoteEntry::file(name, file.size() as u64))
    } else {
        debug!(name, "Skipping symlink");
        None
    }
}
