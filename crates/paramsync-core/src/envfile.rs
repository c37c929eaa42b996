//! Reading and writing `.env.{stage}` files.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::progress::SyncReporter;
use crate::types::{EnvEntry, LocalSnapshot};

/// `<dir>/.env.<stage>`
pub fn stage_file_path(dir: &Path, stage: &str) -> PathBuf {
    dir.join(format!(".env.{stage}"))
}

/// Parse a dotenv file into entries in file order.
///
/// Values are taken as written: `$NAME` is never expanded. A key defined more than
/// once keeps its first position and its last value.
pub fn read_env_file(path: &Path) -> Result<Vec<EnvEntry>> {
    let parse_err = |e: dotenvy::Error| SyncError::EnvParse {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let text = escape_substitutions(&std::fs::read_to_string(path)?);
    let iter = dotenvy::from_read_iter(text.as_bytes());
    let mut entries: Vec<EnvEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in iter {
        let (key, value) = item.map_err(parse_err)?;
        match positions.get(&key) {
            Some(&idx) => entries[idx].value = value,
            None => {
                positions.insert(key.clone(), entries.len());
                entries.push(EnvEntry { key, value });
            }
        }
    }

    Ok(entries)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Plain,
    Blank,
    Escape,
    Weak,
    WeakEscape,
    Strong,
    Comment,
}

/// Escape every `$` that dotenvy would read as a variable reference.
///
/// Tracks quotes and comments the same way dotenvy does. Single-quoted text and
/// already escaped `\$` are left alone.
fn escape_substitutions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = Scan::Plain;

    for line in text.split_inclusive('\n') {
        if state == Scan::Plain && line.trim_start().starts_with('#') {
            out.push_str(line);
            continue;
        }
        for c in line.chars() {
            if c == '$' && matches!(state, Scan::Plain | Scan::Blank | Scan::Weak) {
                out.push('\\');
            }
            out.push(c);
            state = match (state, c) {
                (Scan::Comment, '\n') => Scan::Plain,
                (Scan::Comment, _) => Scan::Comment,
                (Scan::Blank, '#') => Scan::Comment,
                (Scan::Plain | Scan::Blank, '\\') => Scan::Escape,
                (Scan::Plain | Scan::Blank, '"') => Scan::Weak,
                (Scan::Plain | Scan::Blank, '\'') => Scan::Strong,
                (Scan::Plain | Scan::Blank, c) if c.is_whitespace() && c != '\n' && c != '\r' => {
                    Scan::Blank
                }
                (Scan::Plain | Scan::Blank | Scan::Escape, _) => Scan::Plain,
                (Scan::Weak, '\\') => Scan::WeakEscape,
                (Scan::Weak, '"') => Scan::Plain,
                (Scan::Weak | Scan::WeakEscape, _) => Scan::Weak,
                (Scan::Strong, '\'') => Scan::Plain,
                (Scan::Strong, _) => Scan::Strong,
            };
        }
    }

    out
}

/// Read the stage file from `dir`. Fails before anything else if it is missing.
pub fn read_stage(dir: &Path, stage: &str) -> Result<Vec<EnvEntry>> {
    let path = stage_file_path(dir, stage);
    if !path.is_file() {
        return Err(SyncError::StageFileNotFound(path.display().to_string()));
    }
    read_env_file(&path)
}

/// Read the stage file and chunk it into a [`LocalSnapshot`].
pub fn load_stage_snapshot(
    dir: &Path,
    stage: &str,
    limit: usize,
    reporter: &dyn SyncReporter,
) -> Result<LocalSnapshot> {
    let entries = read_stage(dir, stage)?;
    tracing::debug!(stage, count = entries.len(), "Read local variables");
    LocalSnapshot::from_entries(entries, limit, reporter)
}

/// Render entries as dotenv text, quoting values that need it.
pub fn render_env(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(&quote_value(value));
        out.push('\n');
    }
    out
}

/// Write entries to `path`. Refuses to replace an existing file unless `force`.
pub fn write_env_file(path: &Path, entries: &BTreeMap<String, String>, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(SyncError::OutputExists(path.display().to_string()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, render_env(entries))?;
    Ok(())
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$' | '='));
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
