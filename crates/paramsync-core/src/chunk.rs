use std::collections::BTreeMap;

use crate::types::EnvEntry;

/// Standard-tier parameter value limit.
pub const DEFAULT_CHUNK_LIMIT: usize = 4096;

const PART_MARKER: &str = ".part";

/// Split an oversized entry into `{key}.part0 .. {key}.part(N-1)`.
///
/// Length is counted in characters and splits never fall inside a character.
/// Values shorter than `limit` come back unchanged as a single entry.
pub fn chunk(entry: EnvEntry, limit: usize) -> Vec<EnvEntry> {
    if entry.value.chars().count() < limit {
        return vec![entry];
    }

    let parts = split_chars(&entry.value, limit);
    tracing::debug!(key = %entry.key, parts = parts.len(), "Value over limit, splitting");

    parts
        .into_iter()
        .enumerate()
        .map(|(index, value)| EnvEntry::new(part_key(&entry.key, index), value))
        .collect()
}

pub fn part_key(key: &str, index: usize) -> String {
    format!("{key}{PART_MARKER}{index}")
}

/// Parse `KEY.partN` into `("KEY", N)`.
pub fn parse_part_key(key: &str) -> Option<(&str, usize)> {
    let pos = key.rfind(PART_MARKER)?;
    let (base, suffix) = key.split_at(pos);
    let digits = &suffix[PART_MARKER.len()..];
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|index| (base, index))
}

/// Join `KEY.part0 .. KEY.partN` groups back into `KEY`.
///
/// A group is joined only when its indices run contiguously from zero and no plain
/// `KEY` already exists; anything else is kept under its stored names.
pub fn reassemble(entries: BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut groups: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();
    let mut out = BTreeMap::new();

    for (key, value) in entries {
        match parse_part_key(&key) {
            Some((base, index)) => {
                groups
                    .entry(base.to_string())
                    .or_default()
                    .insert(index, value);
            }
            None => {
                out.insert(key, value);
            }
        }
    }

    for (base, parts) in groups {
        let contiguous = parts.keys().enumerate().all(|(i, index)| i == *index);
        if contiguous && !out.contains_key(&base) {
            out.insert(base, parts.into_values().collect());
        } else {
            tracing::warn!(key = %base, "Cannot reassemble parts, keeping them as stored");
            for (index, value) in parts {
                out.insert(part_key(&base, index), value);
            }
        }
    }

    out
}

fn split_chars(value: &str, limit: usize) -> Vec<&str> {
    let mut parts = Vec::with_capacity(value.len() / limit.max(1) + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in value.char_indices() {
        if count == limit {
            parts.push(&value[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < value.len() {
        parts.push(&value[start..]);
    }

    parts
}
