use crate::types::{DeletionSet, LocalSnapshot, RemoteSnapshot};

/// Remote keys with no local counterpart.
///
/// Values are ignored: a key present on both sides is never a deletion candidate,
/// differing values are fixed by the overwrite in the write phase.
pub fn stale_keys(remote: &RemoteSnapshot, local: &LocalSnapshot) -> DeletionSet {
    remote
        .keys()
        .filter(|key| !local.contains_key(key))
        .map(str::to_string)
        .collect()
}
