// toolshape-core/src/assemble.rs

//! Small helpers shared by the per-tool assemblers.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::trace;

/// Drops exact repeats, keeping the first occurrence and the input order.
pub fn dedup_exact<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let out: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect();
    if out.len() != before {
        trace!(dropped = before - out.len(), "Dropped duplicate entries");
    }
    out
}

/// Collapses entries sharing a key into one.
///
/// The surviving entry sits at the position of the key's first occurrence.
/// A later entry replaces it only when its precedence is strictly higher;
/// on a tie the earlier report stands.
pub fn dedup_by_precedence<T, K, KF, PF>(items: Vec<T>, key: KF, precedence: PF) -> Vec<T>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    PF: Fn(&T) -> u8,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        if let Some(&idx) = slots.get(&k) {
            if precedence(&item) > precedence(&out[idx]) {
                out[idx] = item;
            }
        } else {
            slots.insert(k, out.len());
            out.push(item);
        }
    }
    out
}

/// Removes a tool-specific alphabetic prefix from a numeric code
/// (`TS2322` → `2322`). Codes that aren't prefix+digits come back as-is.
pub fn strip_code_prefix(code: &str) -> String {
    let digits_at = code.find(|c: char| c.is_ascii_digit());
    match digits_at {
        Some(idx)
            if code[..idx].chars().all(|c| c.is_ascii_alphabetic())
                && code[idx..].chars().all(|c| c.is_ascii_digit()) =>
        {
            code[idx..].to_string()
        }
        _ => code.to_string(),
    }
}
