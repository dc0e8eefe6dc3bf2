//! Conflict-aware merge of an imported credential set
//!
//! Two records conflict iff their case-insensitive `siteName|username` pair
//! is equal; passwords and notes are not part of the identity. Merging is
//! pure and deterministic: result order is the existing order followed by
//! newly added records in import order.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::store::Credential;

/// Policy for imported records whose conflict key matches an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Imported fields overwrite the existing record
    Replace,
    /// Existing record kept verbatim
    Skip,
    /// Imported record wins only when its `updated_at` is strictly greater
    Newer,
}

/// Outcome of a merge pass
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub result: Vec<Credential>,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Case-insensitive identity deciding whether two records are "the same" entry
pub fn conflict_key(credential: &Credential) -> String {
    format!(
        "{}|{}",
        credential.site_name.to_lowercase(),
        credential.username.to_lowercase()
    )
}

/// Imported records that collide with an existing record (preview helper)
pub fn detect_conflicts(imported: &[Credential], existing: &[Credential]) -> Vec<Credential> {
    let keys: HashSet<String> = existing.iter().map(conflict_key).collect();
    imported
        .iter()
        .filter(|credential| keys.contains(&conflict_key(credential)))
        .cloned()
        .collect()
}

/// Reconcile `imported` against `existing` under the given strategy.
///
/// When several existing records share a conflict key, the first one in
/// original order is the conflict target; the rest are left untouched.
/// Imported ids are never trusted: added records are re-minted with fresh
/// ids, and replaced records keep the existing id, so no record is ever
/// re-identified by an import.
pub fn merge(
    imported: &[Credential],
    existing: &[Credential],
    strategy: MergeStrategy,
) -> MergeOutcome {
    let mut target_by_key: HashMap<String, usize> = HashMap::new();
    for (index, credential) in existing.iter().enumerate() {
        target_by_key
            .entry(conflict_key(credential))
            .or_insert(index);
    }

    let mut result: Vec<Credential> = existing.to_vec();
    let mut added = 0;
    let mut updated = 0;
    let mut skipped = 0;

    for candidate in imported {
        let Some(&target_index) = target_by_key.get(&conflict_key(candidate)) else {
            let mut fresh = candidate.clone();
            fresh.id = Uuid::new_v4();
            result.push(fresh);
            added += 1;
            continue;
        };

        let target = &existing[target_index];
        match strategy {
            MergeStrategy::Replace => {
                result[target_index] = with_id(candidate, target.id);
                updated += 1;
            }
            MergeStrategy::Skip => skipped += 1,
            MergeStrategy::Newer => {
                if candidate.updated_at > target.updated_at {
                    result[target_index] = with_id(candidate, target.id);
                    updated += 1;
                } else {
                    skipped += 1;
                }
            }
        }
    }

    MergeOutcome {
        result,
        added,
        updated,
        skipped,
    }
}

fn with_id(candidate: &Credential, id: Uuid) -> Credential {
    let mut replacement = candidate.clone();
    replacement.id = id;
    replacement
}
