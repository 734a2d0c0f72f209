//! Version comparison: fetch two stored versions, diff their text, and report
//! metadata deltas. Also lists a user's recent versions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::comparison::diff::{diff_and_score, DiffLine};
use crate::comparison::store::VersionStore;
use crate::errors::AppError;
use crate::models::resume_version::{ResumeVersion, VersionHistoryEntry};

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionSnapshot {
    pub id: Uuid,
    #[serde(rename = "version_name")]
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub match_score: Option<i32>,
}

impl From<&ResumeVersion> for VersionSnapshot {
    fn from(v: &ResumeVersion) -> Self {
        Self {
            id: v.id,
            label: v.label.clone(),
            created_at: v.created_at,
            match_score: v.match_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Differences {
    pub text_diff: Vec<DiffLine>,
    pub skills_added: Vec<String>,
    pub skills_removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub similarity_percentage: f64,
    /// chars(content2) - chars(content1)
    pub length_change: i64,
    /// |skills2| - |skills1|
    pub skills_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub version1: VersionSnapshot,
    pub version2: VersionSnapshot,
    pub differences: Differences,
    pub statistics: Statistics,
}

// ────────────────────────────────────────────────────────────────────────────
// Ownership policy
// ────────────────────────────────────────────────────────────────────────────

/// Who may compare which versions.
///
/// `Unrestricted` lets any authenticated caller compare any two versions.
/// `OwnerOnly` only resolves versions that belong to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnershipPolicy {
    #[default]
    Unrestricted,
    OwnerOnly,
}

impl FromStr for OwnershipPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "owner_only" => Ok(Self::OwnerOnly),
            other => Err(anyhow::anyhow!(
                "COMPARE_OWNERSHIP must be 'unrestricted' or 'owner_only', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for OwnershipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("unrestricted"),
            Self::OwnerOnly => f.write_str("owner_only"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Stateless apart from its configuration; cheap to clone into each request.
#[derive(Clone)]
pub struct ComparisonService {
    store: Arc<dyn VersionStore>,
    max_diff_lines: usize,
    ownership: OwnershipPolicy,
}

impl ComparisonService {
    pub fn new(
        store: Arc<dyn VersionStore>,
        max_diff_lines: usize,
        ownership: OwnershipPolicy,
    ) -> Self {
        Self {
            store,
            max_diff_lines,
            ownership,
        }
    }

    /// Compares two stored versions.
    ///
    /// Both ids must resolve, otherwise `NotFound` naming the missing ids.
    /// Under `OwnerOnly`, a version owned by someone else is reported as
    /// missing, so foreign ids and nonexistent ids are indistinguishable.
    pub async fn compare(
        &self,
        caller: Uuid,
        version_id_1: Uuid,
        version_id_2: Uuid,
    ) -> Result<ComparisonResult, AppError> {
        let (first, second) = tokio::try_join!(
            self.store.fetch_version(version_id_1),
            self.store.fetch_version(version_id_2),
        )?;
        let first = self.visible_to(caller, first);
        let second = self.visible_to(caller, second);

        let (v1, v2) = match (first, second) {
            (Some(v1), Some(v2)) => (v1, v2),
            (first, second) => {
                let missing: Vec<String> = [(version_id_1, first), (version_id_2, second)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(id, _)| id.to_string())
                    .collect();
                return Err(AppError::NotFound(format!(
                    "Resume version(s) not found: {}",
                    missing.join(", ")
                )));
            }
        };

        let result = build_comparison(&v1, &v2, self.max_diff_lines);
        info!(
            "Compared versions {} and {}: similarity {:.2}%, {} diff lines",
            v1.id,
            v2.id,
            result.statistics.similarity_percentage,
            result.differences.text_diff.len()
        );
        Ok(result)
    }

    fn visible_to(&self, caller: Uuid, version: Option<ResumeVersion>) -> Option<ResumeVersion> {
        match self.ownership {
            OwnershipPolicy::Unrestricted => version,
            OwnershipPolicy::OwnerOnly => version.filter(|v| v.owner_id == caller),
        }
    }

    /// The `limit` most recent versions owned by `owner_id`, newest first.
    pub async fn list_history(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<VersionHistoryEntry>, AppError> {
        if limit < 1 {
            return Err(AppError::BadRequest(
                "limit must be a positive integer".to_string(),
            ));
        }
        Ok(self.store.list_recent(owner_id, limit).await?)
    }
}

/// Pure assembly of a `ComparisonResult` from two resolved versions.
pub fn build_comparison(
    v1: &ResumeVersion,
    v2: &ResumeVersion,
    max_diff_lines: usize,
) -> ComparisonResult {
    let diff = diff_and_score(&v1.content, &v2.content, max_diff_lines);
    if diff.is_truncated() {
        debug!(
            "Diff of {} -> {} truncated to {} of {} lines",
            v1.id,
            v2.id,
            diff.lines.len(),
            diff.total_lines
        );
    }

    let length_change = char_len(&v2.content) - char_len(&v1.content);
    let skills_change = set_len(&v2.skills) - set_len(&v1.skills);

    ComparisonResult {
        version1: VersionSnapshot::from(v1),
        version2: VersionSnapshot::from(v2),
        differences: Differences {
            text_diff: diff.lines,
            skills_added: skills_added(&v1.skills, &v2.skills),
            skills_removed: skills_removed(&v1.skills, &v2.skills),
        },
        statistics: Statistics {
            similarity_percentage: diff.similarity_percentage,
            length_change,
            skills_change,
        },
    }
}

/// Skills in `after` but not in `before`, sorted.
pub fn skills_added(before: &BTreeSet<String>, after: &BTreeSet<String>) -> Vec<String> {
    after.difference(before).cloned().collect()
}

/// Skills in `before` but not in `after`, sorted.
pub fn skills_removed(before: &BTreeSet<String>, after: &BTreeSet<String>) -> Vec<String> {
    before.difference(after).cloned().collect()
}

fn char_len(s: &str) -> i64 {
    i64::try_from(s.chars().count()).unwrap_or(i64::MAX)
}

fn set_len(s: &BTreeSet<String>) -> i64 {
    i64::try_from(s.len()).unwrap_or(i64::MAX)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
