use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw row from `resume_versions`. `skills` is a JSON array stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeVersionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub version_name: String,
    pub original_content: Option<String>,
    pub customized_content: Option<String>,
    pub skills: Option<String>,
    pub match_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A stored resume snapshot with its comparable text already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeVersion {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub label: String,
    pub content: String,
    pub skills: BTreeSet<String>,
    pub match_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ResumeVersionRow {
    /// Resolves the row into a `ResumeVersion`.
    /// Fails only when the `skills` column is not a JSON array of strings.
    pub fn into_version(self) -> Result<ResumeVersion, serde_json::Error> {
        let skills = match self.skills.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<String>>(raw)?,
            _ => Vec::new(),
        };
        let content = comparable_content(
            self.customized_content.as_deref(),
            self.original_content.as_deref(),
        );

        Ok(ResumeVersion {
            id: self.id,
            owner_id: self.user_id,
            label: self.version_name,
            content,
            skills: skills.into_iter().collect(),
            match_score: self.match_score,
            created_at: self.created_at,
        })
    }
}

/// Customized text wins over the original; empty strings count as absent.
pub fn comparable_content(customized: Option<&str>, original: Option<&str>) -> String {
    customized
        .filter(|s| !s.is_empty())
        .or(original.filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// History listing projection. Content and skills are left out on purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VersionHistoryEntry {
    pub id: Uuid,
    pub version_name: String,
    pub match_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<&ResumeVersion> for VersionHistoryEntry {
    fn from(v: &ResumeVersion) -> Self {
        Self {
            id: v.id,
            version_name: v.label.clone(),
            match_score: v.match_score,
            created_at: v.created_at,
        }
    }
}
