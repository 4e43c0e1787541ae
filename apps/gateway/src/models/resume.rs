use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub upload_date: DateTime<Utc>,
    /// Job id → score in 0..=100, filled lazily as jobs are scored.
    #[serde(default)]
    pub match_scores: BTreeMap<String, u8>,
}

/// Derived ranking entry. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub resume_id: String,
    pub job_id: String,
    pub score: u8,
    pub matched_skills: Vec<String>,
}

/// A file handed to `upload_resume` / `bulk_upload`. The gateway never
/// inspects the bytes; the remote backend parses them, the fallback engine
/// simulates the extraction.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    /// Restricts server-side scoring to one job when set.
    pub job_id: Option<String>,
}
