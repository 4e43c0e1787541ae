use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for `create_job` / `update_job`. Updates are full replacements
/// (PUT semantics), matching the backend contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
}
