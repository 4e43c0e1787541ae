//! Wire envelopes shared by both backends. Shapes mirror the remote API so
//! the fallback engine is indistinguishable from the real service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::JobPosting;
use super::resume::{MatchResult, ResumeRecord};
use super::user::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<JobPosting>,
    pub total: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeList {
    pub resumes: Vec<ResumeRecord>,
    pub total: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub resume: ResumeRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUploadSummary {
    pub total_files: usize,
    pub successful_uploads: usize,
    pub failed_uploads: usize,
    pub processing_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUploadResponse {
    pub success: bool,
    pub summary: BulkUploadSummary,
    pub results: Vec<UploadResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    pub total_matches: usize,
    pub total_resumes: usize,
    pub job_description_preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub api_version: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub demo_credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub features: BTreeMap<String, String>,
}

/// Aggregated dashboard numbers, computed client-side from the active
/// backend's list operations so both modes agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_jobs: usize,
    pub open_jobs: usize,
    pub closed_jobs: usize,
    pub total_resumes: usize,
    pub total_candidates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_roundtrip() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {
                "id": "admin_id",
                "email": "admin@recruitai.com",
                "display_name": "Admin",
                "role": "admin"
            }
        }"#;
        let parsed: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token_type, "bearer");
        assert_eq!(parsed.user.email, "admin@recruitai.com");
    }

    #[test]
    fn test_job_list_tolerates_missing_paging_fields() {
        let json = r#"{"jobs": [], "total": 0}"#;
        let parsed: JobList = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.total, 0);
        assert!(!parsed.has_more);
    }
}
