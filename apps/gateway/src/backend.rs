//! The backend seam. One trait, two implementations: the remote HTTP path
//! and the local fallback engine. The facade holds both and dispatches on
//! the sticky fallback-mode flag, so callers see one surface with identical
//! result shapes in either mode.

use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::models::{
    ApiStatus, BulkUploadResponse, DeleteResponse, HealthReport, JobDraft, JobList, JobPosting,
    LoginResponse, MatchResponse, RegisterRequest, RegisterResponse, ResumeFile, ResumeList,
    ResumeRecord, UploadMetadata, UploadResponse, UserProfile,
};

#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError>;
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, GatewayError>;
    async fn logout(&self) -> Result<(), GatewayError>;
    async fn current_user(&self) -> Result<UserProfile, GatewayError>;

    async fn list_jobs(&self) -> Result<JobList, GatewayError>;
    async fn get_job(&self, id: &str) -> Result<JobPosting, GatewayError>;
    async fn create_job(&self, draft: &JobDraft) -> Result<JobPosting, GatewayError>;
    async fn update_job(&self, id: &str, draft: &JobDraft) -> Result<JobPosting, GatewayError>;
    async fn delete_job(&self, id: &str) -> Result<DeleteResponse, GatewayError>;

    async fn list_resumes(&self) -> Result<ResumeList, GatewayError>;
    async fn get_resume(&self, id: &str) -> Result<ResumeRecord, GatewayError>;
    async fn upload_resume(
        &self,
        file: ResumeFile,
        meta: &UploadMetadata,
    ) -> Result<UploadResponse, GatewayError>;
    async fn bulk_upload(&self, files: Vec<ResumeFile>) -> Result<BulkUploadResponse, GatewayError>;
    async fn delete_resume(&self, id: &str) -> Result<DeleteResponse, GatewayError>;
    async fn match_to_job(&self, job_description: &str) -> Result<MatchResponse, GatewayError>;

    async fn health(&self) -> Result<HealthReport, GatewayError>;
    async fn api_status(&self) -> Result<ApiStatus, GatewayError>;
}
