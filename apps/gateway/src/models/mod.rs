pub mod job;
pub mod resume;
pub mod responses;
pub mod user;

pub use job::{JobDraft, JobPosting, JobStatus};
pub use resume::{MatchResult, ResumeFile, ResumeRecord, UploadMetadata};
pub use responses::{
    ApiStatus, BulkUploadResponse, BulkUploadSummary, DashboardStats, DeleteResponse, HealthReport,
    JobList, LoginResponse, MatchResponse, RegisterRequest, RegisterResponse, ResumeList,
    UploadResponse,
};
pub use user::{Role, UserProfile};
