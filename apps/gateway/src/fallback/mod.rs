//! Fallback engine — answers the same logical operations as the remote
//! backend from a session-scoped in-memory data set, so the UI never needs
//! to branch on connectivity.
//!
//! Every operation sleeps a bounded random delay before answering, so
//! loading states are exercised exactly as on the real path. Collections
//! are seeded from fixtures; runtime-created records get `local-` prefixed
//! ids that can never collide with fixture or server ids.

mod fixtures;

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::backend::Backend;
use crate::errors::GatewayError;
use crate::matching::{rank_resumes, score_skills, tokenize_description, MIN_MATCH_SCORE};
use crate::models::{
    ApiStatus, BulkUploadResponse, BulkUploadSummary, DeleteResponse, HealthReport, JobDraft,
    JobList, JobPosting, JobStatus, LoginResponse, MatchResponse, RegisterRequest,
    RegisterResponse, ResumeFile, ResumeList, ResumeRecord, Role, UploadMetadata, UploadResponse,
    UserProfile,
};
use crate::session::SessionStore;

const DESCRIPTION_PREVIEW_CHARS: usize = 80;

/// A credential pair the fallback engine will accept. Plaintext passwords
/// are fine here: these are published demo accounts, not secrets.
pub struct DemoUser {
    pub profile: UserProfile,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct FallbackEngine {
    session: Arc<SessionStore>,
    users: Mutex<Vec<DemoUser>>,
    jobs: Mutex<Vec<JobPosting>>,
    resumes: Mutex<Vec<ResumeRecord>>,
    latency_ms: Range<u64>,
}

impl FallbackEngine {
    /// Engine seeded with the demo fixture set.
    pub fn new(session: Arc<SessionStore>, latency_ms: Range<u64>) -> Self {
        Self::with_seed(
            session,
            fixtures::demo_users(),
            fixtures::seed_jobs(),
            fixtures::seed_resumes(),
            latency_ms,
        )
    }

    pub(crate) fn with_seed(
        session: Arc<SessionStore>,
        users: Vec<DemoUser>,
        jobs: Vec<JobPosting>,
        resumes: Vec<ResumeRecord>,
        latency_ms: Range<u64>,
    ) -> Self {
        Self {
            session,
            users: Mutex::new(users),
            jobs: Mutex::new(jobs),
            resumes: Mutex::new(resumes),
            latency_ms,
        }
    }

    /// Bounded random delay so fallback responses feel like network calls.
    /// An empty range (tests) disables it.
    async fn simulate_latency(&self) {
        if self.latency_ms.is_empty() {
            return;
        }
        let ms = rand::thread_rng().gen_range(self.latency_ms.clone());
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Builds a resume record for an uploaded file. No real content is
    /// extracted; skills are sampled from the fixture pool.
    async fn synthesize_resume(
        &self,
        file: &ResumeFile,
        meta: &UploadMetadata,
    ) -> Result<ResumeRecord, GatewayError> {
        let (skills, experience_years) = {
            let mut rng = rand::thread_rng();
            let count = rng.gen_range(4..=6);
            let skills: Vec<String> = fixtures::SKILL_POOL
                .choose_multiple(&mut rng, count)
                .map(|s| s.to_string())
                .collect();
            (skills, rng.gen_range(1..=10))
        };

        let candidate_name = meta
            .candidate_name
            .clone()
            .unwrap_or_else(|| candidate_name_from_file(&file.file_name));
        let candidate_email = meta
            .candidate_email
            .clone()
            .unwrap_or_else(|| format!("{}@example.com", candidate_name.to_lowercase().replace(' ', ".")));

        let jobs = self.jobs.lock().await;
        let targets: Vec<&JobPosting> = match &meta.job_id {
            Some(id) => {
                let job = jobs
                    .iter()
                    .find(|j| j.id == *id)
                    .ok_or_else(|| GatewayError::NotFound(format!("Job {id} not found")))?;
                vec![job]
            }
            None => jobs.iter().collect(),
        };
        let match_scores = targets
            .iter()
            .map(|job| (job.id.clone(), score_skills(&skills, &job.required_skills).score))
            .collect();

        Ok(ResumeRecord {
            id: local_id("resume"),
            candidate_name,
            candidate_email,
            skills,
            experience_years,
            upload_date: Utc::now(),
            match_scores,
        })
    }
}

/// Runtime ids carry a `local-` prefix: distinguishable from server ids, so
/// a later reconnect to the real backend never collides.
fn local_id(kind: &str) -> String {
    format!("local-{kind}-{}", Uuid::new_v4().simple())
}

fn candidate_name_from_file(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Backend for FallbackEngine {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        self.simulate_latency().await;
        let users = self.users.lock().await;
        // Never fabricate an identity: both the email and the password must
        // match a seeded (or fallback-registered) account.
        let user = users
            .iter()
            .find(|u| u.profile.email.eq_ignore_ascii_case(email) && u.password == password)
            .ok_or(GatewayError::InvalidCredentials)?;
        debug!("Fallback login for {} ({:?})", user.profile.email, user.profile.role);
        Ok(LoginResponse {
            access_token: user.access_token.clone(),
            refresh_token: user.refresh_token.clone(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            user: user.profile.clone(),
        })
    }

    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, GatewayError> {
        self.simulate_latency().await;
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(GatewayError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|u| u.profile.email.eq_ignore_ascii_case(&req.email))
        {
            return Err(GatewayError::Validation(
                "Email is already registered".to_string(),
            ));
        }
        let profile = UserProfile {
            id: local_id("user"),
            email: req.email.clone(),
            display_name: req.display_name.clone(),
            role: Role::Candidate,
        };
        users.push(DemoUser {
            profile: profile.clone(),
            password: req.password.clone(),
            access_token: local_id("token"),
            refresh_token: local_id("refresh"),
        });
        Ok(RegisterResponse {
            message: "Registration successful".to_string(),
            user: profile,
        })
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, GatewayError> {
        self.simulate_latency().await;
        self.session
            .user()
            .ok_or(GatewayError::AuthenticationExpired)
    }

    async fn list_jobs(&self) -> Result<JobList, GatewayError> {
        self.simulate_latency().await;
        let jobs = self.jobs.lock().await;
        Ok(JobList {
            jobs: jobs.clone(),
            total: jobs.len(),
            skip: 0,
            limit: 100,
            has_more: false,
        })
    }

    async fn get_job(&self, id: &str) -> Result<JobPosting, GatewayError> {
        self.simulate_latency().await;
        let jobs = self.jobs.lock().await;
        jobs.iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Job {id} not found")))
    }

    async fn create_job(&self, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.simulate_latency().await;
        if draft.title.trim().is_empty() {
            return Err(GatewayError::Validation("Job title is required".to_string()));
        }
        let job = JobPosting {
            id: local_id("job"),
            title: draft.title.clone(),
            description: draft.description.clone(),
            required_skills: draft.required_skills.clone(),
            location: draft.location.clone(),
            status: draft.status.unwrap_or(JobStatus::Open),
            created_at: Utc::now(),
        };
        self.jobs.lock().await.push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: &str, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.simulate_latency().await;
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("Job {id} not found")))?;
        job.title = draft.title.clone();
        job.description = draft.description.clone();
        job.required_skills = draft.required_skills.clone();
        job.location = draft.location.clone();
        if let Some(status) = draft.status {
            job.status = status;
        }
        Ok(job.clone())
    }

    async fn delete_job(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.simulate_latency().await;
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Err(GatewayError::NotFound(format!("Job {id} not found")));
        }
        Ok(DeleteResponse {
            success: true,
            message: "Job deleted successfully".to_string(),
        })
    }

    async fn list_resumes(&self) -> Result<ResumeList, GatewayError> {
        self.simulate_latency().await;
        let resumes = self.resumes.lock().await;
        Ok(ResumeList {
            resumes: resumes.clone(),
            total: resumes.len(),
            skip: 0,
            limit: 100,
            has_more: false,
        })
    }

    async fn get_resume(&self, id: &str) -> Result<ResumeRecord, GatewayError> {
        self.simulate_latency().await;
        let resumes = self.resumes.lock().await;
        resumes
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Resume {id} not found")))
    }

    async fn upload_resume(
        &self,
        file: ResumeFile,
        meta: &UploadMetadata,
    ) -> Result<UploadResponse, GatewayError> {
        self.simulate_latency().await;
        let record = self.synthesize_resume(&file, meta).await?;
        self.resumes.lock().await.push(record.clone());
        Ok(UploadResponse {
            success: true,
            message: "Resume uploaded successfully".to_string(),
            resume: record,
        })
    }

    async fn bulk_upload(
        &self,
        files: Vec<ResumeFile>,
    ) -> Result<BulkUploadResponse, GatewayError> {
        let started = Instant::now();
        let total_files = files.len();
        let mut results = Vec::with_capacity(total_files);
        for file in files {
            results.push(self.upload_resume(file, &UploadMetadata::default()).await?);
        }
        Ok(BulkUploadResponse {
            success: true,
            summary: BulkUploadSummary {
                total_files,
                successful_uploads: results.len(),
                failed_uploads: total_files - results.len(),
                processing_time: format!("{:.1}s", started.elapsed().as_secs_f64()),
            },
            results,
        })
    }

    async fn delete_resume(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.simulate_latency().await;
        let mut resumes = self.resumes.lock().await;
        let before = resumes.len();
        resumes.retain(|r| r.id != id);
        if resumes.len() == before {
            return Err(GatewayError::NotFound(format!("Resume {id} not found")));
        }
        Ok(DeleteResponse {
            success: true,
            message: "Resume deleted successfully".to_string(),
        })
    }

    async fn match_to_job(&self, job_description: &str) -> Result<MatchResponse, GatewayError> {
        self.simulate_latency().await;
        let requirements = tokenize_description(job_description);
        let resumes = self.resumes.lock().await;
        let matches = rank_resumes(&resumes, "adhoc", &requirements, MIN_MATCH_SCORE);
        Ok(MatchResponse {
            total_matches: matches.len(),
            total_resumes: resumes.len(),
            job_description_preview: job_description
                .chars()
                .take(DESCRIPTION_PREVIEW_CHARS)
                .collect(),
            matches,
        })
    }

    async fn health(&self) -> Result<HealthReport, GatewayError> {
        self.simulate_latency().await;
        Ok(HealthReport {
            status: "healthy".to_string(),
            service: "fallback_engine".to_string(),
            timestamp: Utc::now(),
            message: Some("Operating in local demo mode".to_string()),
        })
    }

    async fn api_status(&self) -> Result<ApiStatus, GatewayError> {
        self.simulate_latency().await;
        let users = self.users.lock().await;
        let demo_credentials = users
            .iter()
            .filter(|u| !u.profile.id.starts_with("local-"))
            .map(|u| {
                (
                    u.profile.display_name.to_lowercase(),
                    format!("{} / {}", u.profile.email, u.password),
                )
            })
            .collect();
        Ok(ApiStatus {
            api_version: "3.0.0".to_string(),
            status: "operational (demo)".to_string(),
            timestamp: Utc::now(),
            demo_credentials,
            features: [
                ("authentication", "Simulated tokens"),
                ("file_processing", "Simulated"),
                ("ai_matching", "Keyword overlap"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::BTreeMap;

    fn engine() -> FallbackEngine {
        let dir = std::env::temp_dir().join(format!("gw-fallback-{}", Uuid::new_v4().simple()));
        let session = Arc::new(SessionStore::open(&dir.join("session.json")));
        FallbackEngine::new(session, 0..0)
    }

    fn pdf(name: &str) -> ResumeFile {
        ResumeFile {
            file_name: name.to_string(),
            content: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn test_admin_login_binds_admin_role() {
        let response = engine()
            .login("admin@recruitai.com", "password123")
            .await
            .unwrap();
        assert_eq!(response.user.role, Role::Admin);
        assert_eq!(response.access_token, "mock_admin_token");
        assert_eq!(response.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_login_never_fabricates_an_identity() {
        let engine = engine();
        let err = engine
            .login("admin@recruitai.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredentials));
        let err = engine
            .login("stranger@recruitai.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_then_login_as_candidate() {
        let engine = engine();
        let req = RegisterRequest {
            email: "new@recruitai.com".to_string(),
            password: "hunter2hunter2".to_string(),
            display_name: "New User".to_string(),
        };
        let registered = engine.register(&req).await.unwrap();
        assert_eq!(registered.user.role, Role::Candidate);
        assert!(registered.user.id.starts_with("local-user-"));

        let login = engine
            .login("new@recruitai.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(login.user.email, "new@recruitai.com");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let engine = engine();
        let req = RegisterRequest {
            email: "admin@recruitai.com".to_string(),
            password: "whatever".to_string(),
            display_name: "Imposter".to_string(),
        };
        let err = engine.register(&req).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_generates_non_colliding_local_id() {
        let engine = engine();
        let fixture_ids: Vec<String> = engine
            .list_resumes()
            .await
            .unwrap()
            .resumes
            .iter()
            .map(|r| r.id.clone())
            .collect();

        let uploaded = engine
            .upload_resume(pdf("grace_hopper.pdf"), &UploadMetadata::default())
            .await
            .unwrap();
        assert!(uploaded.resume.id.starts_with("local-resume-"));
        assert!(!fixture_ids.contains(&uploaded.resume.id));
        assert_eq!(uploaded.resume.candidate_name, "Grace Hopper");
        assert!(!uploaded.resume.skills.is_empty());
    }

    #[tokio::test]
    async fn test_upload_scores_against_every_known_job() {
        let engine = engine();
        let job_ids: Vec<String> = engine
            .list_jobs()
            .await
            .unwrap()
            .jobs
            .iter()
            .map(|j| j.id.clone())
            .collect();

        let uploaded = engine
            .upload_resume(pdf("cv.pdf"), &UploadMetadata::default())
            .await
            .unwrap();
        for id in &job_ids {
            let score = uploaded.resume.match_scores.get(id);
            assert!(score.is_some(), "missing score for {id}");
            assert!(*score.unwrap() <= 100);
        }
    }

    #[tokio::test]
    async fn test_upload_with_job_id_scores_only_that_job() {
        let engine = engine();
        let uploaded = engine
            .upload_resume(
                pdf("cv.pdf"),
                &UploadMetadata {
                    job_id: Some("job1".to_string()),
                    ..UploadMetadata::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(uploaded.resume.match_scores.len(), 1);
        assert!(uploaded.resume.match_scores.contains_key("job1"));

        let err = engine
            .upload_resume(
                pdf("cv.pdf"),
                &UploadMetadata {
                    job_id: Some("job999".to_string()),
                    ..UploadMetadata::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bulk_upload_reports_summary() {
        let engine = engine();
        let response = engine
            .bulk_upload(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.summary.total_files, 3);
        assert_eq!(response.summary.successful_uploads, 3);
        assert_eq!(response.summary.failed_uploads, 0);
        assert_eq!(response.results.len(), 3);
    }

    #[tokio::test]
    async fn test_match_to_job_ranks_devops_candidate_first() {
        let response = engine()
            .match_to_job("Looking for Docker, Kubernetes and Linux experience")
            .await
            .unwrap();
        assert!(response.total_matches >= 1);
        assert_eq!(response.matches[0].resume_id, "resume3");
        assert!(response.matches[0].score >= MIN_MATCH_SCORE);
        assert!(response.matches[0].score <= 100);
    }

    #[tokio::test]
    async fn test_match_to_job_half_overlap_scores_fifty() {
        let dir = std::env::temp_dir().join(format!("gw-fallback-{}", Uuid::new_v4().simple()));
        let session = Arc::new(SessionStore::open(&dir.join("session.json")));
        let resume = ResumeRecord {
            id: "resume-react".to_string(),
            candidate_name: "Ada".to_string(),
            candidate_email: "ada@example.com".to_string(),
            skills: vec!["React".to_string(), "Node.js".to_string()],
            experience_years: 4,
            upload_date: Utc::now(),
            match_scores: BTreeMap::new(),
        };
        let engine = FallbackEngine::with_seed(session, Vec::new(), Vec::new(), vec![resume], 0..0);

        let response = engine.match_to_job("React JavaScript").await.unwrap();
        assert_eq!(response.total_matches, 1);
        assert_eq!(response.matches[0].score, 50);
        assert_eq!(response.matches[0].matched_skills, vec!["react"]);
    }

    #[tokio::test]
    async fn test_job_crud_round_trip() {
        let engine = engine();
        let draft = JobDraft {
            title: "Platform Engineer".to_string(),
            description: "Own the deployment platform".to_string(),
            required_skills: vec!["Rust".to_string(), "Kubernetes".to_string()],
            location: "Remote".to_string(),
            status: None,
        };
        let created = engine.create_job(&draft).await.unwrap();
        assert!(created.id.starts_with("local-job-"));
        assert_eq!(created.status, JobStatus::Open);

        let fetched = engine.get_job(&created.id).await.unwrap();
        assert_eq!(fetched.title, "Platform Engineer");

        let updated = engine
            .update_job(
                &created.id,
                &JobDraft {
                    status: Some(JobStatus::Closed),
                    ..draft
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Closed);

        engine.delete_job(&created.id).await.unwrap();
        let err = engine.get_job(&created.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_delete_surfaces_not_found() {
        let engine = engine();
        let err = engine.delete_resume("resume999").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_job_requires_title() {
        let engine = engine();
        let err = engine
            .create_job(&JobDraft {
                title: "  ".to_string(),
                description: String::new(),
                required_skills: Vec::new(),
                location: String::new(),
                status: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_exposes_demo_credentials() {
        let status = engine().api_status().await.unwrap();
        assert_eq!(
            status.demo_credentials.get("admin").map(String::as_str),
            Some("admin@recruitai.com / password123")
        );
    }
}
