//! The public facade. Owns the session store and both backends, dispatches
//! every operation on the sticky fallback-mode flag, and performs the
//! one-directional switch into fallback when the remote service is
//! confirmed unreachable. Callers get one surface with identical result
//! shapes in either mode.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::fallback::FallbackEngine;
use crate::models::{
    ApiStatus, BulkUploadResponse, DashboardStats, DeleteResponse, HealthReport, JobDraft,
    JobList, JobPosting, JobStatus, LoginResponse, MatchResponse, RegisterRequest,
    RegisterResponse, ResumeFile, ResumeList, ResumeRecord, UploadMetadata, UploadResponse,
    UserProfile,
};
use crate::remote::RemoteBackend;
use crate::session::SessionStore;

struct GatewayInner {
    config: GatewayConfig,
    session: Arc<SessionStore>,
    remote: RemoteBackend,
    fallback: FallbackEngine,
}

#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    /// Builds the gateway without probing. The active mode comes from the
    /// demo flag or the persisted session state.
    pub fn new(config: GatewayConfig) -> Self {
        let session = Arc::new(SessionStore::open(&config.state_path));
        if config.demo_mode && !session.is_fallback_mode() {
            info!("Demo mode forced; using fallback engine");
            session.set_fallback_mode(true);
        }
        let remote = RemoteBackend::new(&config, session.clone());
        let fallback = FallbackEngine::new(session.clone(), config.fallback_latency_ms.clone());
        Self {
            inner: Arc::new(GatewayInner {
                config,
                session,
                remote,
                fallback,
            }),
        }
    }

    /// Builds the gateway and, unless the mode is already decided, probes
    /// the backend once. An unreachable backend selects fallback mode.
    pub async fn connect(config: GatewayConfig) -> Self {
        let gateway = Self::new(config);
        if !gateway.inner.session.is_fallback_mode() && !gateway.inner.remote.probe().await {
            warn!("Startup health probe failed; entering fallback mode");
            gateway.inner.session.set_fallback_mode(true);
        }
        gateway
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn is_fallback_mode(&self) -> bool {
        self.inner.session.is_fallback_mode()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { gateway: self }
    }

    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi { gateway: self }
    }

    pub fn resumes(&self) -> ResumesApi<'_> {
        ResumesApi { gateway: self }
    }

    pub fn system(&self) -> SystemApi<'_> {
        SystemApi { gateway: self }
    }

    /// Runs an operation against the active backend. If the remote path
    /// reports the service unreachable (retries already exhausted inside the
    /// executor), flips the sticky fallback flag and re-dispatches the same
    /// operation to the fallback engine, so the caller never sees the
    /// connectivity failure.
    async fn with_failover<'a, T, F, Fut>(&'a self, op: F) -> Result<T, GatewayError>
    where
        F: Fn(&'a dyn Backend) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let inner = &*self.inner;
        if inner.session.is_fallback_mode() {
            return op(&inner.fallback).await;
        }
        match op(&inner.remote).await {
            Err(e) if e.is_unreachable() => {
                warn!("Remote backend unreachable ({e}); switching to fallback mode");
                inner.session.set_fallback_mode(true);
                op(&inner.fallback).await
            }
            result => result,
        }
    }
}

pub struct AuthApi<'a> {
    gateway: &'a Gateway,
}

impl AuthApi<'_> {
    /// Logs in against the active backend and installs the returned tokens
    /// and profile into the persisted session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, GatewayError> {
        let response = self
            .gateway
            .with_failover(|b| b.login(email, password))
            .await?;
        self.gateway.inner.session.begin(
            response.access_token.clone(),
            response.refresh_token.clone(),
            response.user.clone(),
        );
        Ok(response)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, GatewayError> {
        self.gateway.with_failover(|b| b.register(req)).await
    }

    /// Best-effort server-side logout, then an unconditional local clear.
    /// Idempotent and infallible: the session is cleared both times even if
    /// the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.gateway.with_failover(|b| b.logout()).await {
            debug!("Ignoring logout error: {e}");
        }
        self.gateway.inner.session.clear();
    }

    pub async fn me(&self) -> Result<UserProfile, GatewayError> {
        self.gateway.with_failover(|b| b.current_user()).await
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.inner.session.access_token().is_some()
    }
}

pub struct JobsApi<'a> {
    gateway: &'a Gateway,
}

impl JobsApi<'_> {
    pub async fn list(&self) -> Result<JobList, GatewayError> {
        self.gateway.with_failover(|b| b.list_jobs()).await
    }

    pub async fn get(&self, id: &str) -> Result<JobPosting, GatewayError> {
        self.gateway.with_failover(|b| b.get_job(id)).await
    }

    pub async fn create(&self, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.gateway.with_failover(|b| b.create_job(draft)).await
    }

    pub async fn update(&self, id: &str, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.gateway
            .with_failover(|b| b.update_job(id, draft))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.gateway.with_failover(|b| b.delete_job(id)).await
    }
}

pub struct ResumesApi<'a> {
    gateway: &'a Gateway,
}

impl ResumesApi<'_> {
    pub async fn list(&self) -> Result<ResumeList, GatewayError> {
        self.gateway.with_failover(|b| b.list_resumes()).await
    }

    pub async fn get(&self, id: &str) -> Result<ResumeRecord, GatewayError> {
        self.gateway.with_failover(|b| b.get_resume(id)).await
    }

    pub async fn upload(
        &self,
        file: ResumeFile,
        meta: &UploadMetadata,
    ) -> Result<UploadResponse, GatewayError> {
        self.gateway
            .with_failover(|b| b.upload_resume(file.clone(), meta))
            .await
    }

    pub async fn bulk_upload(
        &self,
        files: Vec<ResumeFile>,
    ) -> Result<BulkUploadResponse, GatewayError> {
        self.gateway
            .with_failover(|b| b.bulk_upload(files.clone()))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.gateway.with_failover(|b| b.delete_resume(id)).await
    }

    pub async fn match_to_job(&self, job_description: &str) -> Result<MatchResponse, GatewayError> {
        self.gateway
            .with_failover(|b| b.match_to_job(job_description))
            .await
    }
}

pub struct SystemApi<'a> {
    gateway: &'a Gateway,
}

impl SystemApi<'_> {
    pub async fn health(&self) -> Result<HealthReport, GatewayError> {
        self.gateway.with_failover(|b| b.health()).await
    }

    pub async fn status(&self) -> Result<ApiStatus, GatewayError> {
        self.gateway.with_failover(|b| b.api_status()).await
    }

    /// Aggregated dashboard numbers, computed from the active backend's
    /// list operations so both modes agree on the shape.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, GatewayError> {
        let jobs = self.gateway.with_failover(|b| b.list_jobs()).await?;
        let resumes = self.gateway.with_failover(|b| b.list_resumes()).await?;

        let open_jobs = jobs
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Open)
            .count();
        let mut candidate_emails: Vec<&str> = resumes
            .resumes
            .iter()
            .map(|r| r.candidate_email.as_str())
            .collect();
        candidate_emails.sort_unstable();
        candidate_emails.dedup();

        Ok(DashboardStats {
            total_jobs: jobs.jobs.len(),
            open_jobs,
            closed_jobs: jobs.jobs.len() - open_jobs,
            total_resumes: resumes.resumes.len(),
            total_candidates: candidate_emails.len(),
        })
    }

    /// Explicit connectivity re-probe — the only way back out of fallback
    /// mode (and never while demo mode is forced).
    pub async fn probe_connectivity(&self) -> bool {
        let inner = &*self.gateway.inner;
        let reachable = inner.remote.probe().await;
        if reachable {
            if inner.session.is_fallback_mode() && !inner.config.demo_mode {
                info!("Backend reachable again; leaving fallback mode");
                inner.session.set_fallback_mode(false);
            }
        } else if !inner.session.is_fallback_mode() {
            warn!("Connectivity probe failed; entering fallback mode");
            inner.session.set_fallback_mode(true);
        }
        reachable
    }
}
