//! Remote backend — one authenticated HTTP call with bounded retries and a
//! single transparent re-authentication cycle.
//!
//! The hosted backend sleeps when idle and answers 502/503 while waking up,
//! so those statuses (and transport failures) are retried up to the attempt
//! budget with a fixed inter-attempt delay. A 401 on an authenticated call
//! triggers exactly one token refresh and one replay; a failed refresh
//! clears the session and surfaces `AuthenticationExpired`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::models::{
    ApiStatus, BulkUploadResponse, DeleteResponse, HealthReport, JobDraft, JobList, JobPosting,
    LoginResponse, MatchResponse, RegisterRequest, RegisterResponse, ResumeFile, ResumeList,
    ResumeRecord, UploadMetadata, UploadResponse, UserProfile,
};
use crate::session::SessionStore;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One file in a multipart payload. Bodies are kept as reusable parts so a
/// retried attempt can rebuild the form (`reqwest::multipart::Form` is
/// consumed on send).
struct FilePart {
    field: &'static str,
    file_name: String,
    content: Bytes,
}

enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// reqwest sets the boundary content-type itself; no manual header.
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

#[derive(Debug, Deserialize)]
struct RefreshedTokens {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Whatever error envelope the backend used; `detail` (FastAPI style) is
/// preferred over `message`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<String>,
    message: Option<String>,
}

pub struct RequestExecutor {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    max_retries: u32,
    retry_delay: Duration,
    /// Single-flight gate: concurrent 401s queue here so only one refresh
    /// cycle runs at a time.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl RequestExecutor {
    pub fn new(config: &GatewayConfig, session: Arc<SessionStore>) -> Self {
        Self {
            http: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Single quick reachability check, outside the retry budget.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Health probe failed: {e}");
                false
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        authenticated: bool,
    ) -> Result<T, GatewayError> {
        let text = self.dispatch(method, path, &body, authenticated).await?;
        parse_body(&text)
    }

    /// Same flow as `execute`, for endpoints whose response body we ignore.
    async fn execute_discard(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> Result<(), GatewayError> {
        self.dispatch(method, path, &RequestBody::Empty, authenticated)
            .await
            .map(|_| ())
    }

    /// Retry loop over one logical request. Returns the response body text
    /// on 2xx; cold-start statuses and transport failures are retried with
    /// the fixed delay until the attempt budget runs out, then the last
    /// error surfaces.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: &RequestBody,
        authenticated: bool,
    ) -> Result<String, GatewayError> {
        let mut last_error = GatewayError::NetworkUnreachable("no attempt made".to_string());

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                warn!(
                    "{method} {path} attempt {} failed ({last_error}), retrying after {:?}",
                    attempt - 1,
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
            }

            let token = if authenticated {
                self.session.access_token()
            } else {
                None
            };

            let response = match self.send_once(method.clone(), path, body, token.as_deref()).await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = e;
                    continue;
                }
            };

            let status = response.status();

            // Backend cold start: retry within the budget.
            if status == StatusCode::BAD_GATEWAY || status == StatusCode::SERVICE_UNAVAILABLE {
                let body_text = response.text().await.unwrap_or_default();
                last_error = GatewayError::Server {
                    status: status.as_u16(),
                    message: envelope_message(status.as_u16(), &body_text),
                };
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                if !authenticated {
                    // No bearer was attached (login and friends): the
                    // rejection is about the submitted credentials.
                    return Err(GatewayError::InvalidCredentials);
                }
                return self.refresh_and_replay(method, path, body).await;
            }

            return finish(response).await;
        }

        Err(last_error)
    }

    /// Exactly one refresh attempt, then exactly one replay of the original
    /// request. Any failure clears the session so the caller can redirect
    /// to login.
    async fn refresh_and_replay(
        &self,
        method: Method,
        path: &str,
        body: &RequestBody,
    ) -> Result<String, GatewayError> {
        let _gate = self.refresh_gate.lock().await;

        let epoch = self.session.epoch();
        let refresh_token = match self.session.refresh_token() {
            Some(t) => t,
            None => {
                self.session.clear();
                return Err(GatewayError::AuthenticationExpired);
            }
        };

        info!("Access token rejected; attempting refresh");
        let tokens = match self.refresh_once(&refresh_token).await {
            Ok(t) => t,
            Err(e) => {
                warn!("Token refresh failed: {e}");
                self.session.clear();
                return Err(GatewayError::AuthenticationExpired);
            }
        };

        if !self
            .session
            .rotate_tokens(epoch, tokens.access_token.clone(), tokens.refresh_token)
        {
            // Logout won the race; do not resurrect the session.
            return Err(GatewayError::AuthenticationExpired);
        }
        debug!("Token refresh succeeded; replaying {method} {path}");

        let response = self
            .send_once(method, path, body, Some(&tokens.access_token))
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(GatewayError::AuthenticationExpired);
        }
        finish(response).await
    }

    async fn refresh_once(&self, refresh_token: &str) -> Result<RefreshedTokens, GatewayError> {
        let body = RequestBody::Json(serde_json::json!({ "refresh_token": refresh_token }));
        let response = self
            .send_once(Method::POST, "/api/auth/refresh", &body, None)
            .await?;
        let text = finish(response).await?;
        parse_body(&text)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: &RequestBody,
        token: Option<&str>,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for part in files {
                    form = form.part(
                        part.field,
                        reqwest::multipart::Part::bytes(part.content.to_vec())
                            .file_name(part.file_name.clone()),
                    );
                }
                request.multipart(form)
            }
        };

        request.send().await.map_err(GatewayError::from_transport)
    }
}

async fn finish(response: reqwest::Response) -> Result<String, GatewayError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        return Ok(body);
    }
    let message = envelope_message(status.as_u16(), &body);
    Err(match status.as_u16() {
        404 => GatewayError::NotFound(message),
        400 | 422 => GatewayError::Validation(message),
        other => GatewayError::Server {
            status: other,
            message,
        },
    })
}

fn envelope_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.detail.or(e.message))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    serde_json::from_str(text).map_err(|e| GatewayError::Server {
        status: 200,
        message: format!("Invalid response body: {e}"),
    })
}

fn json_body<T: Serialize>(value: &T) -> Result<RequestBody, GatewayError> {
    serde_json::to_value(value)
        .map(RequestBody::Json)
        .map_err(|e| GatewayError::Validation(format!("Failed to encode request body: {e}")))
}

/// The primary-path implementation of [`Backend`].
pub struct RemoteBackend {
    executor: RequestExecutor,
}

impl RemoteBackend {
    pub fn new(config: &GatewayConfig, session: Arc<SessionStore>) -> Self {
        Self {
            executor: RequestExecutor::new(config, session),
        }
    }

    pub async fn probe(&self) -> bool {
        self.executor.probe().await
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let body = RequestBody::Json(serde_json::json!({
            "email": email,
            "password": password,
        }));
        self.executor
            .execute(Method::POST, "/api/auth/login", body, false)
            .await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, GatewayError> {
        self.executor
            .execute(Method::POST, "/api/auth/register", json_body(req)?, false)
            .await
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        self.executor
            .execute_discard(Method::POST, "/api/auth/logout", true)
            .await
    }

    async fn current_user(&self) -> Result<UserProfile, GatewayError> {
        self.executor
            .execute(Method::GET, "/api/auth/me", RequestBody::Empty, true)
            .await
    }

    async fn list_jobs(&self) -> Result<JobList, GatewayError> {
        self.executor
            .execute(Method::GET, "/api/jobs", RequestBody::Empty, true)
            .await
    }

    async fn get_job(&self, id: &str) -> Result<JobPosting, GatewayError> {
        self.executor
            .execute(Method::GET, &format!("/api/jobs/{id}"), RequestBody::Empty, true)
            .await
    }

    async fn create_job(&self, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.executor
            .execute(Method::POST, "/api/jobs", json_body(draft)?, true)
            .await
    }

    async fn update_job(&self, id: &str, draft: &JobDraft) -> Result<JobPosting, GatewayError> {
        self.executor
            .execute(Method::PUT, &format!("/api/jobs/{id}"), json_body(draft)?, true)
            .await
    }

    async fn delete_job(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.executor
            .execute(
                Method::DELETE,
                &format!("/api/jobs/{id}"),
                RequestBody::Empty,
                true,
            )
            .await
    }

    async fn list_resumes(&self) -> Result<ResumeList, GatewayError> {
        self.executor
            .execute(Method::GET, "/api/resumes", RequestBody::Empty, true)
            .await
    }

    async fn get_resume(&self, id: &str) -> Result<ResumeRecord, GatewayError> {
        self.executor
            .execute(
                Method::GET,
                &format!("/api/resumes/{id}"),
                RequestBody::Empty,
                true,
            )
            .await
    }

    async fn upload_resume(
        &self,
        file: ResumeFile,
        meta: &UploadMetadata,
    ) -> Result<UploadResponse, GatewayError> {
        let mut fields = Vec::new();
        if let Some(name) = &meta.candidate_name {
            fields.push(("candidate_name".to_string(), name.clone()));
        }
        if let Some(email) = &meta.candidate_email {
            fields.push(("candidate_email".to_string(), email.clone()));
        }
        if let Some(job_id) = &meta.job_id {
            fields.push(("job_id".to_string(), job_id.clone()));
        }
        let body = RequestBody::Multipart {
            fields,
            files: vec![FilePart {
                field: "file",
                file_name: file.file_name,
                content: file.content,
            }],
        };
        self.executor
            .execute(Method::POST, "/api/resumes/upload", body, true)
            .await
    }

    async fn bulk_upload(
        &self,
        files: Vec<ResumeFile>,
    ) -> Result<BulkUploadResponse, GatewayError> {
        let body = RequestBody::Multipart {
            fields: Vec::new(),
            files: files
                .into_iter()
                .map(|f| FilePart {
                    field: "files",
                    file_name: f.file_name,
                    content: f.content,
                })
                .collect(),
        };
        self.executor
            .execute(Method::POST, "/api/resumes/bulk-upload", body, true)
            .await
    }

    async fn delete_resume(&self, id: &str) -> Result<DeleteResponse, GatewayError> {
        self.executor
            .execute(
                Method::DELETE,
                &format!("/api/resumes/{id}"),
                RequestBody::Empty,
                true,
            )
            .await
    }

    async fn match_to_job(&self, job_description: &str) -> Result<MatchResponse, GatewayError> {
        let body = RequestBody::Json(serde_json::json!({ "job_description": job_description }));
        self.executor
            .execute(Method::POST, "/api/resumes/match", body, true)
            .await
    }

    async fn health(&self) -> Result<HealthReport, GatewayError> {
        self.executor
            .execute(Method::GET, "/health", RequestBody::Empty, false)
            .await
    }

    async fn api_status(&self) -> Result<ApiStatus, GatewayError> {
        self.executor
            .execute(Method::GET, "/api/status", RequestBody::Empty, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile() -> UserProfile {
        UserProfile {
            id: "admin_id".to_string(),
            email: "admin@recruitai.com".to_string(),
            display_name: "Admin".to_string(),
            role: Role::Admin,
        }
    }

    fn test_config(base_url: &str, dir: &tempfile::TempDir) -> GatewayConfig {
        GatewayConfig {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(2),
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            state_path: dir.path().join("session.json"),
            ..GatewayConfig::default()
        }
    }

    fn executor_for(base_url: &str, dir: &tempfile::TempDir) -> (RequestExecutor, Arc<SessionStore>) {
        let config = test_config(base_url, dir);
        let session = Arc::new(SessionStore::open(&config.state_path));
        (RequestExecutor::new(&config, session.clone()), session)
    }

    fn jobs_body() -> serde_json::Value {
        serde_json::json!({ "jobs": [], "total": 0 })
    }

    #[tokio::test]
    async fn test_always_503_uses_exactly_the_attempt_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, _session) = executor_for(&server.uri(), &dir);

        let err = executor
            .execute::<JobList>(Method::GET, "/api/jobs", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Server { status: 503, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_cold_start_recovers_within_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jobs_body()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, _session) = executor_for(&server.uri(), &dir);

        let list: JobList = executor
            .execute(Method::GET, "/api/jobs", RequestBody::Empty, false)
            .await
            .unwrap();
        assert_eq!(list.total, 0);
    }

    #[tokio::test]
    async fn test_401_refresh_replays_once_with_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(serde_json::json!({ "refresh_token": "refresh-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "refresh_token": "refresh-2",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jobs_body()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, session) = executor_for(&server.uri(), &dir);
        session.begin("stale".into(), "refresh-1".into(), profile());

        let list: JobList = executor
            .execute(Method::GET, "/api/jobs", RequestBody::Empty, true)
            .await
            .unwrap();
        assert_eq!(list.total, 0);
        assert_eq!(session.access_token().as_deref(), Some("fresh"));
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn test_401_with_failed_refresh_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, session) = executor_for(&server.uri(), &dir);
        session.begin("stale".into(), "dead-refresh".into(), profile());

        let err = executor
            .execute::<JobList>(Method::GET, "/api/jobs", RequestBody::Empty, true)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationExpired));
        assert!(session.access_token().is_none());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_login_401_is_invalid_credentials_not_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "detail": "Bad credentials" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.uri(), &dir);
        let session = Arc::new(SessionStore::open(&config.state_path));
        let backend = RemoteBackend::new(&config, session);

        let err = backend.login("x@y.z", "nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_error_envelope_prefers_detail_over_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "detail": "title is required",
                "message": "generic",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, _session) = executor_for(&server.uri(), &dir);

        let err = executor
            .execute::<JobPosting>(
                Method::POST,
                "/api/jobs",
                RequestBody::Json(serde_json::json!({})),
                false,
            )
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation(message) => assert_eq!(message, "title is required"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "detail": "Job not found" })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (executor, _session) = executor_for(&server.uri(), &dir);

        let err = executor
            .execute::<JobPosting>(Method::GET, "/api/jobs/missing", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(m) if m == "Job not found"));
    }

    #[tokio::test]
    async fn test_deadline_miss_is_timeout_not_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jobs_body())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            request_timeout: Duration::from_millis(50),
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..test_config(&server.uri(), &dir)
        };
        let session = Arc::new(SessionStore::open(&config.state_path));
        let executor = RequestExecutor::new(&config, session);

        let err = executor
            .execute::<HealthReport>(Method::GET, "/health", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..test_config("http://127.0.0.1:9", &dir)
        };
        let session = Arc::new(SessionStore::open(&config.state_path));
        let executor = RequestExecutor::new(&config, session);

        let err = executor
            .execute::<HealthReport>(Method::GET, "/health", RequestBody::Empty, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NetworkUnreachable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_upload_posts_multipart_form() {
        let server = MockServer::start().await;
        let resume = serde_json::json!({
            "id": "srv-1",
            "candidate_name": "Alice Smith",
            "candidate_email": "alice.smith@example.com",
            "skills": ["Python"],
            "experience_years": 5,
            "upload_date": "2026-08-01T00:00:00Z",
            "match_scores": {},
        });
        Mock::given(method("POST"))
            .and(path("/api/resumes/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Resume uploaded successfully",
                "resume": resume,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server.uri(), &dir);
        let session = Arc::new(SessionStore::open(&config.state_path));
        session.begin("token".into(), "refresh".into(), profile());
        let backend = RemoteBackend::new(&config, session);

        let response = backend
            .upload_resume(
                ResumeFile {
                    file_name: "alice.pdf".to_string(),
                    content: Bytes::from_static(b"%PDF-1.4"),
                },
                &UploadMetadata {
                    candidate_name: Some("Alice Smith".to_string()),
                    ..UploadMetadata::default()
                },
            )
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.resume.id, "srv-1");
    }
}
