use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::ProfileAssessment;
use crate::enrichment::EnrichmentProgress;
use crate::errors::AppError;
use crate::models::CandidateRecord;
use crate::pipeline::dashboard::{DashboardFilter, JobAnalytics, JobDashboard};
use crate::pipeline::ingest::ResumeIngest;
use crate::pipeline::{AnswerReceipt, InterviewView, RegisteredCandidate};
use crate::scoring::CompositeScore;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterCandidateRequest {
    pub id: Option<Uuid>,
    pub job_id: Option<i64>,
    pub full_name: String,
    #[serde(default)]
    pub resume_text: String,
    pub intro: Option<String>,
    pub why_us: Option<String>,
    #[serde(default)]
    pub declared_skills: Vec<String>,
    pub declared_years_experience: Option<u32>,
    pub professional_profile_url: Option<String>,
    pub code_hosting_url: Option<String>,
}

impl From<RegisterCandidateRequest> for CandidateRecord {
    fn from(req: RegisterCandidateRequest) -> Self {
        CandidateRecord {
            id: req.id.unwrap_or_else(Uuid::new_v4),
            job_id: req.job_id,
            full_name: req.full_name.trim().to_string(),
            resume_text: req.resume_text,
            intro: req.intro,
            why_us: req.why_us,
            declared_skills: req.declared_skills,
            declared_years_experience: req.declared_years_experience,
            professional_profile_url: req.professional_profile_url,
            code_hosting_url: req.code_hosting_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ForceRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// POST /api/v1/candidates
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterCandidateRequest>,
) -> Result<(StatusCode, Json<RegisteredCandidate>), AppError> {
    let registered = state.pipeline.register_candidate(req.into()).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_abandon(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.pipeline.abandon_candidate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/candidates/:id/resume
/// Multipart upload; the first part carrying a file (or a `resume` field) is used.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeIngest>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.file_name().is_none() && field.name() != Some("resume") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        let report = state.pipeline.ingest_resume(id, &bytes, content_type.as_deref()).await?;
        return Ok(Json(report));
    }
    Err(AppError::Validation("No resume file in upload".to_string()))
}

/// POST /api/v1/candidates/:id/enrichment
pub async fn handle_start_enrichment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<EnrichmentProgress>), AppError> {
    let progress = state.pipeline.start_enrichment(id).await?;
    Ok((StatusCode::ACCEPTED, Json(progress)))
}

/// GET /api/v1/candidates/:id/enrichment
pub async fn handle_enrichment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrichmentProgress>, AppError> {
    Ok(Json(state.pipeline.get_enrichment_status(id).await?))
}

/// GET /api/v1/candidates/:id/assessment
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileAssessment>, AppError> {
    Ok(Json(state.pipeline.get_assessment(id).await?))
}

/// POST /api/v1/candidates/:id/assessment
pub async fn handle_reassess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileAssessment>, AppError> {
    Ok(Json(state.pipeline.reassess(id).await?))
}

/// POST /api/v1/candidates/:id/interview
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ForceRequest>>,
) -> Result<(StatusCode, Json<InterviewView>), AppError> {
    let force = body.map(|Json(b)| b.force).unwrap_or_default();
    let view = state.pipeline.start_interview(id, force).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/candidates/:id/interview
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.pipeline.get_interview_plan(id).await?))
}

/// POST /api/v1/candidates/:id/interview/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerReceipt>, AppError> {
    Ok(Json(state.pipeline.submit_answer(id, &req.answer).await?))
}

/// POST /api/v1/candidates/:id/score
pub async fn handle_compute_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ForceRequest>>,
) -> Result<Json<CompositeScore>, AppError> {
    let force = body.map(|Json(b)| b.force).unwrap_or_default();
    Ok(Json(state.pipeline.compute_score(id, force).await?))
}

/// PUT /api/v1/candidates/:id/score
pub async fn handle_recompute_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ForceRequest>>,
) -> Result<Json<CompositeScore>, AppError> {
    let force = body.map(|Json(b)| b.force).unwrap_or_default();
    Ok(Json(state.pipeline.recompute_score(id, force).await?))
}

/// GET /api/v1/jobs/:job_id/dashboard
pub async fn handle_job_dashboard(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Query(filter): Query<DashboardFilter>,
) -> Result<Json<JobDashboard>, AppError> {
    Ok(Json(state.pipeline.job_dashboard(job_id, filter).await?))
}

/// GET /api/v1/jobs/:job_id/dashboard/analytics
pub async fn handle_job_analytics(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobAnalytics>, AppError> {
    Ok(Json(state.pipeline.job_analytics(job_id).await?))
}
