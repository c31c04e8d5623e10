use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    candidate::{self, ResumeUpload, MAX_RESUME_BYTES},
    dto::{
        CandidateDetailResponse, CandidateProfileResponse, RecruiterProfileResponse,
        ResumeUploadResponse, UpdateCandidateProfile, UpdateEducation, UpdateRecruiterProfile,
        UpdateSkills,
    },
    recruiter,
};
use crate::{
    auth::extractors::{AuthUser, RequireCandidate, RequireRecruiter},
    error::AppError,
    state::AppState,
};

const UPDATED: Option<&str> = Some("Profile updated successfully");

pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route("/student/profile", get(get_student_profile).put(update_student_profile))
        .route("/student/education", put(update_education))
        .route("/student/skills", put(update_skills))
        .route(
            "/student/resume",
            post(upload_resume)
                .delete(remove_resume)
                .layer(DefaultBodyLimit::max(MAX_RESUME_BYTES + 64 * 1024)),
        )
        .route("/candidates/:id/resume", get(download_resume))
}

pub fn recruiter_routes() -> Router<AppState> {
    Router::new()
        .route("/hr/profile", get(get_hr_profile).put(update_hr_profile))
        .route("/hr/students/:id", get(get_student))
}

#[instrument(skip(state))]
pub async fn get_student_profile(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
) -> Result<Json<CandidateProfileResponse>, AppError> {
    let profile = candidate::get_profile(&state, identity).await?;
    Ok(Json(CandidateProfileResponse::new(profile, None)))
}

#[instrument(skip(state, body))]
pub async fn update_student_profile(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
    Json(body): Json<UpdateCandidateProfile>,
) -> Result<Json<CandidateProfileResponse>, AppError> {
    let profile = candidate::update_profile(&state, identity, body).await?;
    Ok(Json(CandidateProfileResponse::new(profile, UPDATED)))
}

#[instrument(skip(state, body))]
pub async fn update_education(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
    Json(body): Json<UpdateEducation>,
) -> Result<Json<CandidateProfileResponse>, AppError> {
    let profile = candidate::update_education(&state, identity, body).await?;
    Ok(Json(CandidateProfileResponse::new(profile, Some("Education updated successfully"))))
}

#[instrument(skip(state, body))]
pub async fn update_skills(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
    Json(body): Json<UpdateSkills>,
) -> Result<Json<CandidateProfileResponse>, AppError> {
    let profile = candidate::update_skills(&state, identity, body.skills).await?;
    Ok(Json(CandidateProfileResponse::new(profile, Some("Skills updated successfully"))))
}

/// POST /student/resume (multipart, field `resume`)
#[instrument(skip(state, mp))]
pub async fn upload_resume(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ResumeUploadResponse>), AppError> {
    let mut upload = None;
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("resume") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(ResumeUpload {
            file_name,
            content_type,
            bytes,
        });
        break;
    }
    let upload = upload.ok_or_else(|| AppError::BadRequest("resume file is required".into()))?;

    let resume = candidate::upload_resume(&state, identity, upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ResumeUploadResponse {
            success: true,
            message: "Resume uploaded successfully",
            resume,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn remove_resume(
    State(state): State<AppState>,
    RequireCandidate(identity): RequireCandidate,
) -> Result<Json<CandidateProfileResponse>, AppError> {
    let profile = candidate::remove_resume(&state, identity).await?;
    Ok(Json(CandidateProfileResponse::new(profile, Some("Resume removed"))))
}

#[instrument(skip(state))]
pub async fn download_resume(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (meta, bytes) = candidate::resume(&state, identity, id).await?;
    let disposition = format!("inline; filename=\"{}\"", meta.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, meta.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[instrument(skip(state))]
pub async fn get_hr_profile(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
) -> Result<Json<RecruiterProfileResponse>, AppError> {
    let profile = recruiter::get_profile(&state, identity).await?;
    Ok(Json(RecruiterProfileResponse::new(profile, None)))
}

#[instrument(skip(state, body))]
pub async fn update_hr_profile(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
    Json(body): Json<UpdateRecruiterProfile>,
) -> Result<Json<RecruiterProfileResponse>, AppError> {
    let profile = recruiter::update_profile(&state, identity, body).await?;
    Ok(Json(RecruiterProfileResponse::new(profile, UPDATED)))
}

#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    RequireRecruiter(identity): RequireRecruiter,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateDetailResponse>, AppError> {
    let student = recruiter::candidate_detail(&state, identity, id).await?;
    Ok(Json(CandidateDetailResponse {
        success: true,
        student,
    }))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        warn!(error = %e, "malformed multipart body");
        AppError::BadRequest(e.body_text())
    }
}
