use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::UpdateRecruiterProfile,
    model::{Candidate, Recruiter},
    validation::{check_company, check_name, check_preferences, clean, finish, normalize_skills},
};
use crate::{
    auth::identity::{Identity, Role},
    error::AppError,
    state::AppState,
};

async fn load(state: &AppState, id: Uuid) -> Result<Recruiter, AppError> {
    state
        .store
        .recruiter(id)
        .await?
        .ok_or(AppError::NotFound("HR profile not found"))
}

pub async fn get_profile(state: &AppState, identity: Identity) -> Result<Recruiter, AppError> {
    identity.require(Role::Recruiter)?;
    load(state, identity.id).await
}

pub async fn update_profile(
    state: &AppState,
    identity: Identity,
    update: UpdateRecruiterProfile,
) -> Result<Recruiter, AppError> {
    identity.require(Role::Recruiter)?;
    let mut recruiter = load(state, identity.id).await?;
    let mut errors = Vec::new();

    if let Some(name) = update.name {
        check_name(&name, &mut errors);
        recruiter.name = name.trim().to_string();
    }
    if let Some(company) = update.company_name {
        check_company(&company, &mut errors);
        recruiter.company_name = company.trim().to_string();
    }
    if let Some(title) = clean(update.job_title) {
        recruiter.job_title = title;
    }
    if let Some(department) = clean(update.department) {
        recruiter.department = department;
    }
    if let Some(mut prefs) = update.search_preferences {
        check_preferences(&prefs, &mut errors);
        prefs.preferred_skills = normalize_skills(prefs.preferred_skills);
        prefs.preferred_locations = normalize_skills(prefs.preferred_locations);
        prefs.preferred_degrees = normalize_skills(prefs.preferred_degrees);
        recruiter.search_preferences = prefs;
    }
    finish(errors)?;

    recruiter.touch(OffsetDateTime::now_utc());
    if !state.store.update_recruiter(&recruiter).await? {
        return Err(AppError::NotFound("HR profile not found"));
    }
    info!(recruiter_id = %recruiter.id, "HR profile updated");
    Ok(recruiter)
}

pub async fn candidate_detail(
    state: &AppState,
    identity: Identity,
    candidate_id: Uuid,
) -> Result<Candidate, AppError> {
    identity.require(Role::Recruiter)?;
    state
        .store
        .candidate(candidate_id)
        .await?
        .ok_or(AppError::NotFound("Student not found"))
}
