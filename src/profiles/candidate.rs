use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{UpdateCandidateProfile, UpdateEducation},
    model::{Candidate, Education, Location, ProfessionalLinks, ResumeMeta},
    validation::{
        check_education, check_experience, check_links, check_name, clean, finish,
        normalize_skills,
    },
};
use crate::{
    auth::identity::{Identity, Role},
    error::AppError,
    state::AppState,
    storage::resume_key,
};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const RESUME_CONTENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// An uploaded resume file as read from the request.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

async fn load(state: &AppState, id: Uuid) -> Result<Candidate, AppError> {
    state
        .store
        .candidate(id)
        .await?
        .ok_or(AppError::NotFound("Student profile not found"))
}

/// Re-derives completion, bumps `updated_at` and writes the record back.
async fn save(state: &AppState, mut candidate: Candidate) -> Result<Candidate, AppError> {
    candidate.touch(OffsetDateTime::now_utc());
    if !state.store.update_candidate(&candidate).await? {
        return Err(AppError::NotFound("Student profile not found"));
    }
    Ok(candidate)
}

pub async fn get_profile(state: &AppState, identity: Identity) -> Result<Candidate, AppError> {
    identity.require(Role::Candidate)?;
    load(state, identity.id).await
}

pub async fn update_profile(
    state: &AppState,
    identity: Identity,
    update: UpdateCandidateProfile,
) -> Result<Candidate, AppError> {
    identity.require(Role::Candidate)?;
    let mut candidate = load(state, identity.id).await?;
    let mut errors = Vec::new();

    if let Some(name) = update.name {
        check_name(&name, &mut errors);
        candidate.name = name.trim().to_string();
    }
    if let Some(loc) = update.location {
        candidate.location = Location {
            city: clean(loc.city),
            state: clean(loc.state),
            country: clean(loc.country),
        };
    }
    if let Some(exp) = update.experience {
        if let Some(years) = exp.years_of_experience {
            candidate.experience.years_of_experience = years;
        }
        candidate.experience.job_title = clean(exp.job_title);
        candidate.experience.company = clean(exp.company);
        candidate.experience.description = clean(exp.description);
        check_experience(&candidate.experience, &mut errors);
    }
    if let Some(links) = update.professional_links {
        candidate.professional_links = ProfessionalLinks {
            linkedin: clean(links.linkedin),
            github: clean(links.github),
            portfolio: clean(links.portfolio),
        };
        check_links(&candidate.professional_links, &mut errors);
    }
    if let Some(raw) = update.availability {
        match raw.parse() {
            Ok(a) => candidate.availability = a,
            Err(_) => errors.push("Invalid availability status".into()),
        }
    }
    finish(errors)?;

    let candidate = save(state, candidate).await?;
    info!(candidate_id = %candidate.id, completed = candidate.profile_completed, "profile updated");
    Ok(candidate)
}

pub async fn update_education(
    state: &AppState,
    identity: Identity,
    update: UpdateEducation,
) -> Result<Candidate, AppError> {
    identity.require(Role::Candidate)?;
    let mut candidate = load(state, identity.id).await?;

    let education = Education {
        degree: clean(update.degree),
        field_of_study: clean(update.field_of_study),
        university: clean(update.university),
        graduation_year: update.graduation_year,
        gpa: update.gpa,
    };
    let mut errors = Vec::new();
    check_education(&education, OffsetDateTime::now_utc().year(), &mut errors);
    finish(errors)?;

    candidate.education = education;
    let candidate = save(state, candidate).await?;
    info!(candidate_id = %candidate.id, "education updated");
    Ok(candidate)
}

pub async fn update_skills(
    state: &AppState,
    identity: Identity,
    skills: Vec<String>,
) -> Result<Candidate, AppError> {
    identity.require(Role::Candidate)?;
    let mut candidate = load(state, identity.id).await?;
    candidate.skills = normalize_skills(skills);
    let candidate = save(state, candidate).await?;
    info!(candidate_id = %candidate.id, skills = candidate.skills.len(), "skills updated");
    Ok(candidate)
}

/// Keeps the last path segment and replaces characters unsafe in a header.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let name: String = base
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    if name.is_empty() {
        "resume".into()
    } else {
        name
    }
}

pub async fn upload_resume(
    state: &AppState,
    identity: Identity,
    upload: ResumeUpload,
) -> Result<ResumeMeta, AppError> {
    identity.require(Role::Candidate)?;
    if upload.bytes.len() > MAX_RESUME_BYTES {
        warn!(candidate_id = %identity.id, size = upload.bytes.len(), "resume too large");
        return Err(AppError::PayloadTooLarge);
    }
    if !RESUME_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
        return Err(AppError::BadRequest(
            "Only PDF, DOC and DOCX files are allowed".into(),
        ));
    }
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("Resume file is empty".into()));
    }
    let mut candidate = load(state, identity.id).await?;

    let meta = ResumeMeta {
        file_name: sanitize_file_name(&upload.file_name),
        content_type: upload.content_type,
        size: upload.bytes.len() as i64,
        uploaded_at: OffsetDateTime::now_utc(),
    };
    state
        .storage
        .put_object(&resume_key(candidate.id), upload.bytes, &meta.content_type)
        .await?;

    candidate.resume = Some(meta.clone());
    save(state, candidate).await?;
    info!(candidate_id = %identity.id, size = meta.size, "resume uploaded");
    Ok(meta)
}

pub async fn remove_resume(state: &AppState, identity: Identity) -> Result<Candidate, AppError> {
    identity.require(Role::Candidate)?;
    let mut candidate = load(state, identity.id).await?;
    if candidate.resume.take().is_none() {
        return Err(AppError::NotFound("Resume not found"));
    }
    state.storage.delete_object(&resume_key(candidate.id)).await?;
    let candidate = save(state, candidate).await?;
    info!(candidate_id = %candidate.id, "resume removed");
    Ok(candidate)
}

/// Resume bytes for the owner or any recruiter.
pub async fn resume(
    state: &AppState,
    identity: Identity,
    candidate_id: Uuid,
) -> Result<(ResumeMeta, Bytes), AppError> {
    let allowed = match identity.role {
        Role::Recruiter => true,
        Role::Candidate => identity.id == candidate_id,
    };
    if !allowed {
        warn!(account_id = %identity.id, %candidate_id, "resume access denied");
        return Err(AppError::Forbidden);
    }

    let candidate = state
        .store
        .candidate(candidate_id)
        .await?
        .ok_or(AppError::NotFound("Student not found"))?;
    let meta = candidate.resume.ok_or(AppError::NotFound("Resume not found"))?;
    let bytes = state
        .storage
        .get_object(&resume_key(candidate_id))
        .await?
        .ok_or(AppError::NotFound("Resume not found"))?;
    Ok((meta, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, profiles::dto::ExperienceUpdate};

    async fn seeded() -> (AppState, Identity) {
        let state = AppState::in_memory(AppConfig::in_memory("secret"));
        let c = Candidate::new("Ada".into(), "ada@example.com".into(), "h".into(), OffsetDateTime::now_utc());
        state.store.insert_candidate(&c).await.unwrap();
        (state, Identity::new(c.id, Role::Candidate))
    }

    fn pdf(len: usize) -> ResumeUpload {
        ResumeUpload {
            file_name: "C:\\docs\\cv \"final\".pdf".into(),
            content_type: "application/pdf".into(),
            bytes: Bytes::from(vec![b'%'; len]),
        }
    }

    #[tokio::test]
    async fn profile_completion_follows_updates() {
        let (state, me) = seeded().await;
        update_profile(
            &state,
            me,
            UpdateCandidateProfile {
                location: Some(Location {
                    city: Some(" Pune ".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update_education(
            &state,
            me,
            Education {
                degree: Some("Bachelor's".into()),
                field_of_study: Some("CS".into()),
                university: Some("IIT".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let c = get_profile(&state, me).await.unwrap();
        assert_eq!(c.location.city.as_deref(), Some("Pune"));
        assert!(!c.profile_completed);

        let c = update_skills(&state, me, vec!["Rust".into(), "rust".into()]).await.unwrap();
        assert_eq!(c.skills, vec!["Rust"]);
        assert!(c.profile_completed);
    }

    #[tokio::test]
    async fn invalid_update_collects_all_messages() {
        let (state, me) = seeded().await;
        let err = update_profile(
            &state,
            me,
            UpdateCandidateProfile {
                name: Some("A".into()),
                experience: Some(ExperienceUpdate {
                    years_of_experience: Some(-2.0),
                    ..Default::default()
                }),
                availability: Some("someday".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Name must be at least 2 characters long. Experience cannot be negative. Invalid availability status"
        );
        assert_eq!(get_profile(&state, me).await.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn resume_round_trip_and_access() {
        let (state, me) = seeded().await;
        let meta = upload_resume(&state, me, pdf(128)).await.unwrap();
        assert_eq!(meta.file_name, "cv _final_.pdf");
        assert_eq!(meta.size, 128);

        let (got, bytes) = resume(&state, me, me.id).await.unwrap();
        assert_eq!(got, meta);
        assert_eq!(bytes.len(), 128);

        let hr = Identity::new(Uuid::new_v4(), Role::Recruiter);
        assert!(resume(&state, hr, me.id).await.is_ok());

        let other = Identity::new(Uuid::new_v4(), Role::Candidate);
        assert!(matches!(resume(&state, other, me.id).await, Err(AppError::Forbidden)));

        remove_resume(&state, me).await.unwrap();
        assert!(matches!(resume(&state, me, me.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn resume_limits() {
        let (state, me) = seeded().await;
        assert!(matches!(
            upload_resume(&state, me, pdf(MAX_RESUME_BYTES + 1)).await,
            Err(AppError::PayloadTooLarge)
        ));
        let mut png = pdf(10);
        png.content_type = "image/png".into();
        assert!(matches!(upload_resume(&state, me, png).await, Err(AppError::BadRequest(_))));
    }
}
