use serde::{Deserialize, Serialize};

use super::model::{
    Candidate, Education, Location, ProfessionalLinks, Recruiter, ResumeMeta, SearchPreferences,
};

/// Partial experience update; absent years leave the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceUpdate {
    pub years_of_experience: Option<f64>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
}

/// Body of `PUT /student/profile`. Each present section replaces the stored one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateProfile {
    pub name: Option<String>,
    pub location: Option<Location>,
    pub experience: Option<ExperienceUpdate>,
    pub professional_links: Option<ProfessionalLinks>,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSkills {
    pub skills: Vec<String>,
}

/// Body of `PUT /hr/profile`. Email, password, role and timestamps are not
/// accepted here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecruiterProfile {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub search_preferences: Option<SearchPreferences>,
}

pub type UpdateEducation = Education;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub profile: Candidate,
    pub profile_completed: bool,
}

impl CandidateProfileResponse {
    pub fn new(profile: Candidate, message: Option<&'static str>) -> Self {
        Self {
            success: true,
            message,
            profile_completed: profile.profile_completed,
            profile,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterProfileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub profile: Recruiter,
    pub profile_completed: bool,
}

impl RecruiterProfileResponse {
    pub fn new(profile: Recruiter, message: Option<&'static str>) -> Self {
        Self {
            success: true,
            message,
            profile_completed: profile.profile_completed,
            profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateDetailResponse {
    pub success: bool,
    pub student: Candidate,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub success: bool,
    pub message: &'static str,
    pub resume: ResumeMeta,
}
