use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::identity::Role, search::history::SearchHistoryEntry};

/// How soon a candidate can start.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Availability {
    #[default]
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "2-weeks")]
    TwoWeeks,
    #[serde(rename = "1-month")]
    OneMonth,
    #[serde(rename = "2-months")]
    TwoMonths,
    #[serde(rename = "not-available")]
    NotAvailable,
}

impl Availability {
    pub const ALL: [Availability; 5] = [
        Availability::Immediate,
        Availability::TwoWeeks,
        Availability::OneMonth,
        Availability::TwoMonths,
        Availability::NotAvailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Immediate => "immediate",
            Availability::TwoWeeks => "2-weeks",
            Availability::OneMonth => "1-month",
            Availability::TwoMonths => "2-months",
            Availability::NotAvailable => "not-available",
        }
    }
}

impl FromStr for Availability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Availability::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown availability {s:?}"))
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub university: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub years_of_experience: f64,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfessionalLinks {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
}

/// Metadata for an uploaded resume; bytes live in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResumeMeta {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

/// Student / job-seeker profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub location: Location,
    pub education: Education,
    pub skills: Vec<String>,
    pub experience: Experience,
    pub professional_links: ProfessionalLinks,
    pub availability: Availability,
    pub resume: Option<ResumeMeta>,
    pub profile_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl Candidate {
    pub fn new(name: String, email: String, password_hash: String, now: OffsetDateTime) -> Self {
        let mut candidate = Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            location: Location::default(),
            education: Education::default(),
            skills: Vec::new(),
            experience: Experience::default(),
            professional_links: ProfessionalLinks::default(),
            availability: Availability::default(),
            resume: None,
            profile_completed: false,
            created_at: now,
            updated_at: now,
        };
        candidate.refresh_completion();
        candidate
    }

    /// Re-derives `profile_completed` from the current fields.
    pub fn refresh_completion(&mut self) -> bool {
        self.profile_completed = !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && present(&self.location.city)
            && present(&self.education.degree)
            && present(&self.education.field_of_study)
            && present(&self.education.university)
            && self.skills.iter().any(|s| !s.trim().is_empty());
        self.profile_completed
    }

    /// Marks a mutation: recomputes completion and bumps `updated_at`.
    pub fn touch(&mut self, now: OffsetDateTime) {
        self.refresh_completion();
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExperienceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Saved filter defaults for a recruiter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreferences {
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub preferred_degrees: Vec<String>,
    #[serde(default)]
    pub preferred_experience_range: ExperienceRange,
}

pub const DEFAULT_JOB_TITLE: &str = "HR Manager";
pub const DEFAULT_DEPARTMENT: &str = "Human Resources";

/// HR profile. The search history is only exposed through its own endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recruiter {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub company_name: String,
    pub job_title: String,
    pub department: String,
    pub search_preferences: SearchPreferences,
    #[serde(skip_serializing)]
    pub search_history: Vec<SearchHistoryEntry>,
    pub profile_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Recruiter {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        company_name: String,
        now: OffsetDateTime,
    ) -> Self {
        let mut recruiter = Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            company_name,
            job_title: DEFAULT_JOB_TITLE.into(),
            department: DEFAULT_DEPARTMENT.into(),
            search_preferences: SearchPreferences::default(),
            search_history: Vec::new(),
            profile_completed: false,
            last_login: now,
            created_at: now,
            updated_at: now,
        };
        recruiter.refresh_completion();
        recruiter
    }

    pub fn refresh_completion(&mut self) -> bool {
        self.profile_completed = !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.company_name.trim().is_empty();
        self.profile_completed
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        self.refresh_completion();
        self.updated_at = now;
    }
}

/// A stored account of either kind, as found by email at login.
#[derive(Debug, Clone)]
pub enum Account {
    Candidate(Candidate),
    Recruiter(Recruiter),
}

impl Account {
    pub fn id(&self) -> Uuid {
        match self {
            Account::Candidate(c) => c.id,
            Account::Recruiter(r) => r.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Candidate(_) => Role::Candidate,
            Account::Recruiter(_) => Role::Recruiter,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Account::Candidate(c) => &c.name,
            Account::Recruiter(r) => &r.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Candidate(c) => &c.email,
            Account::Recruiter(r) => &r.email,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::Candidate(c) => &c.password_hash,
            Account::Recruiter(r) => &r.password_hash,
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        match self {
            Account::Candidate(_) => None,
            Account::Recruiter(r) => Some(&r.company_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_candidate() -> Candidate {
        let mut c = Candidate::new(
            "Ada Lovelace".into(),
            "ada@example.com".into(),
            "hash".into(),
            OffsetDateTime::now_utc(),
        );
        c.location.city = Some("London".into());
        c.education.degree = Some("Bachelor's".into());
        c.education.field_of_study = Some("Mathematics".into());
        c.education.university = Some("UCL".into());
        c.skills = vec!["Python".into()];
        c
    }

    #[test]
    fn new_candidate_is_incomplete() {
        let c = Candidate::new("Ada".into(), "a@b.com".into(), "h".into(), OffsetDateTime::now_utc());
        assert!(!c.profile_completed);
        assert_eq!(c.availability, Availability::Immediate);
        assert_eq!(c.experience.years_of_experience, 0.0);
    }

    #[test]
    fn completion_requires_every_field() {
        let mut c = complete_candidate();
        assert!(c.refresh_completion());
        assert!(c.refresh_completion(), "recomputing without mutation is stable");

        c.education.university = Some("   ".into());
        assert!(!c.refresh_completion());

        let mut c = complete_candidate();
        c.skills.clear();
        assert!(!c.refresh_completion());
    }

    #[test]
    fn stored_completion_flag_is_not_trusted() {
        let mut c = complete_candidate();
        c.profile_completed = true;
        c.location.city = None;
        c.touch(OffsetDateTime::now_utc());
        assert!(!c.profile_completed);
    }

    #[test]
    fn availability_round_trips_through_str() {
        for a in Availability::ALL {
            assert_eq!(a.as_str().parse::<Availability>().unwrap(), a);
        }
        assert!("tomorrow".parse::<Availability>().is_err());
        assert_eq!(serde_json::to_string(&Availability::TwoWeeks).unwrap(), "\"2-weeks\"");
    }

    #[test]
    fn serialization_hides_secrets() {
        let c = complete_candidate();
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["education"]["fieldOfStudy"], "Mathematics");

        let r = Recruiter::new("Grace".into(), "g@corp.io".into(), "h".into(), "Corp".into(), OffsetDateTime::now_utc());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("searchHistory").is_none());
        assert_eq!(json["jobTitle"], DEFAULT_JOB_TITLE);
        assert_eq!(json["profileCompleted"], true);
    }
}
