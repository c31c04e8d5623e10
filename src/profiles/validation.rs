use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::model::{Education, Experience, ProfessionalLinks, SearchPreferences};
use crate::error::AppError;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_COMPANY_LEN: usize = 2;
pub const MIN_GRADUATION_YEAR: i32 = 1950;
/// Graduation years may lie this far in the future.
pub const GRADUATION_YEAR_AHEAD: i32 = 10;
pub const MAX_GPA: f64 = 10.0;

lazy_static! {
    static ref LINKEDIN_RE: Regex =
        Regex::new(r"^https?://(www\.)?linkedin\.com/in/[\w-]+/?$").unwrap();
    static ref GITHUB_RE: Regex = Regex::new(r"^https?://(www\.)?github\.com/[\w-]+/?$").unwrap();
    static ref PORTFOLIO_RE: Regex = Regex::new(r"^https?://[\w.-]+\.[a-zA-Z]{2,}(/.*)?$").unwrap();
}

/// Trims; blank becomes `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn check_name(name: &str, errors: &mut Vec<String>) {
    if name.trim().chars().count() < MIN_NAME_LEN {
        errors.push("Name must be at least 2 characters long".into());
    }
}

pub fn check_company(company: &str, errors: &mut Vec<String>) {
    if company.trim().chars().count() < MIN_COMPANY_LEN {
        errors.push("Company name must be at least 2 characters long".into());
    }
}

pub fn check_education(edu: &Education, current_year: i32, errors: &mut Vec<String>) {
    if let Some(year) = edu.graduation_year {
        if !(MIN_GRADUATION_YEAR..=current_year + GRADUATION_YEAR_AHEAD).contains(&year) {
            errors.push("Invalid graduation year".into());
        }
    }
    if let Some(gpa) = edu.gpa {
        if !gpa.is_finite() {
            errors.push("Invalid GPA".into());
        } else if gpa < 0.0 {
            errors.push("GPA cannot be negative".into());
        } else if gpa > MAX_GPA {
            errors.push("GPA cannot exceed 10.0".into());
        }
    }
}

pub fn check_experience(exp: &Experience, errors: &mut Vec<String>) {
    let years = exp.years_of_experience;
    if !years.is_finite() || years < 0.0 {
        errors.push("Experience cannot be negative".into());
    }
}

pub fn check_links(links: &ProfessionalLinks, errors: &mut Vec<String>) {
    let checks: [(&Option<String>, &Regex, &str); 3] = [
        (&links.linkedin, &LINKEDIN_RE, "Please enter a valid LinkedIn URL"),
        (&links.github, &GITHUB_RE, "Please enter a valid GitHub URL"),
        (&links.portfolio, &PORTFOLIO_RE, "Please enter a valid portfolio URL"),
    ];
    for (value, re, message) in checks {
        if let Some(v) = value.as_deref() {
            if !re.is_match(v) {
                errors.push(message.into());
            }
        }
    }
}

pub fn check_preferences(prefs: &SearchPreferences, errors: &mut Vec<String>) {
    let range = &prefs.preferred_experience_range;
    if range.min.is_some_and(|v| v < 0.0) || range.max.is_some_and(|v| v < 0.0) {
        errors.push("Experience range cannot be negative".into());
    }
}

/// Trims, drops blanks and keeps the first spelling of case-insensitive
/// duplicates.
pub fn normalize_skills(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

pub fn finish(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
