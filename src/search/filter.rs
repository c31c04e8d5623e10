//! Filter compiler: loosely typed query parameters in, typed filter and
//! predicate out. Never fails; malformed values are treated as absent.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::predicate::{text_terms, Condition, Predicate, TextField};
use crate::profiles::model::Availability;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw search parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub skills: Option<String>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<String>,
    pub availability: Option<String>,
    pub experience_min: Option<String>,
    pub experience_max: Option<String>,
    pub gpa_min: Option<String>,
    pub gpa_max: Option<String>,
    pub search_term: Option<String>,
    #[serde(skip_serializing)]
    pub page: Option<String>,
    #[serde(skip_serializing)]
    pub limit: Option<String>,
}

impl SearchParams {
    /// Builds params from raw query pairs. The first value of a repeated key
    /// wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut p = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "skills" => &mut p.skills,
                "location" => &mut p.location,
                "degree" => &mut p.degree,
                "fieldOfStudy" => &mut p.field_of_study,
                "graduationYear" => &mut p.graduation_year,
                "availability" => &mut p.availability,
                "experienceMin" => &mut p.experience_min,
                "experienceMax" => &mut p.experience_max,
                "gpaMin" => &mut p.gpa_min,
                "gpaMax" => &mut p.gpa_max,
                "searchTerm" => &mut p.search_term,
                "page" => &mut p.page,
                "limit" => &mut p.limit,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        p
    }
}

/// Normalized filter; `None` / empty means "not filtered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub availability: Option<Availability>,
    pub experience_min: Option<i64>,
    pub experience_max: Option<i64>,
    pub gpa_min: Option<f64>,
    pub gpa_max: Option<f64>,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE as i64);
        let limit = limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT as i64);
        Self {
            page: page.min(u32::MAX as i64) as u32,
            limit: limit.min(MAX_LIMIT as i64) as u32,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSearch {
    pub filter: CandidateFilter,
    pub predicate: Predicate,
    pub page: PageRequest,
}

fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number<T: FromStr>(raw: &Option<String>) -> Option<T> {
    text(raw).and_then(|s| s.parse::<T>().ok())
}

fn float(raw: &Option<String>) -> Option<f64> {
    number::<f64>(raw).filter(|v| v.is_finite())
}

impl CandidateFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        let skills = text(&params.skills)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            skills,
            location: text(&params.location),
            degree: text(&params.degree),
            field_of_study: text(&params.field_of_study),
            graduation_year: number(&params.graduation_year),
            availability: number(&params.availability),
            experience_min: number(&params.experience_min),
            experience_max: number(&params.experience_max),
            gpa_min: float(&params.gpa_min),
            gpa_max: float(&params.gpa_max),
            search_term: text(&params.search_term),
        }
    }

    pub fn predicate(&self) -> Predicate {
        let mut p = Predicate::all().and_any(
            self.skills
                .iter()
                .map(|s| Condition::SkillContains(s.clone()))
                .collect(),
        );

        if let Some(loc) = &self.location {
            p = p.and_any(
                [TextField::City, TextField::State, TextField::Country]
                    .into_iter()
                    .map(|f| Condition::FieldContains(f, loc.clone()))
                    .collect(),
            );
        }
        if let Some(degree) = &self.degree {
            p = p.and(Condition::FieldContains(TextField::Degree, degree.clone()));
        }
        if let Some(field) = &self.field_of_study {
            p = p.and(Condition::FieldContains(TextField::FieldOfStudy, field.clone()));
        }
        if let Some(year) = self.graduation_year {
            p = p.and(Condition::GraduationYear(year));
        }
        if let Some(a) = self.availability {
            p = p.and(Condition::Availability(a));
        }
        if self.experience_min.is_some() || self.experience_max.is_some() {
            p = p.and(Condition::ExperienceBetween {
                min: self.experience_min,
                max: self.experience_max,
            });
        }
        if self.gpa_min.is_some() || self.gpa_max.is_some() {
            p = p.and(Condition::GpaBetween {
                min: self.gpa_min,
                max: self.gpa_max,
            });
        }
        if let Some(term) = &self.search_term {
            let terms = text_terms(term);
            if !terms.is_empty() {
                p = p.and(Condition::TextSearch(terms));
            }
        }
        p
    }
}

pub fn compile(params: &SearchParams) -> CompiledSearch {
    let filter = CandidateFilter::from_params(params);
    let predicate = filter.predicate();
    let page = PageRequest::new(number(&params.page), number(&params.limit));
    CompiledSearch {
        filter,
        predicate,
        page,
    }
}
