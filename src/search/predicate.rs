//! Compiled match conditions over candidate profiles.
//!
//! A [`Predicate`] is an AND of [`AnyOf`] groups; each group is an OR over one
//! or more [`Condition`]s. The same predicate is evaluated in memory and
//! rendered to SQL by the Postgres store.

use crate::profiles::model::{Availability, Candidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    City,
    State,
    Country,
    Degree,
    FieldOfStudy,
}

impl TextField {
    pub fn column(self) -> &'static str {
        match self {
            TextField::City => "city",
            TextField::State => "state",
            TextField::Country => "country",
            TextField::Degree => "degree",
            TextField::FieldOfStudy => "field_of_study",
        }
    }

    pub fn value(self, c: &Candidate) -> Option<&str> {
        match self {
            TextField::City => c.location.city.as_deref(),
            TextField::State => c.location.state.as_deref(),
            TextField::Country => c.location.country.as_deref(),
            TextField::Degree => c.education.degree.as_deref(),
            TextField::FieldOfStudy => c.education.field_of_study.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Some skill contains the needle, ignoring case.
    SkillContains(String),
    /// The field contains the needle, ignoring case.
    FieldContains(TextField, String),
    GraduationYear(i32),
    Availability(Availability),
    /// Inclusive bounds on years of experience.
    ExperienceBetween { min: Option<i64>, max: Option<i64> },
    /// Inclusive bounds on GPA; candidates without a GPA never match.
    GpaBetween { min: Option<f64>, max: Option<f64> },
    /// Any of the words appears among the name/email words.
    TextSearch(Vec<String>),
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn within<T: PartialOrd + Copy>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

impl Condition {
    pub fn matches(&self, c: &Candidate) -> bool {
        match self {
            Condition::SkillContains(needle) => {
                c.skills.iter().any(|s| contains_ignore_case(s, needle))
            }
            Condition::FieldContains(field, needle) => field
                .value(c)
                .is_some_and(|v| contains_ignore_case(v, needle)),
            Condition::GraduationYear(year) => c.education.graduation_year == Some(*year),
            Condition::Availability(a) => c.availability == *a,
            Condition::ExperienceBetween { min, max } => within(
                c.experience.years_of_experience,
                min.map(|v| v as f64),
                max.map(|v| v as f64),
            ),
            Condition::GpaBetween { min, max } => c
                .education
                .gpa
                .is_some_and(|gpa| within(gpa, *min, *max)),
            Condition::TextSearch(terms) => {
                let words = text_terms(&format!("{} {}", c.name, c.email));
                terms.iter().any(|t| words.contains(t))
            }
        }
    }
}

/// OR-group; never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyOf(Vec<Condition>);

impl AnyOf {
    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }

    pub fn matches(&self, c: &Candidate) -> bool {
        self.0.iter().any(|cond| cond.matches(c))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    groups: Vec<AnyOf>,
}

impl Predicate {
    /// Matches every candidate.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(self, condition: Condition) -> Self {
        self.and_any(vec![condition])
    }

    /// Adds an OR-group as one more AND-ed clause. Empty groups are dropped.
    pub fn and_any(mut self, conditions: Vec<Condition>) -> Self {
        if !conditions.is_empty() {
            self.groups.push(AnyOf(conditions));
        }
        self
    }

    pub fn groups(&self) -> &[AnyOf] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn matches(&self, c: &Candidate) -> bool {
        self.groups.iter().all(|g| g.matches(c))
    }
}

/// Lowercase alphanumeric words, in order, without duplicates.
pub fn text_terms(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}
