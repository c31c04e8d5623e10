use std::{collections::BTreeSet, str::FromStr};

use super::stats::top_counts;
use crate::profiles::model::Candidate;

pub const TOP_SUGGESTIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Skills,
    Locations,
    Degrees,
    FieldOfStudy,
    Universities,
}

impl FromStr for SuggestionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "skills" => Ok(Self::Skills),
            "locations" => Ok(Self::Locations),
            "degrees" => Ok(Self::Degrees),
            "fieldOfStudy" => Ok(Self::FieldOfStudy),
            "universities" => Ok(Self::Universities),
            other => anyhow::bail!("unknown suggestion type {other:?}"),
        }
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Autocomplete values for `kind` over a candidate snapshot.
pub fn suggestions_from(candidates: &[Candidate], kind: SuggestionKind) -> Vec<String> {
    match kind {
        SuggestionKind::Skills => top_counts(
            candidates
                .iter()
                .flat_map(|c| c.skills.iter().map(String::as_str)),
            Some(TOP_SUGGESTIONS),
        )
        .into_iter()
        .map(|g| g.id)
        .collect(),
        SuggestionKind::Locations => top_counts(
            candidates.iter().flat_map(|c| {
                [&c.location.city, &c.location.state, &c.location.country]
                    .into_iter()
                    .filter_map(non_blank)
            }),
            Some(TOP_SUGGESTIONS),
        )
        .into_iter()
        .map(|g| g.id)
        .collect(),
        SuggestionKind::Degrees => {
            distinct(candidates.iter().filter_map(|c| non_blank(&c.education.degree)))
        }
        SuggestionKind::FieldOfStudy => distinct(
            candidates
                .iter()
                .filter_map(|c| non_blank(&c.education.field_of_study)),
        ),
        SuggestionKind::Universities => distinct(
            candidates
                .iter()
                .filter_map(|c| non_blank(&c.education.university)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn candidate(city: Option<&str>, country: Option<&str>, uni: Option<&str>, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new("n".into(), "n@x.io".into(), "h".into(), OffsetDateTime::now_utc());
        c.location.city = city.map(Into::into);
        c.location.country = country.map(Into::into);
        c.education.university = uni.map(Into::into);
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn parses_known_kinds_only() {
        assert_eq!("fieldOfStudy".parse::<SuggestionKind>().unwrap(), SuggestionKind::FieldOfStudy);
        assert!("cities".parse::<SuggestionKind>().is_err());
    }

    #[test]
    fn locations_rank_by_frequency_and_skip_blanks() {
        let cs = vec![
            candidate(Some("Pune"), Some("India"), None, &[]),
            candidate(Some(""), Some("India"), None, &[]),
            candidate(None, Some("Germany"), None, &[]),
        ];
        assert_eq!(
            suggestions_from(&cs, SuggestionKind::Locations),
            vec!["India", "Germany", "Pune"]
        );
    }

    #[test]
    fn universities_are_distinct_and_sorted() {
        let cs = vec![
            candidate(None, None, Some("MIT"), &[]),
            candidate(None, None, Some("ETH"), &[]),
            candidate(None, None, Some("MIT"), &[]),
            candidate(None, None, Some("  "), &[]),
        ];
        assert_eq!(suggestions_from(&cs, SuggestionKind::Universities), vec!["ETH", "MIT"]);
    }

    #[test]
    fn skills_are_top_twenty() {
        let skills: Vec<String> = (0..25).map(|i| format!("s{i:02}")).collect();
        let refs: Vec<&str> = skills.iter().map(String::as_str).collect();
        let cs = vec![candidate(None, None, None, &refs), candidate(None, None, None, &["s24"])];
        let out = suggestions_from(&cs, SuggestionKind::Skills);
        assert_eq!(out.len(), TOP_SUGGESTIONS);
        assert_eq!(out[0], "s24");
    }
}
