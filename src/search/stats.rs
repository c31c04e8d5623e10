use std::collections::HashMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::profiles::model::Candidate;

pub const RECENT_WINDOW_DAYS: i64 = 30;
pub const TOP_SKILLS: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupCount {
    pub id: String,
    pub count: u64,
}

/// Experience ranges, `[lo, hi)` in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperienceBucket {
    UnderOne,
    OneToThree,
    ThreeToFive,
    FiveToTen,
    TenPlus,
    NoExperience,
}

impl ExperienceBucket {
    pub const ALL: [ExperienceBucket; 6] = [
        ExperienceBucket::UnderOne,
        ExperienceBucket::OneToThree,
        ExperienceBucket::ThreeToFive,
        ExperienceBucket::FiveToTen,
        ExperienceBucket::TenPlus,
        ExperienceBucket::NoExperience,
    ];

    /// `[lo, hi)` boundaries; years outside all of them are `NoExperience`.
    pub const RANGES: [(f64, f64, ExperienceBucket); 5] = [
        (0.0, 1.0, ExperienceBucket::UnderOne),
        (1.0, 3.0, ExperienceBucket::OneToThree),
        (3.0, 5.0, ExperienceBucket::ThreeToFive),
        (5.0, 10.0, ExperienceBucket::FiveToTen),
        (10.0, 100.0, ExperienceBucket::TenPlus),
    ];

    pub fn for_years(years: f64) -> Self {
        Self::RANGES
            .iter()
            .find(|(lo, hi, _)| (*lo..*hi).contains(&years))
            .map_or(ExperienceBucket::NoExperience, |(_, _, bucket)| *bucket)
    }

    /// Position in [`ExperienceBucket::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceBucket::UnderOne => "0-1",
            ExperienceBucket::OneToThree => "1-3",
            ExperienceBucket::ThreeToFive => "3-5",
            ExperienceBucket::FiveToTen => "5-10",
            ExperienceBucket::TenPlus => "10-100",
            ExperienceBucket::NoExperience => "No Experience",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_students: u64,
    pub recent_registrations: u64,
    pub availability_stats: Vec<GroupCount>,
    pub degree_stats: Vec<GroupCount>,
    pub experience_stats: Vec<GroupCount>,
    pub skills_stats: Vec<GroupCount>,
}

pub fn recent_cutoff(now: OffsetDateTime) -> OffsetDateTime {
    now - Duration::days(RECENT_WINDOW_DAYS)
}

/// Count descending, then key ascending.
pub fn sort_counts(counts: &mut [GroupCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
}

/// Groups `keys` and returns the `limit` most frequent.
pub fn top_counts<I, S>(keys: I, limit: Option<usize>) -> Vec<GroupCount>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut map: HashMap<String, u64> = HashMap::new();
    for key in keys {
        *map.entry(key.into()).or_default() += 1;
    }
    let mut counts: Vec<GroupCount> = map
        .into_iter()
        .map(|(id, count)| GroupCount { id, count })
        .collect();
    sort_counts(&mut counts);
    if let Some(limit) = limit {
        counts.truncate(limit);
    }
    counts
}

/// Buckets in bucket order; empty buckets are omitted.
pub fn experience_counts(counts: &HashMap<ExperienceBucket, u64>) -> Vec<GroupCount> {
    ExperienceBucket::ALL
        .into_iter()
        .filter_map(|b| {
            counts.get(&b).filter(|n| **n > 0).map(|n| GroupCount {
                id: b.label().to_string(),
                count: *n,
            })
        })
        .collect()
}

impl Statistics {
    pub fn compute(candidates: &[Candidate], now: OffsetDateTime) -> Self {
        let cutoff = recent_cutoff(now);

        let mut buckets: HashMap<ExperienceBucket, u64> = HashMap::new();
        for c in candidates {
            *buckets
                .entry(ExperienceBucket::for_years(c.experience.years_of_experience))
                .or_default() += 1;
        }

        Self {
            total_students: candidates.len() as u64,
            recent_registrations: candidates
                .iter()
                .filter(|c| c.created_at >= cutoff)
                .count() as u64,
            availability_stats: top_counts(candidates.iter().map(|c| c.availability.as_str()), None),
            degree_stats: top_counts(
                candidates
                    .iter()
                    .filter_map(|c| c.education.degree.as_deref()),
                None,
            ),
            experience_stats: experience_counts(&buckets),
            skills_stats: top_counts(
                candidates.iter().flat_map(|c| c.skills.iter().map(String::as_str)),
                Some(TOP_SKILLS),
            ),
        }
    }
}
