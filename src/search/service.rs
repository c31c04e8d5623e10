use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{
    executor::{execute, SearchPage},
    filter::{compile, CompiledSearch, SearchParams},
    history::{record_in_background, FilterSnapshot, SearchHistoryEntry},
    stats::Statistics,
    suggestions::SuggestionKind,
};
use crate::{
    auth::identity::{Identity, Role},
    error::AppError,
    state::AppState,
};

pub struct SearchOutcome {
    pub compiled: CompiledSearch,
    pub page: SearchPage,
    /// Background history write; callers may drop it.
    pub history: JoinHandle<()>,
}

/// Compiles `params`, runs the search and records it in the caller's history.
pub async fn search_candidates(
    state: &AppState,
    identity: Identity,
    params: &SearchParams,
) -> Result<SearchOutcome, AppError> {
    identity.require(Role::Recruiter)?;

    let compiled = compile(params);
    debug!(groups = compiled.predicate.groups().len(), page = compiled.page.page, "search compiled");
    let page = execute(state.store.as_ref(), &compiled.predicate, compiled.page).await?;

    let entry = SearchHistoryEntry {
        filters: FilterSnapshot::from(&compiled.filter),
        search_date: OffsetDateTime::now_utc(),
        results_count: page.total,
    };
    let history = record_in_background(state.store.clone(), identity.id, entry);

    info!(
        recruiter_id = %identity.id,
        total = page.total,
        page = page.page,
        returned = page.candidates.len(),
        "candidate search"
    );
    Ok(SearchOutcome {
        compiled,
        page,
        history,
    })
}

pub async fn statistics(state: &AppState, identity: Identity) -> Result<Statistics, AppError> {
    identity.require(Role::Recruiter)?;
    let stats = state.store.statistics(OffsetDateTime::now_utc()).await?;
    Ok(stats)
}

/// Unknown or missing `kind` yields an empty list.
pub async fn suggestions(
    state: &AppState,
    identity: Identity,
    kind: Option<&str>,
) -> Result<Vec<String>, AppError> {
    identity.require(Role::Recruiter)?;
    let Some(kind) = kind.and_then(|k| k.parse::<SuggestionKind>().ok()) else {
        return Ok(Vec::new());
    };
    Ok(state.store.suggestions(kind).await?)
}

/// The caller's search history, most recent first.
pub async fn search_history(
    state: &AppState,
    identity: Identity,
) -> Result<Vec<SearchHistoryEntry>, AppError> {
    identity.require(Role::Recruiter)?;
    let recruiter = state
        .store
        .recruiter(identity.id)
        .await?
        .ok_or(AppError::NotFound("HR profile not found"))?;
    let mut history = recruiter.search_history;
    history.reverse();
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        profiles::model::{Candidate, Recruiter},
        search::history::HISTORY_LIMIT,
    };

    async fn seeded() -> (AppState, Identity) {
        let state = AppState::in_memory(AppConfig::in_memory("secret"));
        let now = OffsetDateTime::now_utc();
        let recruiter = Recruiter::new("Rita".into(), "rita@corp.io".into(), "h".into(), "Corp".into(), now);
        state.store.insert_recruiter(&recruiter).await.unwrap();

        for (i, (name, years)) in [("ana", 1.0), ("ben", 4.0), ("cy", 7.0)].into_iter().enumerate() {
            let mut c = Candidate::new(name.into(), format!("{name}@example.com"), "h".into(), now);
            c.experience.years_of_experience = years;
            c.skills = vec![if i % 2 == 0 { "Python".into() } else { "Go".into() }];
            state.store.insert_candidate(&c).await.unwrap();
        }
        (state, Identity::new(recruiter.id, Role::Recruiter))
    }

    #[tokio::test]
    async fn candidates_cannot_search() {
        let (state, _) = seeded().await;
        let who = Identity::new(uuid::Uuid::new_v4(), Role::Candidate);
        let err = search_candidates(&state, who, &SearchParams::default()).await.err();
        assert!(matches!(err, Some(AppError::Forbidden)));
        assert!(matches!(statistics(&state, who).await, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn experience_range_is_inclusive() {
        let (state, who) = seeded().await;
        let params = SearchParams {
            experience_min: Some("1".into()),
            experience_max: Some("4".into()),
            ..Default::default()
        };
        let out = search_candidates(&state, who, &params).await.unwrap();
        out.history.await.unwrap();
        assert_eq!(out.page.total, 2);
        for c in &out.page.candidates {
            let y = c.experience.years_of_experience;
            assert!((1.0..=4.0).contains(&y));
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let (state, who) = seeded().await;
        let params = SearchParams {
            page: Some("5".into()),
            limit: Some("2".into()),
            ..Default::default()
        };
        let out = search_candidates(&state, who, &params).await.unwrap();
        assert!(out.page.candidates.is_empty());
        assert_eq!(out.page.total, 3);
        assert_eq!(out.page.total_pages, 2);
        assert!(!out.page.has_next_page);
    }

    #[tokio::test]
    async fn history_keeps_the_latest_fifty() {
        let (state, who) = seeded().await;
        for n in 0..=HISTORY_LIMIT {
            let params = SearchParams {
                search_term: Some(format!("term{n}")),
                ..Default::default()
            };
            let out = search_candidates(&state, who, &params).await.unwrap();
            out.history.await.unwrap();
        }
        let history = search_history(&state, who).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].filters.search_term.as_deref(), Some("term50"));
        assert_eq!(history[HISTORY_LIMIT - 1].filters.search_term.as_deref(), Some("term1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn history_stays_ordered_when_writes_race() {
        let (state, who) = seeded().await;
        let rounds = 20;
        for round in 0..rounds {
            let mut pending = Vec::new();
            for n in 0..HISTORY_LIMIT {
                let params = SearchParams {
                    search_term: Some(format!("term{}", round * HISTORY_LIMIT + n)),
                    ..Default::default()
                };
                pending.push(search_candidates(&state, who, &params).await.unwrap().history);
            }
            for handle in pending {
                handle.await.unwrap();
            }
        }

        let history = search_history(&state, who).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        for pair in history.windows(2) {
            assert!(pair[0].search_date >= pair[1].search_date);
        }
        let last = rounds * HISTORY_LIMIT;
        let mut terms: Vec<String> = history
            .iter()
            .filter_map(|e| e.filters.search_term.clone())
            .collect();
        terms.sort();
        let mut expected: Vec<String> = (last - HISTORY_LIMIT..last).map(|n| format!("term{n}")).collect();
        expected.sort();
        assert_eq!(terms, expected);
    }

    #[tokio::test]
    async fn unknown_suggestion_type_is_empty() {
        let (state, who) = seeded().await;
        assert!(suggestions(&state, who, Some("cities")).await.unwrap().is_empty());
        assert!(suggestions(&state, who, None).await.unwrap().is_empty());
        assert_eq!(
            suggestions(&state, who, Some("skills")).await.unwrap(),
            vec!["Python", "Go"]
        );
    }
}
