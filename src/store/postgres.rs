use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use super::ProfileStore;
use crate::{
    profiles::model::{
        Account, Candidate, Education, Experience, Location, ProfessionalLinks, Recruiter,
        ResumeMeta, SearchPreferences,
    },
    search::{
        filter::PageRequest,
        history::SearchHistoryEntry,
        predicate::{Condition, Predicate},
        stats::{
            experience_counts, recent_cutoff, sort_counts, ExperienceBucket, GroupCount,
            Statistics, TOP_SKILLS,
        },
        suggestions::{SuggestionKind, TOP_SUGGESTIONS},
    },
};

const CANDIDATE_COLUMNS: &str = r#"
    id, name, email, password_hash, city, state, country,
    degree, field_of_study, university, graduation_year, gpa,
    skills, years_of_experience, job_title, company, experience_description,
    linkedin, github, portfolio, availability,
    resume_file_name, resume_content_type, resume_size, resume_uploaded_at,
    profile_completed, created_at, updated_at
"#;

const RECRUITER_COLUMNS: &str = r#"
    id, name, email, password_hash, company_name, job_title, department,
    search_preferences, search_history, profile_completed,
    last_login, created_at, updated_at
"#;

/// Must match the expression index in the migrations.
const TEXT_VECTOR: &str =
    "to_tsvector('simple', regexp_replace(name || ' ' || email, '[^[:alnum:]]+', ' ', 'g'))";

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    degree: Option<String>,
    field_of_study: Option<String>,
    university: Option<String>,
    graduation_year: Option<i32>,
    gpa: Option<f64>,
    skills: Vec<String>,
    years_of_experience: f64,
    job_title: Option<String>,
    company: Option<String>,
    experience_description: Option<String>,
    linkedin: Option<String>,
    github: Option<String>,
    portfolio: Option<String>,
    availability: String,
    resume_file_name: Option<String>,
    resume_content_type: Option<String>,
    resume_size: Option<i64>,
    resume_uploaded_at: Option<OffsetDateTime>,
    profile_completed: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CandidateRow> for Candidate {
    fn from(r: CandidateRow) -> Self {
        let availability = r.availability.parse().unwrap_or_else(|_| {
            warn!(candidate_id = %r.id, value = %r.availability, "unknown availability in row");
            Default::default()
        });
        let resume = match (r.resume_file_name, r.resume_content_type, r.resume_uploaded_at) {
            (Some(file_name), Some(content_type), Some(uploaded_at)) => Some(ResumeMeta {
                file_name,
                content_type,
                size: r.resume_size.unwrap_or_default(),
                uploaded_at,
            }),
            _ => None,
        };
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            location: Location {
                city: r.city,
                state: r.state,
                country: r.country,
            },
            education: Education {
                degree: r.degree,
                field_of_study: r.field_of_study,
                university: r.university,
                graduation_year: r.graduation_year,
                gpa: r.gpa,
            },
            skills: r.skills,
            experience: Experience {
                years_of_experience: r.years_of_experience,
                job_title: r.job_title,
                company: r.company,
                description: r.experience_description,
            },
            professional_links: ProfessionalLinks {
                linkedin: r.linkedin,
                github: r.github,
                portfolio: r.portfolio,
            },
            availability,
            resume,
            profile_completed: r.profile_completed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecruiterRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    company_name: String,
    job_title: String,
    department: String,
    search_preferences: Json<SearchPreferences>,
    search_history: Json<Vec<SearchHistoryEntry>>,
    profile_completed: bool,
    last_login: OffsetDateTime,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<RecruiterRow> for Recruiter {
    fn from(r: RecruiterRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            company_name: r.company_name,
            job_title: r.job_title,
            department: r.department,
            search_preferences: r.search_preferences.0,
            search_history: r.search_history.0,
            profile_completed: r.profile_completed,
            last_login: r.last_login,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// `%needle%` with LIKE metacharacters escaped by `\`.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn push_range(qb: &mut QueryBuilder<'_, Postgres>, column: &str, min: Option<f64>, max: Option<f64>) {
    qb.push("(").push(column).push(" IS NOT NULL");
    if let Some(min) = min {
        qb.push(" AND ").push(column).push(" >= ").push_bind(min);
    }
    if let Some(max) = max {
        qb.push(" AND ").push(column).push(" <= ").push_bind(max);
    }
    qb.push(")");
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    match condition {
        Condition::SkillContains(needle) => {
            qb.push("EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE ")
                .push_bind(like_pattern(needle))
                .push(r" ESCAPE '\')");
        }
        Condition::FieldContains(field, needle) => {
            qb.push(field.column())
                .push(" ILIKE ")
                .push_bind(like_pattern(needle))
                .push(r" ESCAPE '\'");
        }
        Condition::GraduationYear(year) => {
            qb.push("graduation_year = ").push_bind(*year);
        }
        Condition::Availability(a) => {
            qb.push("availability = ").push_bind(a.as_str());
        }
        Condition::ExperienceBetween { min, max } => push_range(
            qb,
            "years_of_experience",
            min.map(|v| v as f64),
            max.map(|v| v as f64),
        ),
        Condition::GpaBetween { min, max } => push_range(qb, "gpa", *min, *max),
        Condition::TextSearch(terms) => {
            qb.push(TEXT_VECTOR)
                .push(" @@ to_tsquery('simple', ")
                .push_bind(terms.join(" | "))
                .push(")");
        }
    }
}

/// Renders the predicate as an AND of parenthesized OR-groups.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    qb.push(" WHERE TRUE");
    for group in predicate.groups() {
        qb.push(" AND (");
        for (i, condition) in group.conditions().iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            push_condition(qb, condition);
        }
        qb.push(")");
    }
}

fn to_counts(rows: Vec<(String, i64)>) -> Vec<GroupCount> {
    let mut counts: Vec<GroupCount> = rows
        .into_iter()
        .map(|(id, count)| GroupCount {
            id,
            count: count.max(0) as u64,
        })
        .collect();
    sort_counts(&mut counts);
    counts
}

/// Maps `years_of_experience` to an [`ExperienceBucket::index`].
fn experience_bucket_case() -> String {
    let arms: String = ExperienceBucket::RANGES
        .iter()
        .map(|(lo, hi, bucket)| {
            format!(
                " WHEN years_of_experience >= {lo:?} AND years_of_experience < {hi:?} THEN {}",
                bucket.index()
            )
        })
        .collect();
    format!("CASE{arms} ELSE {} END", ExperienceBucket::NoExperience.index())
}

/// Adds `$2` to the history, keeping the newest `$3` entries sorted by
/// `searchDate`. The row lock orders concurrent writers; late writes still
/// land in date order.
const APPEND_HISTORY_SQL: &str = r#"
    UPDATE recruiters
       SET search_history = COALESCE((
               SELECT jsonb_agg(e ORDER BY at, i)
                 FROM (
                       SELECT e, i, (e->>'searchDate')::timestamptz AS at
                         FROM jsonb_array_elements(search_history || jsonb_build_array($2::jsonb))
                              WITH ORDINALITY AS t(e, i)
                        ORDER BY at DESC, i DESC
                        LIMIT $3
                      ) newest
           ), '[]'::jsonb)
     WHERE id = $1
"#;

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn email_in_use(&self, email: &str) -> anyhow::Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM candidates WHERE email = $1)
                OR EXISTS (SELECT 1 FROM recruiters WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .context("check email in use")?;
        Ok(taken)
    }

    async fn insert_candidate(&self, c: &Candidate) -> anyhow::Result<bool> {
        let resume = c.resume.as_ref();
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO candidates ({CANDIDATE_COLUMNS})
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                   $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28
            WHERE NOT EXISTS (SELECT 1 FROM recruiters WHERE email = $3)
            ON CONFLICT (email) DO NOTHING
            "#
        ))
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.password_hash)
        .bind(&c.location.city)
        .bind(&c.location.state)
        .bind(&c.location.country)
        .bind(&c.education.degree)
        .bind(&c.education.field_of_study)
        .bind(&c.education.university)
        .bind(c.education.graduation_year)
        .bind(c.education.gpa)
        .bind(&c.skills)
        .bind(c.experience.years_of_experience)
        .bind(&c.experience.job_title)
        .bind(&c.experience.company)
        .bind(&c.experience.description)
        .bind(&c.professional_links.linkedin)
        .bind(&c.professional_links.github)
        .bind(&c.professional_links.portfolio)
        .bind(c.availability.as_str())
        .bind(resume.map(|r| r.file_name.clone()))
        .bind(resume.map(|r| r.content_type.clone()))
        .bind(resume.map(|r| r.size))
        .bind(resume.map(|r| r.uploaded_at))
        .bind(c.profile_completed)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.db)
        .await
        .context("insert candidate")?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_recruiter(&self, r: &Recruiter) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO recruiters ({RECRUITER_COLUMNS})
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            WHERE NOT EXISTS (SELECT 1 FROM candidates WHERE email = $3)
            ON CONFLICT (email) DO NOTHING
            "#
        ))
        .bind(r.id)
        .bind(&r.name)
        .bind(&r.email)
        .bind(&r.password_hash)
        .bind(&r.company_name)
        .bind(&r.job_title)
        .bind(&r.department)
        .bind(Json(&r.search_preferences))
        .bind(Json(&r.search_history))
        .bind(r.profile_completed)
        .bind(r.last_login)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.db)
        .await
        .context("insert recruiter")?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let candidate = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find candidate by email")?;
        if let Some(row) = candidate {
            return Ok(Some(Account::Candidate(row.into())));
        }

        let recruiter = sqlx::query_as::<_, RecruiterRow>(&format!(
            "SELECT {RECRUITER_COLUMNS} FROM recruiters WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find recruiter by email")?;
        Ok(recruiter.map(|row| Account::Recruiter(row.into())))
    }

    async fn candidate(&self, id: Uuid) -> anyhow::Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get candidate")?;
        Ok(row.map(Into::into))
    }

    async fn recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        let row = sqlx::query_as::<_, RecruiterRow>(&format!(
            "SELECT {RECRUITER_COLUMNS} FROM recruiters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get recruiter")?;
        Ok(row.map(Into::into))
    }

    async fn update_candidate(&self, c: &Candidate) -> anyhow::Result<bool> {
        let resume = c.resume.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE candidates
               SET name = $2, city = $3, state = $4, country = $5,
                   degree = $6, field_of_study = $7, university = $8,
                   graduation_year = $9, gpa = $10, skills = $11,
                   years_of_experience = $12, job_title = $13, company = $14,
                   experience_description = $15, linkedin = $16, github = $17,
                   portfolio = $18, availability = $19,
                   resume_file_name = $20, resume_content_type = $21,
                   resume_size = $22, resume_uploaded_at = $23,
                   profile_completed = $24, updated_at = $25
             WHERE id = $1
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.location.city)
        .bind(&c.location.state)
        .bind(&c.location.country)
        .bind(&c.education.degree)
        .bind(&c.education.field_of_study)
        .bind(&c.education.university)
        .bind(c.education.graduation_year)
        .bind(c.education.gpa)
        .bind(&c.skills)
        .bind(c.experience.years_of_experience)
        .bind(&c.experience.job_title)
        .bind(&c.experience.company)
        .bind(&c.experience.description)
        .bind(&c.professional_links.linkedin)
        .bind(&c.professional_links.github)
        .bind(&c.professional_links.portfolio)
        .bind(c.availability.as_str())
        .bind(resume.map(|r| r.file_name.clone()))
        .bind(resume.map(|r| r.content_type.clone()))
        .bind(resume.map(|r| r.size))
        .bind(resume.map(|r| r.uploaded_at))
        .bind(c.profile_completed)
        .bind(c.updated_at)
        .execute(&self.db)
        .await
        .context("update candidate")?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_recruiter(&self, r: &Recruiter) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE recruiters
               SET name = $2, company_name = $3, job_title = $4, department = $5,
                   search_preferences = $6, profile_completed = $7, updated_at = $8
             WHERE id = $1
            "#,
        )
        .bind(r.id)
        .bind(&r.name)
        .bind(&r.company_name)
        .bind(&r.job_title)
        .bind(&r.department)
        .bind(Json(&r.search_preferences))
        .bind(r.profile_completed)
        .bind(r.updated_at)
        .execute(&self.db)
        .await
        .context("update recruiter")?;
        Ok(result.rows_affected() == 1)
    }

    async fn touch_last_login(&self, recruiter_id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE recruiters SET last_login = $2 WHERE id = $1")
            .bind(recruiter_id)
            .bind(at)
            .execute(&self.db)
            .await
            .context("update last login")?;
        Ok(())
    }

    async fn search_candidates(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Candidate>, u64)> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates"
        ));
        push_where(&mut qb, predicate);
        qb.push(" ORDER BY updated_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.skip() as i64);
        let rows = qb
            .build_query_as::<CandidateRow>()
            .fetch_all(&self.db)
            .await
            .context("search candidates")?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates");
        push_where(&mut count, predicate);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count candidates")?;

        Ok((rows.into_iter().map(Into::into).collect(), total.max(0) as u64))
    }

    async fn statistics(&self, now: OffsetDateTime) -> anyhow::Result<Statistics> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM candidates")
            .fetch_one(&self.db);
        let recent = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM candidates WHERE created_at >= $1",
        )
        .bind(recent_cutoff(now))
        .fetch_one(&self.db);
        let availability = sqlx::query_as::<_, (String, i64)>(
            "SELECT availability, COUNT(*) FROM candidates GROUP BY availability",
        )
        .fetch_all(&self.db);
        let degrees = sqlx::query_as::<_, (String, i64)>(
            "SELECT degree, COUNT(*) FROM candidates WHERE degree IS NOT NULL GROUP BY degree",
        )
        .fetch_all(&self.db);
        let bucket_sql = format!(
            "SELECT {} AS bucket, COUNT(*) FROM candidates GROUP BY bucket",
            experience_bucket_case()
        );
        let buckets = sqlx::query_as::<_, (i32, i64)>(&bucket_sql).fetch_all(&self.db);
        let skills = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT skill, COUNT(*)
              FROM candidates, unnest(skills) AS skill
             GROUP BY skill
             ORDER BY COUNT(*) DESC, skill COLLATE "C"
             LIMIT $1
            "#,
        )
        .bind(TOP_SKILLS as i64)
        .fetch_all(&self.db);

        let (total, recent, availability, degrees, buckets, skills) =
            tokio::try_join!(total, recent, availability, degrees, buckets, skills)
                .context("compute statistics")?;

        let bucket_counts: HashMap<ExperienceBucket, u64> = buckets
            .into_iter()
            .filter_map(|(idx, n)| {
                ExperienceBucket::ALL
                    .get(usize::try_from(idx).ok()?)
                    .map(|b| (*b, n.max(0) as u64))
            })
            .collect();

        Ok(Statistics {
            total_students: total.max(0) as u64,
            recent_registrations: recent.max(0) as u64,
            availability_stats: to_counts(availability),
            degree_stats: to_counts(degrees),
            experience_stats: experience_counts(&bucket_counts),
            skills_stats: to_counts(skills),
        })
    }

    async fn suggestions(&self, kind: SuggestionKind) -> anyhow::Result<Vec<String>> {
        let column = match kind {
            SuggestionKind::Skills => {
                let rows = sqlx::query_as::<_, (String, i64)>(
                    r#"
                    SELECT skill, COUNT(*)
                      FROM candidates, unnest(skills) AS skill
                     GROUP BY skill
                     ORDER BY COUNT(*) DESC, skill COLLATE "C"
                     LIMIT $1
                    "#,
                )
                .bind(TOP_SUGGESTIONS as i64)
                .fetch_all(&self.db)
                .await
                .context("skill suggestions")?;
                return Ok(rows.into_iter().map(|(s, _)| s).collect());
            }
            SuggestionKind::Locations => {
                let rows = sqlx::query_as::<_, (String, i64)>(
                    r#"
                    SELECT loc, COUNT(*)
                      FROM candidates, unnest(ARRAY[city, state, country]) AS loc
                     WHERE loc IS NOT NULL AND btrim(loc) <> ''
                     GROUP BY loc
                     ORDER BY COUNT(*) DESC, loc COLLATE "C"
                     LIMIT $1
                    "#,
                )
                .bind(TOP_SUGGESTIONS as i64)
                .fetch_all(&self.db)
                .await
                .context("location suggestions")?;
                return Ok(rows.into_iter().map(|(s, _)| s).collect());
            }
            SuggestionKind::Degrees => "degree",
            SuggestionKind::FieldOfStudy => "field_of_study",
            SuggestionKind::Universities => "university",
        };

        let sql = format!(
            r#"
            SELECT DISTINCT {column} COLLATE "C" AS value
              FROM candidates
             WHERE {column} IS NOT NULL AND btrim({column}) <> ''
             ORDER BY value
            "#
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("distinct {column} suggestions"))?;
        Ok(values)
    }

    async fn append_search_history(
        &self,
        recruiter_id: Uuid,
        entry: &SearchHistoryEntry,
        limit: usize,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(APPEND_HISTORY_SQL)
            .bind(recruiter_id)
            .bind(Json(entry))
            .bind(limit as i64)
            .execute(&self.db)
            .await
            .context("append search history")?;
        Ok(result.rows_affected() == 1)
    }
}
