use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    claims::TokenKind,
    dto::{AuthResponse, LoginRequest, PublicAccount, SignupRequest},
    identity::{Identity, Role},
    jwt::JwtKeys,
    password::{check_password, hash_password, verify_password},
};
use crate::{
    error::AppError,
    profiles::{
        model::{Account, Candidate, Recruiter},
        validation::{check_company, check_name, finish},
    },
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Creates a candidate or recruiter account. The email must be unused by
/// either kind.
pub async fn signup(state: &AppState, req: SignupRequest) -> Result<Account, AppError> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        present(req.name),
        present(req.email),
        present(req.password),
        present(req.role),
    ) else {
        return Err(AppError::BadRequest(
            "Name, email, password, and role are required".into(),
        ));
    };
    let role = Role::parse(&role).ok_or_else(|| AppError::BadRequest("Invalid role specified".into()))?;
    let company = present(req.company_name);
    if role == Role::Recruiter && company.is_none() {
        return Err(AppError::BadRequest("Company name is required for HR role".into()));
    }

    let email = normalize_email(&email);
    let name = name.trim().to_string();
    let mut errors = Vec::new();
    check_name(&name, &mut errors);
    if !is_valid_email(&email) {
        errors.push("Please enter a valid email".into());
    }
    check_password(&password, &mut errors);
    if let Some(company) = &company {
        check_company(company, &mut errors);
    }
    finish(errors)?;

    if state.store.email_in_use(&email).await? {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("User with this email already exists".into()));
    }

    let hash = hash_password(&password)?;
    let now = OffsetDateTime::now_utc();
    let (account, inserted) = match role {
        Role::Candidate => {
            let c = Candidate::new(name, email, hash, now);
            let inserted = state.store.insert_candidate(&c).await?;
            (Account::Candidate(c), inserted)
        }
        Role::Recruiter => {
            let company = company.unwrap_or_default().trim().to_string();
            let r = Recruiter::new(name, email, hash, company, now);
            let inserted = state.store.insert_recruiter(&r).await?;
            (Account::Recruiter(r), inserted)
        }
    };
    if !inserted {
        warn!(email = %account.email(), "email taken during signup");
        return Err(AppError::Conflict("User with this email already exists".into()));
    }

    info!(account_id = %account.id(), role = %account.role(), "account created");
    Ok(account)
}

/// Checks credentials against candidates first, then recruiters.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<Account, AppError> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::BadRequest("Email and password are required".into()));
    };
    let email = normalize_email(&email);

    let Some(mut account) = state.store.find_account_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    if !verify_password(&password, account.password_hash())? {
        warn!(account_id = %account.id(), "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if let Account::Recruiter(r) = &mut account {
        let now = OffsetDateTime::now_utc();
        state.store.touch_last_login(r.id, now).await?;
        r.last_login = now;
    }

    info!(account_id = %account.id(), role = %account.role(), "logged in");
    Ok(account)
}

/// Loads the account behind a token.
pub async fn account(state: &AppState, identity: Identity) -> Result<Account, AppError> {
    let found = match identity.role {
        Role::Candidate => state.store.candidate(identity.id).await?.map(Account::Candidate),
        Role::Recruiter => state.store.recruiter(identity.id).await?.map(Account::Recruiter),
    };
    found.ok_or_else(|| AppError::Unauthorized("Account not found".into()))
}

pub fn issue_tokens(
    keys: &JwtKeys,
    account: &Account,
    message: Option<&'static str>,
) -> Result<AuthResponse, AppError> {
    let identity = Identity::new(account.id(), account.role());
    Ok(AuthResponse {
        success: true,
        message,
        access_token: keys.issue(identity, TokenKind::Access)?,
        refresh_token: keys.issue(identity, TokenKind::Refresh)?,
        user: PublicAccount::from(account),
    })
}
