use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{
    claims::{Claims, TokenKind},
    identity::Identity,
};
use crate::{config::JwtConfig, state::AppState};

/// HS256 keys plus the issuer, audience and lifetimes stamped into tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        let secret = cfg.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::minutes(cfg.ttl_minutes.max(0)),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes.max(0)),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(&self, identity: Identity, kind: TokenKind) -> anyhow::Result<String> {
        let claims = Claims::new(
            identity,
            kind,
            &self.issuer,
            &self.audience,
            OffsetDateTime::now_utc(),
            self.ttl(kind),
        );
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = %identity.id, role = %identity.role, ?kind, "token issued");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience, then the token kind.
    pub fn decode(&self, token: &str, expected: TokenKind) -> anyhow::Result<Identity> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.kind != expected {
            anyhow::bail!("expected {expected:?} token, got {:?}", claims.kind);
        }
        Ok(claims.identity())
    }
}
