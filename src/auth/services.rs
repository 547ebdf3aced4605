pub(crate) use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::config::JwtConfig;
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};
use uuid::Uuid;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 3 to 150 characters of letters, digits and `@.+-_`.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9@.+_-]{3,150}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    /// Access and refresh token, in that order.
    pub fn sign_pair(&self, user_id: Uuid) -> anyhow::Result<(String, String)> {
        Ok((self.sign_access(user_id)?, self.sign_refresh(user_id)?))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}


#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(is_valid_username("anna"));
        assert!(is_valid_username("anna.k+food@home_1-x"));
        assert!(!is_valid_username("an"));
        assert!(!is_valid_username("anna k"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("anna@example.com"));
        assert!(!is_valid_email("anna@example"));
        assert!(!is_valid_email("anna example.com"));
    }
}

#[cfg(test)]
mod jwt_tests {
    use super::*;

    fn make_keys(issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: "same-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    #[tokio::test]
    async fn keys_from_state_use_configured_issuer() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(keys.access_ttl, Duration::from_secs(300));
    }

    #[test]
    fn sign_pair_yields_access_then_refresh() {
        let keys = make_keys("iss", "aud");
        let user_id = Uuid::new_v4();
        let (access, refresh) = keys.sign_pair(user_id).expect("sign pair");
        assert_eq!(keys.verify(&access).unwrap().kind, TokenKind::Access);
        let claims = keys.verify_refresh(&refresh).expect("verify refresh");
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys("iss", "aud");
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("good-iss", "good-aud");
        let bad_keys = make_keys("bad-iss", "bad-aud");
        let token = good_keys.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(bad_keys.verify(&token).is_err());
    }
}
