use axum::{
    extract::FromRef,
    http::{header, HeaderMap},
};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::SessionConfig, state::AppState};

const ISSUER: &str = "tingle";

/// Payload of the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
}

/// Signing keys and cookie attributes for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(&state.config.session)
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            cookie_name: cfg.cookie_name(),
            ttl: Duration::days(cfg.ttl_days),
            secure: cfg.secure,
        }
    }

    fn sign_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = SessionClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: ISSUER.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session signed");
        Ok(token)
    }

    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value establishing a session for `user_id`.
    pub fn issue_cookie(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = self.sign(user_id)?;
        let cookie = Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.ttl)
            .build();
        Ok(cookie.to_string())
    }

    /// `Set-Cookie` value that makes the browser drop the session.
    pub fn removal_cookie(&self) -> String {
        let mut cookie = Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        cookie.make_removal();
        cookie.to_string()
    }

    /// User id carried by a valid session cookie in `headers`, if any.
    pub fn read_session(&self, headers: &HeaderMap) -> Option<Uuid> {
        let token = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.cookie_name)
            .map(|c| c.value().to_string())?;

        if token.is_empty() {
            return None;
        }

        match self.verify(&token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                warn!(error = %e, "invalid session cookie");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::HeaderValue;

    use super::*;

    pub(crate) fn test_config(secret: &str) -> SessionConfig {
        SessionConfig {
            secret: secret.into(),
            secret_version: 1,
            ttl_days: 30,
            secure: false,
        }
    }

    /// Turns a `Set-Cookie` value into the matching request `Cookie` header.
    pub(crate) fn cookie_header(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    /// Flips one character in the middle of the token payload.
    pub(crate) fn tamper(token: &str) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = &mut parts[1];
        let mid = payload.len() / 2;
        let original = payload.as_bytes()[mid];
        let replacement = if original == b'A' { "B" } else { "A" };
        payload.replace_range(mid..mid + 1, replacement);
        parts.join(".")
    }

    #[test]
    fn sign_and_verify_session() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "tingle");
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = SessionKeys::new(&test_config("secret-a"));
        let bad = SessionKeys::new(&test_config("secret-b"));
        let token = good.sign(Uuid::new_v4()).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_session() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let long_ago = OffsetDateTime::now_utc() - Duration::days(365);
        let token = keys.sign_at(Uuid::new_v4(), long_ago).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn issued_cookie_has_expected_attributes() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let set_cookie = keys.issue_cookie(Uuid::new_v4()).unwrap();
        assert!(set_cookie.starts_with("tingle_session_v1="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=2592000"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[test]
    fn production_cookie_is_secure() {
        let mut cfg = test_config("dev-secret");
        cfg.secure = true;
        let keys = SessionKeys::new(&cfg);
        assert!(keys.issue_cookie(Uuid::new_v4()).unwrap().contains("Secure"));
    }

    #[test]
    fn cookie_roundtrips_to_user_id() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let user_id = Uuid::new_v4();
        let headers = cookie_header(&keys.issue_cookie(user_id).unwrap());
        assert_eq!(keys.read_session(&headers), Some(user_id));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let token = keys.sign(Uuid::new_v4()).unwrap();
        let mut headers = HeaderMap::new();
        let value = format!("tingle_session_v1={}", tamper(&token));
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert_eq!(keys.read_session(&headers), None);
    }

    #[test]
    fn cookie_from_other_secret_version_is_ignored() {
        let v1 = SessionKeys::new(&test_config("dev-secret"));
        let mut cfg = test_config("dev-secret");
        cfg.secret_version = 2;
        let v2 = SessionKeys::new(&cfg);
        let headers = cookie_header(&v1.issue_cookie(Uuid::new_v4()).unwrap());
        assert_eq!(v2.read_session(&headers), None);
    }

    #[test]
    fn session_found_among_other_cookies() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).unwrap();
        let mut headers = HeaderMap::new();
        let value = format!("theme=dark; tingle_session_v1={}; lang=en", token);
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert_eq!(keys.read_session(&headers), Some(user_id));
    }

    #[test]
    fn removal_cookie_clears_session() {
        let keys = SessionKeys::new(&test_config("dev-secret"));
        let removal = keys.removal_cookie();
        assert!(removal.starts_with("tingle_session_v1=;"));
        assert!(removal.contains("Max-Age=0"));
        assert_eq!(keys.read_session(&cookie_header(&removal)), None);
    }
}
