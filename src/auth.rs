use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    flash,
    repository::RepositoryState,
};

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime. Tokens older than this are rejected and the user must
/// log in again.
const SESSION_TTL_SECS: usize = 60 * 60 * 24;

/// Claims
///
/// Represents the payload structure signed into the session cookie.
/// These claims are signed with the server's session secret and validated
/// on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user, the primary key into `users`.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the session must not be
    /// accepted, keeping stale cookies from living forever.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the session was established.
    pub iat: usize,
}

// --- Password Hashing ---

/// hash_password
///
/// Produces an Argon2id PHC string with a fresh random salt. This is the only
/// form in which a password ever reaches the repository.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// verify_password
///
/// Checks a submitted password against a stored PHC string. A malformed
/// stored hash verifies as false rather than erroring, so callers cannot
/// distinguish it from a plain mismatch.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// --- Session Tokens ---

/// issue_session_token
///
/// Signs a fresh session token for the given user. Called after a successful
/// login or registration; the result goes into the session cookie.
pub fn issue_session_token(
    user_id: Uuid,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// session_cookie
///
/// Wraps a signed token in the session cookie. HttpOnly keeps it away from
/// page scripts; Lax lets the cookie ride along on top-level redirects.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// remove_session_cookie
///
/// Clears the session cookie from the jar. Used by logout; clearing an
/// absent session is a no-op.
pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

// --- The Authenticated Identity ---

/// AuthUser
///
/// This struct represents the resolved identity of an authenticated request.
/// It is the core output of the AuthUser extractor implementation.
/// Handlers use it to retrieve the acting user's ID for ownership checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to users.id.
    pub id: Uuid,
    /// Display name, joined into authored content.
    pub name: String,
    /// The user's login email.
    pub email: String,
}

/// AuthRedirect
///
/// The rejection produced when a protected route is hit without a valid
/// session: a flashed message plus a redirect to the login page. This is the
/// browser-facing counterpart of a bare 401.
#[derive(Debug)]
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        let jar = flash::set_flash(CookieJar::new(), "Please log in to continue.");
        (jar, Redirect::to("/login")).into_response()
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This cleanly separates
/// authentication (extractor/middleware) from business logic (the handler).
///
/// The process involves:
/// 1. Dependency Resolution: Accessing Repository and AppConfig from the state.
/// 2. Local Bypass: Allowing development-time access using the 'x-user-id' header.
/// 3. Token Validation: Session cookie extraction and signature/expiry checks.
/// 4. DB Lookup: Fetching the user row, so deleted accounts lose access even
///    while holding a formally valid token.
///
/// Rejection: Redirects to /login with a flashed message on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the session secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // If the application is running in Env::Local, we allow authentication by
        // providing a known, valid UUID in the 'x-user-id' header. This accelerates
        // development and integration tests but is guarded by the Env check.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        // The UUID must still map to an actual row so handlers
                        // always see a real user.
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                name: user.name,
                                email: user.email,
                            });
                        }
                    }
                }
            }
        }
        // If Env is Production, or if the bypass failed, execution falls through
        // to the standard session cookie validation flow.

        // 3. Session Cookie Extraction
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .ok_or(AuthRedirect)?;

        // 4. Token Decoding Setup
        let secret = &config.session_secret;
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();

        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // 5. Decode and Validate the Token
        let token_data = match decode::<Claims>(&token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                match e.kind() {
                    // Token expired: the most common failure for a valid-but-old cookie.
                    ErrorKind::ExpiredSignature => return Err(AuthRedirect),
                    // Catch all other failure types (bad signature, malformed token, etc.).
                    _ => return Err(AuthRedirect),
                }
            }
        };

        let user_id = token_data.claims.sub;

        // 6. Database Lookup (Final Verification)
        // Check the database for the user's existence. This prevents access if
        // the account was deleted after the session was established.
        let user = repo.get_user(user_id).await.ok_or(AuthRedirect)?;

        // Success: Return the resolved identity.
        Ok(AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }
}

/// Optional AuthUser Extraction
///
/// Lets handlers accept `Option<AuthUser>` when anonymous access is valid but
/// the handler decides what to do about it (the comment endpoint redirects
/// with its own flashed message rather than using the blanket rejection).
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(
            <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .ok(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "battery staple"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn test_two_hashes_of_same_password_differ() {
        // Random salts: equal passwords never share a stored hash.
        let first = hash_password("repeatable").unwrap();
        let second = hash_password("repeatable").unwrap();
        assert_ne!(first, second);
    }
}
