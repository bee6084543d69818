//! Bearer tokens for the admin API.
//!
//! HS256 JWTs carrying the account id and role. There is no refresh flow
//! and no server-side session: a token is valid until `exp`, after which
//! the client logs in again.

use chrono::Utc;
use folio_core::types::DbId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Value of the `iss` claim. Tokens from any other issuer are refused.
pub const TOKEN_ISSUER: &str = "folio";

/// Default token lifetime in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: DbId,
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing secret and token lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Token lifetime in seconds, as reported to clients in `expires_in`.
    pub fn expires_in_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Sign a token for `account_id` valid for the configured lifetime.
pub fn issue_access_token(
    account_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let expires_in = config.expires_in_secs();
    let claims = Claims {
        sub: account_id,
        role: role.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        iat: now,
        exp: now + expires_in,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(IssuedToken { token, expires_in })
}

/// Check signature, issuer and expiry, returning the claims.
pub fn verify_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    // `sub` is numeric; jsonwebtoken only checks string subjects, so serde
    // enforces its presence instead.
    validation.set_required_spec_claims(&["exp", "iss"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}
