use crate::config::Config;
use crate::time::DateTime;
use jsonwebtoken::errors::Error;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::Duration;

/// Contents of a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the token's owner.
    pub sub: String,
    pub uid: i32,
    pub iat: i64,
    pub exp: i64,
}

/// Creates a signed access token for the given user that expires after
/// `token_lifetime_minutes` from the server's configuration.
pub fn create_access_token(config: &Config, user_id: i32, username: &str) -> Result<String, Error> {
    let issued_at = DateTime::now();
    let expires_at = issued_at.saturating_add(Duration::minutes(config.token_lifetime_minutes));
    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
}

/// Verifies signature and expiration of `token` and returns its claims.
pub fn decode_access_token(config: &Config, token: &str) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(config.token_secret.as_bytes()), &validation)
        .map(|token_data| token_data.claims)
}
