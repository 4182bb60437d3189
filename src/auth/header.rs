use crate::app::AppState;
use crate::auth::{Client, password, token};
use crate::config::Config;
use crate::db::Connection;
use crate::model::user::User;
use crate::schema::user;
use base64::prelude::BASE64_STANDARD;
use base64::{DecodeError, Engine};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper};
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub enum AuthenticationError {
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    #[error("Invalid authentication type")]
    InvalidAuthType,
    InvalidEncoding(#[from] DecodeError),
    #[error("Could not validate credentials")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Authentication credentials are malformed")]
    MalformedCredentials,
    #[error("Token owner no longer exists")]
    UnknownTokenOwner,
    #[error("Incorrect username or password")]
    UsernamePasswordMismatch,
    Utf8Conversion(#[from] Utf8Error),
}

/// Authentication can either be done with a bearer token (recommended)
/// or by sending username and password with basic access authentication.
pub fn authenticate_user(state: &AppState, auth: &str) -> Result<Client, AuthenticationError> {
    let (auth_type, credentials) = auth.split_once(' ').ok_or(AuthenticationError::MalformedCredentials)?;
    match auth_type {
        "Basic" => basic_access_authentication(state, credentials.trim()),
        "Bearer" | "bearer" => token_authentication(state, credentials.trim()),
        _ => Err(AuthenticationError::InvalidAuthType),
    }
}

/// Looks up the user with the given `username` and checks their `password`.
pub fn verify_credentials(
    conn: &mut Connection,
    config: &Config,
    username: &str,
    password: &str,
) -> Result<User, AuthenticationError> {
    // For security reasons, don't give any indication to the user if it was the password
    // or the username that was incorrect.
    let user: User = user::table
        .select(User::as_select())
        .filter(user::username.eq(username))
        .first(conn)
        .optional()?
        .ok_or(AuthenticationError::UsernamePasswordMismatch)?;
    password::is_valid_password(config, &user.password_hash, password)
        .map(|()| user)
        .map_err(|_| AuthenticationError::UsernamePasswordMismatch)
}

#[cfg(test)]
pub fn credentials_for(username: &str, password: &str) -> String {
    let credentials = format!("{username}:{password}");
    BASE64_STANDARD.encode(credentials)
}

/// `credentials` are sent base64 encoded, so this function decodes them to utf-8.
fn decode_credentials(credentials: &str) -> Result<(String, String), AuthenticationError> {
    let decoded_credentials = BASE64_STANDARD.decode(credentials)?;
    let utf8_encoded_credentials = std::str::from_utf8(&decoded_credentials)?;
    utf8_encoded_credentials
        .split_once(':')
        .map(|(username, pass)| (username.to_owned(), pass.to_owned()))
        .ok_or(AuthenticationError::MalformedCredentials)
}

/// Checks that the given `credentials` are of the form "username:password"
/// and that the username/password combination is valid.
fn basic_access_authentication(state: &AppState, credentials: &str) -> Result<Client, AuthenticationError> {
    let (username, password) = decode_credentials(credentials)?;
    let mut conn = state.get_connection()?;
    verify_credentials(&mut conn, &state.config, &username, &password)
        .map(|user| Client::new(Some(user.id), user.is_admin))
}

/// Checks that the given bearer `token` is correctly signed, non-expired,
/// and belongs to a user that still exists.
fn token_authentication(state: &AppState, token: &str) -> Result<Client, AuthenticationError> {
    let claims = token::decode_access_token(&state.config, token)?;
    let mut conn = state.get_connection()?;

    // Admin status is read from the database so that promotions and demotions apply immediately
    let (user_id, is_admin): (i32, bool) = user::table
        .select((user::id, user::is_admin))
        .filter(user::id.eq(claims.uid))
        .filter(user::username.eq(&claims.sub))
        .first(&mut conn)
        .optional()?
        .ok_or(AuthenticationError::UnknownTokenOwner)?;
    Ok(Client::new(Some(user_id), is_admin))
}
