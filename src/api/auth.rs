use crate::api;
use crate::api::doc::AUTH_TAG;
use crate::api::error::{self, ApiError, ApiResult};
use crate::api::extract::{Json, JsonOrForm};
use crate::app::AppState;
use crate::auth::{Client, header, password, token};
use crate::config::RegexType;
use crate::model::enums::{ResourceProperty, ResourceType};
use crate::model::user::{NewUser, User};
use crate::resource::user::UserInfo;
use crate::schema::user;
use crate::string::SmallString;
use crate::time::DateTime;
use axum::extract::{Extension, State};
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(me))
}

#[derive(Serialize, ToSchema)]
struct TokenResponse {
    access_token: String,
    /// Always "bearer".
    token_type: &'static str,
    user: UserInfo,
}

impl TokenResponse {
    fn new(state: &AppState, user: User) -> ApiResult<Self> {
        let access_token = token::create_access_token(&state.config, user.id, &user.username)?;
        Ok(Self {
            access_token,
            token_type: "bearer",
            user: UserInfo::from(user),
        })
    }
}

/// Request body for creating an account.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct RegisterBody {
    /// Must match the username regex from server's configuration.
    #[schema(value_type = String)]
    username: SmallString,
    #[schema(value_type = String)]
    email: SmallString,
    password: String,
}

/// Creates a new user account and logs it in.
///
/// Usernames and emails must be unique.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = AUTH_TAG,
    request_body = RegisterBody,
    responses(
        (status = 200, body = TokenResponse),
        (status = 400, description = "Username, email, or password is invalid or already in use"),
    ),
)]
async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> ApiResult<Json<TokenResponse>> {
    api::verify_matches_regex(&state.config, &body.username, RegexType::Username)?;
    api::verify_matches_regex(&state.config, &body.email, RegexType::Email)?;
    api::verify_matches_regex(&state.config, &body.password, RegexType::Password)?;

    let password_hash = password::hash_password(&state.config, &body.password)?;
    let new_user = NewUser {
        username: &body.username,
        email: &body.email,
        password_hash: &password_hash,
        is_admin: false,
        created_at: DateTime::now(),
    };

    let user = state.get_connection()?.immediate_transaction(|conn| {
        let username_taken: bool = diesel::select(exists(user::table.filter(user::username.eq(&body.username))))
            .get_result(conn)?;
        if username_taken {
            return Err(ApiError::AlreadyExists(ResourceProperty::UserName));
        }
        let email_taken: bool =
            diesel::select(exists(user::table.filter(user::email.eq(&body.email)))).get_result(conn)?;
        if email_taken {
            return Err(ApiError::AlreadyExists(ResourceProperty::UserEmail));
        }

        let insert_result = diesel::insert_into(user::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn);
        error::map_unique_violation(insert_result, ResourceProperty::UserName)
    })?;
    info!("Registered user {}", user.username);

    TokenResponse::new(&state, user).map(Json)
}

/// Credentials for logging in.
///
/// Accepted either as JSON or as a url-encoded form, so OAuth2 password-flow clients work too.
#[derive(Deserialize, ToSchema)]
struct LoginBody {
    username: String,
    password: String,
}

/// Exchanges a username and password for an access token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = AUTH_TAG,
    request_body(
        content(
            (LoginBody = "application/json"),
            (LoginBody = "application/x-www-form-urlencoded"),
        ),
    ),
    responses(
        (status = 200, body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
    ),
)]
async fn login(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<LoginBody>,
) -> ApiResult<Json<TokenResponse>> {
    let mut conn = state.get_connection()?;
    let user = header::verify_credentials(&mut conn, &state.config, &body.username, &body.password)?;
    TokenResponse::new(&state, user).map(Json)
}

/// Retrieves the currently authenticated user.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = AUTH_TAG,
    security(("bearer" = []), ("basic" = [])),
    responses(
        (status = 200, body = UserInfo),
        (status = 401, description = "Not logged in"),
    ),
)]
async fn me(State(state): State<AppState>, Extension(client): Extension<Client>) -> ApiResult<Json<UserInfo>> {
    let user_id = api::verify_logged_in(client)?;
    let user = user::table
        .find(user_id)
        .select(User::as_select())
        .first(&mut state.get_connection()?)
        .optional()?
        .ok_or(ApiError::NotFound(ResourceType::User))?;
    Ok(Json(UserInfo::from(user)))
}
