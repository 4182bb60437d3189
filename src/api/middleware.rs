use crate::api::error::ApiResult;
use crate::app::AppState;
use crate::auth::{Client, header};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

/// Attempts to authorize user by either username/password or bearer token.
///
/// Requests without an `Authorization` header proceed as an anonymous [`Client`].
/// A header that is present but invalid fails the request.
pub async fn auth(State(state): State<AppState>, mut request: Request, next: Next) -> ApiResult<Response> {
    let auth_header = request.headers().get(AUTHORIZATION);
    let client = if let Some(auth_value) = auth_header {
        let auth_str = auth_value.to_str()?;
        header::authenticate_user(&state, auth_str)
    } else {
        Ok(Client::anonymous())
    }?;

    request.extensions_mut().insert(client);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod test {
    use crate::auth::header;
    use crate::test::*;
    use axum::http::StatusCode;
    use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};

    #[tokio::test]
    async fn unauthorized() {
        let (_dir, state) = test_state(|_| ());
        let user = create_test_user(&mut state.get_connection().unwrap(), "regular_user", false).unwrap();
        let server = test_server(&state);

        let wrong_username = format!("Basic {}", header::credentials_for("mystery_man29", TEST_PASSWORD));
        let wrong_password = format!("Basic {}", header::credentials_for("regular_user", "password123"));
        let unencoded_credentials = format!("Basic regular_user:{TEST_PASSWORD}");
        let unknown_type = format!("Token {}", header::credentials_for("regular_user", TEST_PASSWORD));
        let forged_token = format!("{}x", bearer_for(&state, &user));
        for auth in [wrong_username, wrong_password, unencoded_credentials, unknown_type, forged_token, String::new()] {
            let response = server.get("/auth/me").add_header(AUTHORIZATION, auth).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.header(WWW_AUTHENTICATE), "Bearer");
        }
    }

    #[tokio::test]
    async fn basic_and_bearer() {
        let (_dir, state) = test_state(|_| ());
        let user = create_test_user(&mut state.get_connection().unwrap(), "regular_user", false).unwrap();
        let server = test_server(&state);

        let basic = format!("Basic {}", header::credentials_for("regular_user", TEST_PASSWORD));
        server.get("/auth/me").add_header(AUTHORIZATION, basic).await.assert_status_ok();
        server
            .get("/auth/me")
            .add_header(AUTHORIZATION, bearer_for(&state, &user))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn deleted_user_token() {
        use crate::schema::user;
        use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};

        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let user = create_test_user(&mut conn, "short_lived", false).unwrap();
        let bearer = bearer_for(&state, &user);
        diesel::delete(user::table.filter(user::id.eq(user.id))).execute(&mut conn).unwrap();

        let server = test_server(&state);
        server
            .get("/auth/me")
            .add_header(AUTHORIZATION, bearer)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
