use crate::api;
use crate::api::artwork::visible_artwork;
use crate::api::doc::COMMENT_TAG;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Json, Path};
use crate::app::AppState;
use crate::auth::Client;
use crate::model::comment::{Comment, NewComment};
use crate::resource::comment::CommentInfo;
use crate::schema::comment;
use crate::time::DateTime;
use axum::extract::{Extension, State};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(create, list))
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct CommentCreateBody {
    content: String,
}

/// Comments on an artwork.
#[utoipa::path(
    post,
    path = "/artworks/{id}/comments",
    tag = COMMENT_TAG,
    security(("bearer" = []), ("basic" = [])),
    params(("id" = i32, Path, description = "Artwork id")),
    request_body = CommentCreateBody,
    responses(
        (status = 200, body = CommentInfo),
        (status = 400, description = "Content is empty"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Artwork does not exist or is private"),
    ),
)]
async fn create(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(artwork_id): Path<i32>,
    Json(body): Json<CommentCreateBody>,
) -> ApiResult<Json<CommentInfo>> {
    let user_id = api::verify_logged_in(client)?;
    let content = api::verify_not_empty(&body.content, "Content")?;
    let new_comment = NewComment {
        content,
        user_id,
        artwork_id,
        created_at: DateTime::now(),
    };

    state.get_connection()?.immediate_transaction(|conn| {
        visible_artwork(conn, client, artwork_id)?;
        let comment = diesel::insert_into(comment::table)
            .values(&new_comment)
            .returning(Comment::as_returning())
            .get_result(conn)?;
        CommentInfo::new(conn, comment).map(Json).map_err(ApiError::from)
    })
}

/// Lists the comments on an artwork, newest first.
#[utoipa::path(
    get,
    path = "/artworks/{id}/comments",
    tag = COMMENT_TAG,
    params(("id" = i32, Path, description = "Artwork id")),
    responses(
        (status = 200, body = Vec<CommentInfo>),
        (status = 404, description = "Artwork does not exist or is private"),
    ),
)]
async fn list(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(artwork_id): Path<i32>,
) -> ApiResult<Json<Vec<CommentInfo>>> {
    state.get_connection()?.transaction(|conn| {
        visible_artwork(conn, client, artwork_id)?;
        let comments = comment::table
            .select(Comment::as_select())
            .filter(comment::artwork_id.eq(artwork_id))
            .order_by((comment::created_at.desc(), comment::id.desc()))
            .load(conn)?;
        CommentInfo::new_batch(conn, comments).map(Json).map_err(ApiError::from)
    })
}
