use crate::api;
use crate::api::doc::ARTWORK_TAG;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Json, Path, Query};
use crate::app::AppState;
use crate::auth::Client;
use crate::content::generate::{self, GenerationRequest};
use crate::model::artwork::{
    Artwork, ArtworkLike, DEFAULT_DIMENSION, DEFAULT_GUIDANCE_SCALE, NewArtwork, NewArtworkLike,
};
use crate::model::enums::ResourceType;
use crate::resource::artwork::ArtworkInfo;
use crate::schema::{artwork, artwork_like};
use crate::time::DateTime;
use axum::extract::{Extension, State};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create))
        .routes(routes!(gallery))
        .routes(routes!(my_gallery))
        .routes(routes!(get))
        .routes(routes!(feature))
        .routes(routes!(like))
}

/// Loads the artwork with the given `artwork_id` if the `client` is allowed to see it.
///
/// Private artworks of other users are reported as missing rather than forbidden.
pub fn visible_artwork(conn: &mut SqliteConnection, client: Client, artwork_id: i32) -> ApiResult<Artwork> {
    artwork::table
        .find(artwork_id)
        .select(Artwork::as_select())
        .first(conn)
        .optional()?
        .filter(|artwork| artwork.visible_to(client.id, client.is_admin))
        .ok_or(ApiError::NotFound(ResourceType::Artwork))
}

/// Request body for generating an artwork.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct ArtworkCreateBody {
    title: String,
    prompt: String,
    negative_prompt: Option<String>,
    /// Defaults to 7.5.
    guidance_scale: Option<f64>,
    /// Defaults to 512.
    width: Option<u32>,
    /// Defaults to 512.
    height: Option<u32>,
    /// Defaults to true. Private artworks are only visible to their creator and administrators.
    is_public: Option<bool>,
}

/// Generates an image from a prompt and stores it as an artwork owned by the client.
#[utoipa::path(
    post,
    path = "/artworks/generate",
    tag = ARTWORK_TAG,
    security(("bearer" = []), ("basic" = [])),
    request_body = ArtworkCreateBody,
    responses(
        (status = 200, body = ArtworkInfo),
        (status = 400, description = "Title or prompt is empty, or dimensions are out of range"),
        (status = 401, description = "Not logged in"),
    ),
)]
async fn create(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<ArtworkCreateBody>,
) -> ApiResult<Json<ArtworkInfo>> {
    let creator_id = api::verify_logged_in(client)?;
    let title = api::verify_not_empty(&body.title, "Title")?;
    let prompt = api::verify_not_empty(&body.prompt, "Prompt")?;
    let width = body.width.unwrap_or(DEFAULT_DIMENSION);
    let height = body.height.unwrap_or(DEFAULT_DIMENSION);
    api::verify_dimensions(&state.config, width, height)?;

    let request = GenerationRequest {
        prompt: prompt.to_owned(),
        negative_prompt: body.negative_prompt.clone().filter(|text| !text.trim().is_empty()),
        guidance_scale: body.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
        width,
        height,
    };
    let image = generate::generate(&state, &request).await?;

    let image_path = image.path.to_string_lossy();
    let image_url = state.config.image_url(&image.filename);
    let new_artwork = NewArtwork {
        title,
        prompt,
        negative_prompt: request.negative_prompt.as_deref(),
        image_path: &image_path,
        image_url: &image_url,
        guidance_scale: request.guidance_scale,
        width: width as i32,
        height: height as i32,
        is_public: body.is_public.unwrap_or(true),
        is_featured: false,
        created_at: DateTime::now(),
        creator_id,
    };

    let mut conn = state.get_connection()?;
    let artwork = conn.transaction(|conn| {
        diesel::insert_into(artwork::table)
            .values(&new_artwork)
            .returning(Artwork::as_returning())
            .get_result(conn)
    })?;
    info!("User {creator_id} created artwork {} from {}", artwork.id, image.source);

    conn.transaction(|conn| ArtworkInfo::new(conn, artwork))
        .map(Json)
        .map_err(ApiError::from)
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct GalleryParams {
    /// Number of artworks to skip.
    #[serde(default)]
    skip: i64,
    /// Maximum number of artworks to return. At most 100.
    #[serde(default = "default_page_size")]
    limit: i64,
    /// Only return featured artworks.
    #[serde(default)]
    featured_only: bool,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Lists public artworks, newest first.
#[utoipa::path(
    get,
    path = "/artworks/gallery",
    tag = ARTWORK_TAG,
    params(GalleryParams),
    responses(
        (status = 200, body = Vec<ArtworkInfo>),
        (status = 422, description = "Paging parameters are out of range"),
    ),
)]
async fn gallery(
    State(state): State<AppState>,
    Query(params): Query<GalleryParams>,
) -> ApiResult<Json<Vec<ArtworkInfo>>> {
    if params.skip < 0 || !(1..=MAX_PAGE_SIZE).contains(&params.limit) {
        return Err(ApiError::InvalidPage(MAX_PAGE_SIZE));
    }

    state.get_connection()?.transaction(|conn| {
        let mut query = artwork::table
            .select(Artwork::as_select())
            .filter(artwork::is_public.eq(true))
            .into_boxed();
        if params.featured_only {
            query = query.filter(artwork::is_featured.eq(true));
        }
        let artworks = query
            .order_by((artwork::created_at.desc(), artwork::id.desc()))
            .offset(params.skip)
            .limit(params.limit)
            .load(conn)?;
        ArtworkInfo::new_batch(conn, artworks).map(Json).map_err(ApiError::from)
    })
}

/// Lists all artworks of the client, including private ones, newest first.
#[utoipa::path(
    get,
    path = "/artworks/my-gallery",
    tag = ARTWORK_TAG,
    security(("bearer" = []), ("basic" = [])),
    responses(
        (status = 200, body = Vec<ArtworkInfo>),
        (status = 401, description = "Not logged in"),
    ),
)]
async fn my_gallery(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
) -> ApiResult<Json<Vec<ArtworkInfo>>> {
    let creator_id = api::verify_logged_in(client)?;
    state.get_connection()?.transaction(|conn| {
        let artworks = artwork::table
            .select(Artwork::as_select())
            .filter(artwork::creator_id.eq(creator_id))
            .order_by((artwork::created_at.desc(), artwork::id.desc()))
            .load(conn)?;
        ArtworkInfo::new_batch(conn, artworks).map(Json).map_err(ApiError::from)
    })
}

/// Retrieves a single artwork.
#[utoipa::path(
    get,
    path = "/artworks/{id}",
    tag = ARTWORK_TAG,
    params(("id" = i32, Path, description = "Artwork id")),
    responses(
        (status = 200, body = ArtworkInfo),
        (status = 404, description = "Artwork does not exist or is private"),
    ),
)]
async fn get(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(artwork_id): Path<i32>,
) -> ApiResult<Json<ArtworkInfo>> {
    state.get_connection()?.transaction(|conn| {
        let artwork = visible_artwork(conn, client, artwork_id)?;
        ArtworkInfo::new(conn, artwork).map(Json).map_err(ApiError::from)
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct FeatureBody {
    featured: bool,
}

/// Features or unfeatures an artwork. Requires administrator privileges.
#[utoipa::path(
    put,
    path = "/artworks/{id}/feature",
    tag = ARTWORK_TAG,
    security(("bearer" = []), ("basic" = [])),
    params(("id" = i32, Path, description = "Artwork id")),
    request_body = FeatureBody,
    responses(
        (status = 200, body = ArtworkInfo),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Privileges are too low"),
        (status = 404, description = "Artwork does not exist"),
    ),
)]
async fn feature(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(artwork_id): Path<i32>,
    Json(body): Json<FeatureBody>,
) -> ApiResult<Json<ArtworkInfo>> {
    api::verify_admin(client)?;
    state.get_connection()?.transaction(|conn| {
        let artwork: Artwork = diesel::update(artwork::table.find(artwork_id))
            .set(artwork::is_featured.eq(body.featured))
            .returning(Artwork::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(ApiError::NotFound(ResourceType::Artwork))?;
        ArtworkInfo::new(conn, artwork).map(Json).map_err(ApiError::from)
    })
}

#[derive(Serialize, ToSchema)]
struct LikeResponse {
    /// Whether the client likes the artwork after this request.
    liked: bool,
    likes_count: i64,
}

/// Toggles the client's like on an artwork.
///
/// Liking an artwork twice removes the like again.
#[utoipa::path(
    post,
    path = "/artworks/{id}/like",
    tag = ARTWORK_TAG,
    security(("bearer" = []), ("basic" = [])),
    params(("id" = i32, Path, description = "Artwork id")),
    responses(
        (status = 200, body = LikeResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Artwork does not exist or is private"),
    ),
)]
async fn like(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(artwork_id): Path<i32>,
) -> ApiResult<Json<LikeResponse>> {
    let user_id = api::verify_logged_in(client)?;

    // Lookup and toggle must happen under the write lock, or concurrent likes could both insert
    state.get_connection()?.immediate_transaction(|conn| {
        visible_artwork(conn, client, artwork_id)?;

        let existing_like: Option<ArtworkLike> = artwork_like::table
            .select(ArtworkLike::as_select())
            .filter(artwork_like::artwork_id.eq(artwork_id))
            .filter(artwork_like::user_id.eq(user_id))
            .first(conn)
            .optional()?;
        let liked = match existing_like {
            Some(existing) => {
                diesel::delete(artwork_like::table.find(existing.id)).execute(conn)?;
                false
            }
            None => {
                let new_like = NewArtworkLike {
                    user_id,
                    artwork_id,
                    created_at: DateTime::now(),
                };
                diesel::insert_into(artwork_like::table).values(&new_like).execute(conn)?;
                true
            }
        };

        let likes_count: i64 = artwork_like::table
            .filter(artwork_like::artwork_id.eq(artwork_id))
            .select(count_star())
            .first(conn)?;
        Ok(Json(LikeResponse { liked, likes_count }))
    })
}

#[cfg(test)]
mod test {
    use crate::model::user::User;
    use crate::schema::artwork_like;
    use crate::test::*;
    use crate::time::DateTime;
    use axum::http::StatusCode;
    use axum::http::header::AUTHORIZATION;
    use diesel::prelude::*;
    use serde_json::{Value, json};
    use time::OffsetDateTime;
    use tokio::task::JoinSet;
    use time::format_description::well_known::Rfc3339;
    use time::macros::datetime;

    fn titles(response: &Value) -> Vec<&str> {
        response
            .as_array()
            .unwrap()
            .iter()
            .map(|artwork| artwork["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn create() {
        let (_dir, state) = test_state(|_| ());
        let user = create_test_user(&mut state.get_connection().unwrap(), "painter", false).unwrap();
        let server = test_server(&state);

        let body = json!({ "title": "Harbor", "prompt": "A quiet harbor at dawn", "width": 128, "height": 96 });
        server.post("/artworks/generate").json(&body).await.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/artworks/generate")
            .add_header(AUTHORIZATION, bearer_for(&state, &user))
            .json(&body)
            .await;
        response.assert_status_ok();
        let artwork: Value = response.json();
        assert_eq!(artwork["title"], "Harbor");
        assert_eq!(artwork["prompt"], "A quiet harbor at dawn");
        assert_eq!(artwork["creator_username"], "painter");
        assert_eq!(artwork["likes_count"], 0);
        assert_eq!(artwork["comments_count"], 0);
        assert_eq!(artwork["is_featured"], false);
        assert!(OffsetDateTime::parse(artwork["created_at"].as_str().unwrap(), &Rfc3339).is_ok());

        let image = server.get(artwork["image_url"].as_str().unwrap()).await;
        image.assert_status_ok();
        assert!(image.as_bytes().starts_with(b"\x89PNG"));

        let invalid_bodies = [
            json!({ "title": " ", "prompt": "A quiet harbor" }),
            json!({ "title": "Harbor", "prompt": "" }),
            json!({ "title": "Harbor", "prompt": "A quiet harbor", "width": 4000 }),
        ];
        for body in invalid_bodies {
            server
                .post("/artworks/generate")
                .add_header(AUTHORIZATION, bearer_for(&state, &user))
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn galleries() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let alice = create_test_user(&mut conn, "alice", false).unwrap();
        let bob = create_test_user(&mut conn, "bob", false).unwrap();
        create_test_artwork(&mut conn, &alice, "Old", true, datetime!(2024-01-01 00:00 UTC).into()).unwrap();
        create_test_artwork(&mut conn, &bob, "Secret", false, datetime!(2024-01-02 00:00 UTC).into()).unwrap();
        create_test_artwork(&mut conn, &bob, "New", true, datetime!(2024-01-03 00:00 UTC).into()).unwrap();
        create_test_artwork(&mut conn, &alice, "Middle", true, datetime!(2024-01-02 12:00 UTC).into()).unwrap();
        let server = test_server(&state);

        let gallery: Value = server.get("/artworks/gallery").await.json();
        assert_eq!(titles(&gallery), ["New", "Middle", "Old"]);

        let page: Value = server.get("/artworks/gallery?skip=1&limit=1").await.json();
        assert_eq!(titles(&page), ["Middle"]);

        for query in ["limit=101", "limit=0", "skip=-1", "limit=many"] {
            let response = server.get(&format!("/artworks/gallery?{query}")).await;
            assert!(response.status_code().is_client_error(), "{query} was accepted");
        }

        let own: Value = server
            .get("/artworks/my-gallery")
            .add_header(AUTHORIZATION, bearer_for(&state, &bob))
            .await
            .json();
        assert_eq!(titles(&own), ["New", "Secret"]);
        server.get("/artworks/my-gallery").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn private_artwork() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let owner = create_test_user(&mut conn, "owner", false).unwrap();
        let stranger = create_test_user(&mut conn, "stranger", false).unwrap();
        let admin = create_test_user(&mut conn, "admin", true).unwrap();
        let artwork = create_test_artwork(&mut conn, &owner, "Diary", false, DateTime::now()).unwrap();
        let server = test_server(&state);
        let path = format!("/artworks/{}", artwork.id);

        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
        for (user, status) in [(&stranger, StatusCode::NOT_FOUND), (&owner, StatusCode::OK), (&admin, StatusCode::OK)] {
            server
                .get(&path)
                .add_header(AUTHORIZATION, bearer_for(&state, user))
                .await
                .assert_status(status);
        }
        server.get("/artworks/9999").await.assert_status(StatusCode::NOT_FOUND);
        server.get("/artworks/not-a-number").await.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feature() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let user = create_test_user(&mut conn, "painter", false).unwrap();
        let admin = create_test_user(&mut conn, "curator", true).unwrap();
        let artwork = create_test_artwork(&mut conn, &user, "Sunset", true, DateTime::now()).unwrap();
        create_test_artwork(&mut conn, &user, "Sunrise", true, DateTime::now()).unwrap();
        let server = test_server(&state);
        let path = format!("/artworks/{}/feature", artwork.id);
        let body = json!({ "featured": true });

        server.put(&path).json(&body).await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .put(&path)
            .add_header(AUTHORIZATION, bearer_for(&state, &user))
            .json(&body)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .put(&path)
            .add_header(AUTHORIZATION, bearer_for(&state, &admin))
            .json(&body)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["is_featured"], true);

        let featured: Value = server.get("/artworks/gallery?featured_only=true").await.json();
        assert_eq!(titles(&featured), ["Sunset"]);

        server
            .put("/artworks/9999/feature")
            .add_header(AUTHORIZATION, bearer_for(&state, &admin))
            .json(&body)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn like_toggle() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let alice = create_test_user(&mut conn, "alice", false).unwrap();
        let bob = create_test_user(&mut conn, "bob", false).unwrap();
        let artwork = create_test_artwork(&mut conn, &alice, "Meadow", true, DateTime::now()).unwrap();
        let server = test_server(&state);
        let path = format!("/artworks/{}/like", artwork.id);

        server.post(&path).await.assert_status(StatusCode::UNAUTHORIZED);

        let like = |user: &User| {
            let request = server.post(&path).add_header(AUTHORIZATION, bearer_for(&state, user));
            async move { request.await.json::<Value>() }
        };
        assert_eq!(like(&alice).await, json!({ "liked": true, "likes_count": 1 }));
        assert_eq!(like(&bob).await, json!({ "liked": true, "likes_count": 2 }));
        assert_eq!(like(&alice).await, json!({ "liked": false, "likes_count": 1 }));
        assert_eq!(like(&alice).await, json!({ "liked": true, "likes_count": 2 }));

        let details: Value = server.get(&format!("/artworks/{}", artwork.id)).await.json();
        assert_eq!(details["likes_count"], 2);

        server
            .post("/artworks/9999/like")
            .add_header(AUTHORIZATION, bearer_for(&state, &alice))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes() {
        const REQUESTS: usize = 15;

        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        let fan = create_test_user(&mut conn, "fan", false).unwrap();
        let artwork = create_test_artwork(&mut conn, &fan, "Sunrise", true, DateTime::now()).unwrap();
        let bearer = bearer_for(&state, &fan);

        let address = spawn_server(crate::api::routes(state.clone())).await;
        let url = format!("http://{address}/artworks/{}/like", artwork.id);
        let client = reqwest::Client::new();
        let mut requests = JoinSet::new();
        for _ in 0..REQUESTS {
            let request = client.post(&url).header(AUTHORIZATION, bearer.as_str());
            requests.spawn(async move { request.send().await.unwrap().status() });
        }
        while let Some(status) = requests.join_next().await {
            assert_eq!(status.unwrap(), reqwest::StatusCode::OK);
        }

        // Each request toggles, so an odd number of them ends liked
        let likes: i64 = artwork_like::table
            .filter(artwork_like::artwork_id.eq(artwork.id))
            .count()
            .first(&mut conn)
            .unwrap();
        assert_eq!(likes, 1);
    }
}
