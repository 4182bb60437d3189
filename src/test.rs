use crate::app::{self, AppState};
use crate::auth::{password, token};
use crate::config::{self, Config};
use crate::db::Connection;
use crate::model::artwork::{Artwork, NewArtwork};
use crate::model::user::{NewUser, User};
use crate::schema::{artwork, user};
use crate::time::DateTime;
use axum::Router;
use axum_test::TestServer;
use diesel::prelude::*;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::LazyLock;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_PASSWORD: &str = "test_password";

/// Hash of [`TEST_PASSWORD`] under the test configuration's pepper.
static TEST_HASH: LazyLock<String> = LazyLock::new(|| {
    let dir = tempfile::tempdir().unwrap();
    password::hash_password(&config::test_config(dir.path()), TEST_PASSWORD).unwrap()
});

/// Creates a state backed by a fresh data directory and database.
/// The directory is deleted when the returned [`TempDir`] is dropped.
pub fn test_state(configure: impl FnOnce(&mut Config)) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config::test_config(dir.path());
    configure(&mut config);
    let state = app::prepare(config).unwrap_or_else(|err| panic!("{err}"));
    (dir, state)
}

pub fn test_server(state: &AppState) -> TestServer {
    TestServer::new(crate::api::routes(state.clone())).unwrap()
}

pub fn create_test_user(conn: &mut Connection, username: &str, is_admin: bool) -> QueryResult<User> {
    let email = format!("{username}@example.com");
    let new_user = NewUser {
        username,
        email: &email,
        password_hash: &TEST_HASH,
        is_admin,
        created_at: DateTime::now(),
    };
    diesel::insert_into(user::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn create_test_artwork(
    conn: &mut Connection,
    creator: &User,
    title: &str,
    is_public: bool,
    created_at: DateTime,
) -> QueryResult<Artwork> {
    let new_artwork = NewArtwork {
        title,
        prompt: "a test prompt",
        negative_prompt: None,
        image_path: "data/images/art_00000000.png",
        image_url: "/static/images/art_00000000.png",
        guidance_scale: 7.5,
        width: 512,
        height: 512,
        is_public,
        is_featured: false,
        created_at,
        creator_id: creator.id,
    };
    diesel::insert_into(artwork::table)
        .values(&new_artwork)
        .returning(Artwork::as_returning())
        .get_result(conn)
}

/// Value of an `Authorization` header carrying a fresh token for `user`.
pub fn bearer_for(state: &AppState, user: &User) -> String {
    let token = token::create_access_token(&state.config, user.id, &user.username).unwrap();
    format!("Bearer {token}")
}

/// Encodes an incompressible PNG, so its size stays above the minimum response size.
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x2545_F491;
    let image = RgbImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 24) as u8
        };
        image::Rgb([channel(), channel(), channel()])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serves `router` on an ephemeral local port. Stands in for external image providers.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    address
}
