use crate::model::artwork::Artwork;
use crate::resource;
use crate::schema::{artwork_like, comment, user};
use crate::string::SmallString;
use crate::time::DateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtworkInfo {
    pub id: i32,
    pub title: String,
    pub prompt: String,
    pub image_url: String,
    #[schema(value_type = String)]
    pub creator_username: SmallString,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_featured: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

impl ArtworkInfo {
    pub fn new(conn: &mut SqliteConnection, artwork: Artwork) -> QueryResult<Self> {
        Self::new_batch(conn, vec![artwork]).and_then(resource::single)
    }

    /// Builds responses for a list of `artworks`, preserving their order.
    /// Creator names and counts are retrieved with one query each, regardless of batch size.
    pub fn new_batch(conn: &mut SqliteConnection, artworks: Vec<Artwork>) -> QueryResult<Vec<Self>> {
        let creator_names = get_creator_names(conn, &artworks)?;
        let likes_counts = get_likes_counts(conn, &artworks)?;
        let comments_counts = get_comments_counts(conn, &artworks)?;

        let results = artworks
            .into_iter()
            .zip(creator_names)
            .zip(likes_counts.into_iter().zip(comments_counts))
            .map(|((artwork, creator_username), (likes_count, comments_count))| Self {
                id: artwork.id,
                title: artwork.title,
                prompt: artwork.prompt,
                image_url: artwork.image_url,
                creator_username,
                likes_count,
                comments_count,
                is_featured: artwork.is_featured,
                created_at: artwork.created_at,
            })
            .collect();
        Ok(results)
    }
}

fn get_creator_names(conn: &mut SqliteConnection, artworks: &[Artwork]) -> QueryResult<Vec<SmallString>> {
    let creator_ids: Vec<i32> = artworks.iter().map(|artwork| artwork.creator_id).collect();
    user::table
        .select((user::id, user::username))
        .filter(user::id.eq_any(&creator_ids))
        .load::<(i32, SmallString)>(conn)
        .map(|names| resource::collect_like(artworks, names, |artwork| artwork.creator_id))
}

fn get_likes_counts(conn: &mut SqliteConnection, artworks: &[Artwork]) -> QueryResult<Vec<i64>> {
    let artwork_ids: Vec<i32> = artworks.iter().map(|artwork| artwork.id).collect();
    artwork_like::table
        .filter(artwork_like::artwork_id.eq_any(&artwork_ids))
        .group_by(artwork_like::artwork_id)
        .select((artwork_like::artwork_id, count_star()))
        .load::<(i32, i64)>(conn)
        .map(|counts| resource::collect_like(artworks, counts, |artwork| artwork.id))
}

fn get_comments_counts(conn: &mut SqliteConnection, artworks: &[Artwork]) -> QueryResult<Vec<i64>> {
    let artwork_ids: Vec<i32> = artworks.iter().map(|artwork| artwork.id).collect();
    comment::table
        .filter(comment::artwork_id.eq_any(&artwork_ids))
        .group_by(comment::artwork_id)
        .select((comment::artwork_id, count_star()))
        .load::<(i32, i64)>(conn)
        .map(|counts| resource::collect_like(artworks, counts, |artwork| artwork.id))
}
