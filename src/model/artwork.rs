use crate::model::user::User;
use crate::schema::{artwork, artwork_like};
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;
pub const DEFAULT_DIMENSION: u32 = 512;

#[derive(Insertable)]
#[diesel(table_name = artwork)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewArtwork<'a> {
    pub title: &'a str,
    pub prompt: &'a str,
    pub negative_prompt: Option<&'a str>,
    pub image_path: &'a str,
    pub image_url: &'a str,
    pub guidance_scale: f64,
    pub width: i32,
    pub height: i32,
    pub is_public: bool,
    pub is_featured: bool,
    pub created_at: DateTime,
    pub creator_id: i32,
}

#[derive(Debug, Clone, Associations, Identifiable, Queryable, Selectable)]
#[diesel(belongs_to(User, foreign_key = creator_id))]
#[diesel(table_name = artwork)]
#[diesel(check_for_backend(Sqlite))]
pub struct Artwork {
    pub id: i32,
    pub title: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub image_path: String,
    pub image_url: String,
    pub guidance_scale: f64,
    pub width: i32,
    pub height: i32,
    pub is_public: bool,
    pub is_featured: bool,
    pub created_at: DateTime,
    pub creator_id: i32,
}

impl Artwork {
    /// Private artworks are only visible to their creator and administrators.
    pub fn visible_to(&self, client_id: Option<i32>, client_is_admin: bool) -> bool {
        self.is_public || client_is_admin || client_id == Some(self.creator_id)
    }
}

#[derive(Insertable)]
#[diesel(table_name = artwork_like)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewArtworkLike {
    pub user_id: i32,
    pub artwork_id: i32,
    pub created_at: DateTime,
}

#[derive(Debug, Associations, Identifiable, Queryable, Selectable)]
#[diesel(belongs_to(Artwork))]
#[diesel(belongs_to(User))]
#[diesel(table_name = artwork_like)]
#[diesel(check_for_backend(Sqlite))]
pub struct ArtworkLike {
    pub id: i32,
    pub user_id: i32,
    pub artwork_id: i32,
    pub created_at: DateTime,
}
