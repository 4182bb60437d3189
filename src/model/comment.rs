use crate::model::artwork::Artwork;
use crate::model::user::User;
use crate::schema::comment;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = comment)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewComment<'a> {
    pub content: &'a str,
    pub user_id: i32,
    pub artwork_id: i32,
    pub created_at: DateTime,
}

#[derive(Debug, Associations, Identifiable, Queryable, Selectable)]
#[diesel(belongs_to(Artwork))]
#[diesel(belongs_to(User))]
#[diesel(table_name = comment)]
#[diesel(check_for_backend(Sqlite))]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub artwork_id: i32,
    pub created_at: DateTime,
}
