use crate::schema::user;
use crate::string::SmallString;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = user)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
    pub created_at: DateTime,
}

#[derive(Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = user)]
#[diesel(check_for_backend(Sqlite))]
pub struct User {
    pub id: i32,
    pub username: SmallString,
    pub email: SmallString,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime,
}
