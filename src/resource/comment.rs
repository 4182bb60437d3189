use crate::model::comment::Comment;
use crate::resource;
use crate::schema::user;
use crate::string::SmallString;
use crate::time::DateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentInfo {
    pub id: i32,
    pub content: String,
    /// Name of the commenting user.
    #[schema(value_type = String)]
    pub username: SmallString,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

impl CommentInfo {
    pub fn new(conn: &mut SqliteConnection, comment: Comment) -> QueryResult<Self> {
        Self::new_batch(conn, vec![comment]).and_then(resource::single)
    }

    pub fn new_batch(conn: &mut SqliteConnection, comments: Vec<Comment>) -> QueryResult<Vec<Self>> {
        let user_ids: Vec<i32> = comments.iter().map(|comment| comment.user_id).collect();
        let usernames = user::table
            .select((user::id, user::username))
            .filter(user::id.eq_any(&user_ids))
            .load::<(i32, SmallString)>(conn)
            .map(|names| resource::collect_like(&comments, names, |comment| comment.user_id))?;

        let results = comments
            .into_iter()
            .zip(usernames)
            .map(|(comment, username)| Self {
                id: comment.id,
                content: comment.content,
                username,
                created_at: comment.created_at,
            })
            .collect();
        Ok(results)
    }
}
