use crate::model::user::User;
use crate::string::SmallString;
use serde::Serialize;
use utoipa::ToSchema;

/// Public view of a user. Never contains the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    #[schema(value_type = String)]
    pub username: SmallString,
    #[schema(value_type = String)]
    pub email: SmallString,
    pub is_admin: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}
