pub mod artwork;
pub mod comment;
pub mod enums;
pub mod user;
