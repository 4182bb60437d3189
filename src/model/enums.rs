use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResourceType {
    Artwork,
    Image,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResourceProperty {
    #[strum(serialize = "Email")]
    UserEmail,
    #[strum(serialize = "Username")]
    UserName,
}
