pub mod header;
pub mod password;
pub mod token;

/// The caller of a request, as resolved from its `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    pub id: Option<i32>,
    pub is_admin: bool,
}

impl Client {
    pub const fn new(id: Option<i32>, is_admin: bool) -> Self {
        Self { id, is_admin }
    }

    pub const fn anonymous() -> Self {
        Self::new(None, false)
    }
}
