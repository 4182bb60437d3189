use crate::auth::header::AuthenticationError;
use crate::config::RegexType;
use crate::error::ErrorKind;
use crate::model::enums::{ResourceProperty, ResourceType};
use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use diesel::QueryResult;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

/// Giant error enum of doom
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub enum ApiError {
    #[error("{0} already exists")]
    AlreadyExists(ResourceProperty),
    BlockingTask(#[from] tokio::task::JoinError),
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Given {0} is invalid")]
    ExpressionFailsRegex(RegexType),
    FailedAuthentication(#[from] AuthenticationError),
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    FormRejection(#[from] axum::extract::rejection::FormRejection),
    HeaderDeserialization(#[from] axum::http::header::ToStrError),
    Image(#[from] image::ImageError),
    #[error("Insufficient privileges")]
    InsufficientPrivileges,
    #[error("Image dimensions must be between {min} and {max} pixels")]
    InvalidDimensions { min: u32, max: u32 },
    #[error("Invalid file name")]
    InvalidFileName,
    #[error("Page must have a non-negative offset and between 1 and {0} entries")]
    InvalidPage(i64),
    JsonRejection(#[from] axum::extract::rejection::JsonRejection),
    JsonSerialization(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(ResourceType),
    #[error("Could not validate credentials")]
    NotLoggedIn,
    Password(#[from] argon2::password_hash::Error),
    PathRejection(#[from] axum::extract::rejection::PathRejection),
    QueryRejection(#[from] axum::extract::rejection::QueryRejection),
    StdIo(#[from] std::io::Error),
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Request body must be JSON or a url-encoded form")]
    UnsupportedContentType,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        use serde_json::error::Category;
        type QueryError = diesel::result::Error;

        let query_error_status_code = |err: &QueryError| match err {
            QueryError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            Self::FormRejection(err) => err.status(),
            Self::JsonRejection(err) => err.status(),
            Self::PathRejection(err) => err.status(),
            Self::QueryRejection(err) => err.status(),
            Self::AlreadyExists(_)
            | Self::EmptyField(_)
            | Self::ExpressionFailsRegex(_)
            | Self::HeaderDeserialization(_)
            | Self::InvalidDimensions { .. }
            | Self::InvalidFileName => StatusCode::BAD_REQUEST,
            Self::InvalidPage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::InsufficientPrivileges => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BlockingTask(_) | Self::Image(_) | Self::Password(_) | Self::StdIo(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::FailedConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::FailedAuthentication(err) => match err {
                AuthenticationError::FailedConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
                AuthenticationError::FailedQuery(err) => query_error_status_code(err),
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::JsonSerialization(err) => match err.classify() {
                Category::Io | Category::Eof => StatusCode::INTERNAL_SERVER_ERROR,
                Category::Syntax | Category::Data => StatusCode::BAD_REQUEST,
            },
            Self::FailedQuery(err) => query_error_status_code(err),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "Already Exists",
            Self::BlockingTask(_) => "Blocking Task Error",
            Self::EmptyField(_) => "Empty Field",
            Self::ExpressionFailsRegex(_) => "Expression Fails Regex",
            Self::FailedAuthentication(_) => "Failed Authentication",
            Self::FailedConnection(_) => "Failed Connection",
            Self::FailedQuery(_) => "Failed Query",
            Self::FormRejection(_) => "Form Rejection",
            Self::HeaderDeserialization(_) => "Header Deserialization",
            Self::Image(_) => "Image Error",
            Self::InsufficientPrivileges => "Insufficient Privileges",
            Self::InvalidDimensions { .. } => "Invalid Dimensions",
            Self::InvalidFileName => "Invalid File Name",
            Self::InvalidPage(_) => "Invalid Page",
            Self::JsonRejection(_) => "JSON Rejection",
            Self::JsonSerialization(_) => "JSON Serialization Error",
            Self::NotFound(_) => "Resource Not Found",
            Self::NotLoggedIn => "Not Logged In",
            Self::Password(_) => "Password Error",
            Self::PathRejection(_) => "Path Rejection",
            Self::QueryRejection(_) => "Query Rejection",
            Self::StdIo(_) => "IO Error",
            Self::Token(_) => "Token Error",
            Self::UnsupportedContentType => "Unsupported Content Type",
        }
    }

    fn response(&self) -> ErrorResponse {
        ErrorResponse {
            name: self.kind(),
            title: self.category(),
            description: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {self}", self.kind());
        } else if status == StatusCode::UNAUTHORIZED {
            warn!("{}: {self}", self.kind());
        }

        let mut response = (status, Json(self.response())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub fn map_unique_violation<T>(result: QueryResult<T>, property: ResourceProperty) -> ApiResult<T> {
    use diesel::result::DatabaseErrorKind;
    use diesel::result::Error as DeiselError;

    match result {
        Ok(value) => Ok(value),
        Err(DeiselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Err(ApiError::AlreadyExists(property))
        }
        Err(err) => Err(err.into()),
    }
}

/// Represents a response if an error occured.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable category of the error.
    title: &'static str,
    /// Stable identifier of the error kind.
    name: &'static str,
    description: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::NotLoggedIn.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound(ResourceType::Artwork).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AlreadyExists(ResourceProperty::UserName).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::FailedAuthentication(AuthenticationError::UsernamePasswordMismatch).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::FailedQuery(diesel::result::Error::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unauthorized_responses_ask_for_bearer() {
        let response = ApiError::NotLoggedIn.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = ApiError::InsufficientPrivileges.into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn descriptions() {
        assert_eq!(ApiError::AlreadyExists(ResourceProperty::UserEmail).to_string(), "Email already exists");
        assert_eq!(ApiError::ExpressionFailsRegex(RegexType::Username).to_string(), "Given username is invalid");
        assert_eq!(
            ApiError::InvalidDimensions { min: 64, max: 2048 }.to_string(),
            "Image dimensions must be between 64 and 2048 pixels"
        );
    }

    #[test]
    fn invalid_page() {
        let err = ApiError::InvalidPage(100);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let response = err.response();
        assert_eq!(response.title, "Invalid Page");
        assert_eq!(response.name, "InvalidPage");
    }
}
