use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};

pub trait ErrorKind {
    fn kind(&self) -> &'static str;
}

impl ErrorKind for argon2::password_hash::errors::B64Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEncoding => "InvalidEncoding",
            Self::InvalidLength => "InvalidLength",
        }
    }
}

impl ErrorKind for argon2::password_hash::errors::InvalidValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidChar(_) => "InvalidChar",
            Self::InvalidFormat => "InvalidFormat",
            Self::Malformed => "MalformedValue",
            Self::TooLong => "ValueTooLong",
            Self::TooShort => "ValueTooShort",
            _ => "UnknownArgonInvalidValue",
        }
    }
}

impl ErrorKind for argon2::password_hash::Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::Algorithm => "UnsupportedAlgorithm",
            Self::B64Encoding(err) => err.kind(),
            Self::Crypto => "CryptoError",
            Self::OutputSize { .. } => "UnexpectedOutputSize",
            Self::ParamNameDuplicated => "ParamNameDuplicated",
            Self::ParamNameInvalid => "ParamNameInvalid",
            Self::ParamValueInvalid(err) => err.kind(),
            Self::ParamsMaxExceeded => "ParamsMaxExceeded",
            Self::Password => "InvalidPassword",
            Self::PhcStringField => "InvalidPhcStringField",
            Self::PhcStringTrailingData => "PhcStringTrailingData",
            Self::SaltInvalid(err) => err.kind(),
            Self::Version => "InvalidVersion",
            _ => "UnknownArgonError",
        }
    }
}

impl ErrorKind for diesel::result::DatabaseErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::CheckViolation => "CheckViolation",
            Self::ClosedConnection => "ClosedConnection",
            Self::ForeignKeyViolation => "ForeignKeyViolation",
            Self::NotNullViolation => "NotNullViolation",
            Self::ReadOnlyTransaction => "ReadOnlyTransaction",
            Self::SerializationFailure => "SerializationFailure",
            Self::UnableToSendCommand => "UnableToSendCommand",
            Self::UniqueViolation => "UniqueViolation",
            _ => "UnknownDatabaseError",
        }
    }
}

impl ErrorKind for diesel::result::Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInTransaction => "AlreadyInTransaction",
            Self::BrokenTransactionManager => "BrokenTransactionManager",
            Self::DatabaseError(err, _) => err.kind(),
            Self::DeserializationError(_) => "DeserializationError",
            Self::InvalidCString(_) => "InvalidCString",
            Self::NotFound => "NotFound",
            Self::NotInTransaction => "NotInTransaction",
            Self::QueryBuilderError(_) => "QueryBuilderError",
            Self::RollbackErrorOnCommit { rollback_error, .. } => rollback_error.kind(),
            Self::RollbackTransaction => "RollbackTransaction",
            Self::SerializationError(_) => "SerializationError",
            _ => "UnknownQueryError",
        }
    }
}

impl ErrorKind for diesel::r2d2::PoolError {
    fn kind(&self) -> &'static str {
        "FailedConnection"
    }
}

impl ErrorKind for base64::DecodeError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidByte(..) => "InvalidByte",
            Self::InvalidLastSymbol(..) => "InvalidLastSymbol",
            Self::InvalidLength(_) => "InvalidLength",
            Self::InvalidPadding => "InvalidPadding",
        }
    }
}

impl ErrorKind for jsonwebtoken::errors::Error {
    fn kind(&self) -> &'static str {
        use jsonwebtoken::errors::ErrorKind as TokenErrorKind;

        match self.kind() {
            TokenErrorKind::ExpiredSignature => "ExpiredToken",
            TokenErrorKind::ImmatureSignature => "ImmatureToken",
            TokenErrorKind::InvalidAlgorithm => "InvalidTokenAlgorithm",
            TokenErrorKind::InvalidSignature => "InvalidTokenSignature",
            TokenErrorKind::InvalidToken => "MalformedToken",
            TokenErrorKind::MissingRequiredClaim(_) => "MissingTokenClaim",
            _ => "UnknownTokenError",
        }
    }
}

impl ErrorKind for crate::auth::header::AuthenticationError {
    fn kind(&self) -> &'static str {
        match self {
            Self::FailedConnection(err) => err.kind(),
            Self::FailedQuery(err) => err.kind(),
            Self::InvalidAuthType => "InvalidAuthType",
            Self::InvalidEncoding(err) => err.kind(),
            Self::InvalidToken(err) => ErrorKind::kind(err),
            Self::MalformedCredentials => "MalformedCredentials",
            Self::UnknownTokenOwner => "UnknownTokenOwner",
            Self::UsernamePasswordMismatch => "UsernamePasswordMismatch",
            Self::Utf8Conversion(_) => "Utf8ConversionError",
        }
    }
}

impl ErrorKind for image::error::LimitErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::DimensionError => "DimensionLimitsExceeded",
            Self::InsufficientMemory => "OutOfMemory",
            Self::Unsupported { .. } => "UnsupportedImageDimensions",
            _ => "UnknownImageLimitError",
        }
    }
}

impl ErrorKind for image::error::ParameterErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::DimensionMismatch => "DimensionMismatch",
            Self::FailedAlready => "FailedAlready",
            Self::Generic(_) => "GenericError",
            Self::NoMoreData => "NoMoreData",
            _ => "UnknownImageParameterError",
        }
    }
}

impl ErrorKind for image::error::UnsupportedErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::Color(_) => "UnsupportedColor",
            Self::Format(_) => "UnsupportedFormat",
            Self::GenericFeature(_) => "UnsupportedFeature",
            _ => "UnknownImageUnsupportedError",
        }
    }
}

impl ErrorKind for image::ImageError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Decoding(_) => "FailedDecoding",
            Self::Encoding(_) => "FailedEncoding",
            Self::IoError(_) => "IOError",
            Self::Limits(err) => err.kind().kind(),
            Self::Parameter(err) => err.kind().kind(),
            Self::Unsupported(err) => err.kind().kind(),
        }
    }
}

impl ErrorKind for FormRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormContentType(_) => "InvalidFormContentType",
            Self::FailedToDeserializeForm(_) => "FailedToDeserializeForm",
            Self::FailedToDeserializeFormBody(_) => "FailedToDeserializeFormBody",
            Self::BytesRejection(_) => "BytesRejection",
            _ => "UnknownFormRejection",
        }
    }
}

impl ErrorKind for JsonRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::JsonDataError(_) => "JsonDataError",
            Self::JsonSyntaxError(_) => "JsonSyntaxError",
            Self::MissingJsonContentType(_) => "MissingJsonContentType",
            Self::BytesRejection(_) => "BytesRejection",
            _ => "UnknownJsonRejection",
        }
    }
}

impl ErrorKind for PathRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::FailedToDeserializePathParams(_) => "FailedToDeserializePathParams",
            Self::MissingPathParams(_) => "MissingPathParams",
            _ => "UnknownPathRejection",
        }
    }
}

impl ErrorKind for QueryRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::FailedToDeserializeQueryString(_) => "FailedToDeserializeQueryString",
            _ => "UnknownQueryRejection",
        }
    }
}

impl ErrorKind for crate::api::error::ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::BlockingTask(_) => "BlockingTaskError",
            Self::EmptyField(_) => "EmptyField",
            Self::ExpressionFailsRegex(_) => "ExpressionFailsRegex",
            Self::FailedAuthentication(err) => err.kind(),
            Self::FailedConnection(err) => err.kind(),
            Self::FailedQuery(err) => err.kind(),
            Self::FormRejection(err) => err.kind(),
            Self::HeaderDeserialization(_) => "HeaderDeserialization",
            Self::Image(err) => err.kind(),
            Self::InsufficientPrivileges => "InsufficientPrivileges",
            Self::InvalidDimensions { .. } => "InvalidDimensions",
            Self::InvalidFileName => "InvalidFileName",
            Self::InvalidPage(_) => "InvalidPage",
            Self::JsonRejection(err) => err.kind(),
            Self::JsonSerialization(_) => "JsonSerializationError",
            Self::NotFound(_) => "NotFound",
            Self::NotLoggedIn => "NotLoggedIn",
            Self::Password(err) => err.kind(),
            Self::PathRejection(err) => err.kind(),
            Self::QueryRejection(err) => err.kind(),
            Self::StdIo(_) => "IOError",
            Self::Token(err) => ErrorKind::kind(err),
            Self::UnsupportedContentType => "UnsupportedContentType",
        }
    }
}
