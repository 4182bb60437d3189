use crate::api::error::ErrorResponse;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, openapi};

pub const ARTWORK_TAG: &str = "Artwork";
pub const AUTH_TAG: &str = "Auth";
pub const COMMENT_TAG: &str = "Comment";
pub const GENERATION_TAG: &str = "Generation";
pub const INFO_TAG: &str = "Info";

#[derive(OpenApi)]
#[openapi(
    info(title = "ArtBuddy API", description = "Generate artwork from text prompts and share it."),
    modifiers(&BearerSecurity),
    components(schemas(ErrorResponse)),
    tags(
        (name = ARTWORK_TAG, description = "Artwork API endpoints"),
        (name = AUTH_TAG, description = "Registration and login"),
        (name = COMMENT_TAG, description = "Comment API endpoints"),
        (name = GENERATION_TAG, description = "Anonymous generation and the shared gallery"),
        (name = INFO_TAG, description = "Info API endpoints"),
        (name = "Authentication", description = AUTHENTICATION_DESCRIPTION),
        (name = "Errors", description = ERROR_DESCRIPTION),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        components.add_security_scheme("basic", SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)));
    }
}

const AUTHENTICATION_DESCRIPTION: &str = r#"
Protected endpoints expect an `Authorization` header. Obtain a token from
`/auth/register` or `/auth/login` and send it as

```
Authorization: Bearer <access_token>
```

Tokens expire after the lifetime configured on the server. Alternatively,
requests may authenticate with [basic HTTP
auth](https://en.wikipedia.org/wiki/Basic_access_authentication). Since this
sends the password with every request, it is recommended to connect through
HTTPS. There are no sessions.

Requests without an `Authorization` header are anonymous. A header that is
present but invalid is rejected with `401 Unauthorized`.
"#;

const ERROR_DESCRIPTION: &str = r#"
All errors (except for unhandled fatal server errors) send a JSON response
with a non-2xx status code and the following body:

```json5
{
    "name": "Name of the error, e.g. 'NotLoggedIn'",
    "title": "Generic title of error message, e.g. 'Not Logged In'",
    "description": "Detailed description of what went wrong"
}
```

Responses with status `401` also carry a `WWW-Authenticate: Bearer` header.
"#;
