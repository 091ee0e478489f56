//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 specification for the Passgate ceremony API.

use utoipa::OpenApi;

use crate::handlers::{HealthResponse, ReadyResponse};
use crate::webauthn::{
    AuthenticationSummary, RegistrationSummary, StartAuthenticationRequest, StartRegistrationRequest,
};

/// Passgate API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Passgate - WebAuthn Ceremony API",
        version = "0.1.0",
        description = r#"
## WebAuthn Relying Party ceremony verification

Passgate issues registration and authentication challenges and checks the
browser's response before any credential is trusted:

- **Challenges** - 32 random bytes from the OS CSPRNG, single use
- **Sessions** - bound to one user, removed before verification
- **Client data** - ceremony type, challenge (constant time), origin, token binding
- **Responses** - structural parsing of authenticator data and attestation objects

### Flow

1. `POST /webauthn/login/start` returns `session_id` and the options for `navigator.credentials.get`
2. Send the browser's `PublicKeyCredential` JSON to `POST /webauthn/login/finish`
   with the `x-passgate-session` header
3. A session id works once; any failure requires a new ceremony

Signatures and attestation statements are left to an external verifier
(`signature_verified` / `attestation_verified` are always false).
"#,
        license(
            name = "MIT OR Apache-2.0",
            url = "https://github.com/passgate/passgate/blob/main/LICENSE"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "WebAuthn", description = "Registration and authentication ceremonies"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::webauthn::handlers::start_registration,
        crate::webauthn::handlers::finish_registration,
        crate::webauthn::handlers::start_authentication,
        crate::webauthn::handlers::finish_authentication,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            StartRegistrationRequest,
            StartAuthenticationRequest,
            RegistrationSummary,
            AuthenticationSummary,
        )
    )
)]
pub struct ApiDoc;
