//! Identity extraction and role guards.
//!
//! Session and cookie handling live outside this process: a fronting layer
//! authenticates the user and forwards the result in the headers named by
//! [`AuthSettings`]. The guards here only read that externally supplied
//! identity — `authenticate` rejects anonymous requests, `require_admin`
//! gates mutating routes, and handlers can take [`Identity`] as an
//! extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use libris_http::AppError;
use libris_kernel::settings::AuthSettings;

/// Caller role as forwarded by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Parse a forwarded role header. `user` is accepted as a legacy
    /// spelling of `member`; anything else is rejected upstream.
    fn from_header(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "member" | "user" => Some(Role::Member),
            _ => None,
        }
    }
}

/// The authenticated caller, as established by the external session layer.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("login required"))
    }
}

/// Middleware: read the forwarded identity headers and stash an [`Identity`]
/// in the request extensions. Requests without a username are rejected with
/// 401; a role header that parses to nothing is treated the same, since it
/// means the fronting layer is misconfigured rather than the caller being a
/// member.
pub async fn authenticate(
    State(auth): State<AuthSettings>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();

    let username = headers
        .get(auth.user_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let Some(username) = username else {
        return Err(AppError::unauthorized("login required"));
    };

    let role = match headers.get(auth.role_header.as_str()) {
        None => Role::Member,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(Role::from_header)
            .ok_or_else(|| AppError::unauthorized("unrecognized role"))?,
    };

    tracing::debug!(user = %username, role = ?role, "request authenticated");
    request.extensions_mut().insert(Identity { username, role });
    Ok(next.run(request).await)
}

/// Route layer: only admins pass. Must sit inside `authenticate` so the
/// identity is already in the extensions.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.is_admin() => Ok(next.run(request).await),
        Some(identity) => {
            tracing::debug!(user = %identity.username, "admin route refused");
            Err(AppError::forbidden("administrator role required"))
        }
        None => Err(AppError::unauthorized("login required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn whoami(identity: Identity) -> String {
        identity.username
    }

    fn guarded_router() -> Router {
        let admin = Router::new()
            .route("/admin", get(|| async { "admin only" }))
            .route_layer(middleware::from_fn(require_admin));

        Router::new()
            .route("/whoami", get(whoami))
            .merge(admin)
            .layer(middleware::from_fn_with_state(
                AuthSettings::default(),
                authenticate,
            ))
    }

    async fn status_for(request: HttpRequest<Body>) -> StatusCode {
        guarded_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn anonymous_requests_are_unauthorized() {
        let request = HttpRequest::get("/whoami").body(Body::empty()).unwrap();
        assert_eq!(status_for(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forwarded_identity_reaches_the_handler() {
        let request = HttpRequest::get("/whoami")
            .header("x-libris-user", "casey")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_for(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn members_cannot_reach_admin_routes() {
        let request = HttpRequest::get("/admin")
            .header("x-libris-user", "casey")
            .header("x-libris-role", "member")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_for(request).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admins_pass_the_admin_gate() {
        let request = HttpRequest::get("/admin")
            .header("x-libris-user", "robin")
            .header("x-libris-role", "admin")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_for(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_roles_are_rejected() {
        let request = HttpRequest::get("/whoami")
            .header("x-libris-user", "casey")
            .header("x-libris-role", "superuser")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_for(request).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn legacy_user_role_maps_to_member() {
        assert_eq!(Role::from_header("user"), Some(Role::Member));
        assert_eq!(Role::from_header("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_header("root"), None);
    }
}
