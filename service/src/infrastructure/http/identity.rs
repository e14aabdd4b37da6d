use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    context::{Actor, RequestContext, Role},
    course::UserId,
};
use crate::infrastructure::http::api::ApiError;

/// Per-request settings read by the [`Caller`] extractor, installed as a
/// request extension by the server.
#[derive(Debug, Clone)]
pub struct CallerConfig {
    user_header: String,
    role_header: String,
    timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
            role_header: "x-user-role".to_string(),
            timeout: None,
            shutdown: CancellationToken::new(),
        }
    }
}

impl CallerConfig {
    pub fn new(user_header: &str, role_header: &str) -> Self {
        Self {
            user_header: user_header.to_ascii_lowercase(),
            role_header: role_header.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// In-flight requests are cancelled when this token fires.
    pub fn shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Identity and cancellation scope of the request being served.
///
/// The user id and role come from trusted headers set by the gateway in
/// front of the service. No user header means an anonymous caller; a
/// missing role header means a student.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<CallerConfig>()
            .cloned()
            .unwrap_or_default();

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let actor = match header(config.user_header.as_str()) {
            Some(user_id) => {
                let role = match header(config.role_header.as_str()) {
                    Some(role) => role
                        .parse::<Role>()
                        .map_err(|e| ApiError::Unauthorized(e.to_string()))?,
                    None => Role::Student,
                };
                Some(Actor::new(UserId::new(user_id), role))
            }
            None => None,
        };

        let mut ctx = RequestContext::anonymous()
            .with_actor(actor)
            .with_cancellation(config.shutdown.child_token());
        if let Some(timeout) = config.timeout {
            ctx = ctx.with_timeout(timeout);
        }
        Ok(Caller(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{error::CourseError, repository::RepositoryError};
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn caller_without_user_header_is_anonymous() {
        let Caller(ctx) = extract(Request::new(())).await.unwrap();
        assert!(ctx.actor().is_none());
    }

    #[tokio::test]
    async fn role_defaults_to_student() {
        let request = Request::builder()
            .header("x-user-id", "user-7")
            .body(())
            .unwrap();

        let Caller(ctx) = extract(request).await.unwrap();
        let actor = ctx.actor().unwrap();
        assert_eq!(actor.user_id.as_str(), "user-7");
        assert_eq!(actor.role, Role::Student);
    }

    #[tokio::test]
    async fn configured_header_names_are_used() {
        let mut request = Request::builder()
            .header("X-Forwarded-User", "author-1")
            .header("X-Forwarded-Role", "Instructor")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(CallerConfig::new("X-Forwarded-User", "X-Forwarded-Role"));

        let Caller(ctx) = extract(request).await.unwrap();
        assert_eq!(ctx.actor().unwrap().role, Role::Instructor);
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let request = Request::builder()
            .header("x-user-id", "user-7")
            .header("x-user-role", "superuser")
            .body(())
            .unwrap();

        let error = extract(request).await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn shutdown_cancels_the_request_scope() {
        let shutdown = CancellationToken::new();
        let mut request = Request::new(());
        request
            .extensions_mut()
            .insert(CallerConfig::default().shutdown(shutdown.clone()));

        let Caller(ctx) = extract(request).await.unwrap();
        shutdown.cancel();
        let result = ctx
            .run("probe", std::future::pending::<Result<(), RepositoryError>>())
            .await;
        assert!(matches!(result, Err(CourseError::Cancelled { .. })));
    }
}
