/// Bearer token authentication.
///
/// The middleware decodes `Authorization: Bearer <jwt>` when present and
/// stores the caller in request extensions. Requests without the header pass
/// through untouched so public and protected routes can share a path; handlers
/// that need a caller take [`AuthUser`], which rejects anonymous requests.
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;
use crate::security::jwt;

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // Copy the header out before touching extensions_mut.
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().map(str::to_owned));

            if let Some(header) = header {
                let header = header
                    .map_err(|_| AppError::Authentication("Invalid Authorization header".into()))?;
                let user = authenticate(&header)?;
                req.extensions_mut().insert(user);
            }

            service.call(req).await
        })
    }
}

fn authenticate(header: &str) -> Result<AuthUser, AppError> {
    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Authentication("Invalid Authorization scheme, expected Bearer".into())
    })?;

    let data = jwt::validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "token validation failed");
        AppError::Authentication("Invalid or expired token".into())
    })?;

    let id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Authentication("Invalid user ID in token".into()))?;

    Ok(AuthUser {
        id,
        email: data.claims.email,
        role: data.claims.role,
    })
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Authentication(
                "Missing Authorization header".into(),
            )
            .into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_bearer_scheme() {
        let err = authenticate("Basic dXNlcjpwYXNz").unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn test_accepts_valid_token() {
        jwt::initialize_secret("unit-test-secret", 3600).unwrap();
        let id = Uuid::new_v4();
        let token = jwt::generate_token(id, "guest@example.com", Role::User).unwrap();

        let user = authenticate(&format!("Bearer {}", token.access_token)).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
    }
}
