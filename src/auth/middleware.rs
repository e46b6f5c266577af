use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::extractors::CurrentUser;
use crate::auth::token::verify_token;
use crate::error::AppError;

/// The auth gate: extracts the bearer token, verifies it, then re-fetches the
/// user by the decoded id so that the identity context reflects the current
/// stored record rather than the token claims. Exactly one store read per
/// gated request; nothing is cached.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    // Rc because the user lookup is async and the service must move into the future.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Skip authentication for health check and login
            let path = req.path();
            if path == "/health" || path.starts_with("/api/auth/login") {
                return service.call(req).await;
            }

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned);

            let token = match token {
                Some(token) => token,
                None => return Err(AppError::Unauthorized("No token provided".into()).into()),
            };

            let claims = verify_token(&token)?;

            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("Database pool not configured".into())
                })?;

            // Look the user up fresh so a deleted or role-changed account is
            // re-validated against current state, not the token payload.
            let user = sqlx::query_as::<_, CurrentUser>(
                "SELECT id, email, role FROM users WHERE id = $1",
            )
            .bind(claims.sub)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(AppError::from)?;

            match user {
                Some(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                None => Err(AppError::Unauthorized("User not found".into()).into()),
            }
        })
    }
}
