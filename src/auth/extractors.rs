use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// The authenticated identity context attached to each gated request.
///
/// `AuthMiddleware` builds this from a fresh store read (not from the token
/// claims) and inserts it into request extensions; handlers receive it
/// through this extractor. It is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl FromRequest for CurrentUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                // Reached only if a handler using this extractor is mounted
                // outside the auth gate. Responding with Unauthorized is the
                // safe default.
                let err = AppError::Unauthorized(
                    "User identity not found in request. Ensure AuthMiddleware is active."
                        .to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
