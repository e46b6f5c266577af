use crate::{
    auth::{
        generate_token, hash_password, policy, verify_password, AuthResponse, CurrentUser,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{user::UserCredentials, User, UserSummary},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Login
///
/// Checks the credentials against the store and returns a 7-day bearer token
/// together with a non-sensitive user summary. Unknown email and wrong
/// password are both reported as 400, not 401.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    let user = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, name, email, password_hash, role FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::BadRequest("Invalid email".into())),
    };

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid password".into()));
    }

    let token = generate_token(user.id, &user.name, &user.email, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
    }))
}

/// The canonical user-creation operation shared by the register and
/// create-user entry points: duplicate-email check, bcrypt hash, insert.
async fn create_user_record(pool: &PgPool, data: &RegisterRequest) -> Result<(), AppError> {
    let existing = sqlx::query_as::<_, (uuid::Uuid,)>("SELECT id FROM users WHERE email = $1")
        .bind(&data.email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&data.password)?;

    sqlx::query("INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4)")
        .bind(&data.name)
        .bind(&data.email)
        .bind(&password_hash)
        .bind(data.role)
        .execute(pool)
        .await?;

    Ok(())
}

/// Register a new user (admin only)
///
/// Creates an account for someone else. The response carries no token; the
/// new user must log in separately.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    policy::require(&caller, policy::Capability::ManageUsers)?;
    register_data.validate()?;

    create_user_record(&pool, &register_data).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully"
    })))
}

/// Create a user (admin only)
///
/// Second entry point with the same contract as `register`; both delegate to
/// the same canonical creation operation.
#[post("/create-user")]
pub async fn create_user(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    policy::require(&caller, policy::Capability::ManageUsers)?;
    register_data.validate()?;

    create_user_record(&pool, &register_data).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully"
    })))
}

/// Profile
///
/// Returns the caller's current user record, without the password hash.
#[get("/profile")]
pub async fn profile(
    pool: web::Data<PgPool>,
    caller: CurrentUser,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, created_at FROM users WHERE id = $1",
    )
    .bind(caller.id)
    .fetch_one(&**pool)
    .await
    .map_err(|e| {
        log::error!("Error fetching profile: {}", e);
        AppError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool lets these tests exercise the paths that fail before any
    // store access, without a live database.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/taskboard_test")
            .expect("lazy pool")
    }

    #[actix_rt::test]
    async fn test_login_payload_validation() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(login),
        )
        .await;

        // Invalid email format is rejected before the store is consulted.
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
        );

        // Short password likewise.
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({
                "email": "test@example.com",
                "password": "123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
        );

        // Missing fields fail JSON deserialization.
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": "test@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_register_without_identity_is_unauthorized() {
        // Mounted without the auth gate, the CurrentUser extractor must fail
        // closed rather than letting the creation through.
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(register),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "name": "New User",
                "email": "new@example.com",
                "password": "password123",
                "role": "user"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
