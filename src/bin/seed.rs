//! One-time seeding binary: creates the initial admin and a regular user so
//! that the admin-only registration endpoints can be bootstrapped.

use sqlx::PgPool;

use taskboard::auth::hash_password;
use taskboard::models::Role;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    // Only the store is needed here, so the full server config is not loaded.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if let Err(e) = seed_users(&pool).await {
        log::error!("Error seeding users: {}", e);
        std::process::exit(1);
    }

    log::info!("Users seeded successfully");
}

async fn seed_users(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    // Clear existing users so the seed is repeatable.
    sqlx::query("DELETE FROM users").execute(pool).await?;

    let password_hash = hash_password("admin123").map_err(|e| e.to_string())?;

    let users = [
        ("Admin User", "admin@example.com", Role::Admin),
        ("Regular User", "user@example.com", Role::User),
    ];

    for (name, email, role) in users {
        sqlx::query("INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4)")
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .bind(role)
            .execute(pool)
            .await?;
    }

    Ok(())
}
