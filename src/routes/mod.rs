pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::create_user)
            .service(auth::profile),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::all_tasks)
            .service(tasks::stats)
            .service(tasks::my_tasks)
            .service(tasks::assigned_tasks)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
