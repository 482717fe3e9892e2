#[macro_use]
extern crate rocket;

mod auth;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod telemetry;
mod uploads;
#[cfg(test)]
mod test;

use std::path::PathBuf;

use auth::{forbidden, login, logout, process_login, process_register, register, unauthorized};
use db::{clean_expired_sessions, ensure_admin_account};
use rocket::fs::FileServer;
use rocket::{Build, Rocket, tokio};
use routes::{
    admin, admin_create_teacher, admin_delete_teacher, admin_edit_teacher, admin_new_teacher,
    admin_update_teacher, index, index_anonymous, rate_teacher, teacher_detail, teachers,
};
use rocket_dyn_templates::Template;
use sqlx::SqlitePool;
use telemetry::{TelemetryFairing, init_tracing};
use tracing::{error, info};
use uploads::UploadStore;

#[launch]
async fn rocket() -> _ {
    let _ = env::load_environment();
    init_tracing();

    let pool = SqlitePool::connect(&env::database_url())
        .await
        .expect("Failed to connect to SQLite database");

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    ensure_admin_account(&pool)
        .await
        .expect("Failed to seed default admin account");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    init_rocket(pool, PathBuf::from(env::upload_dir())).await
}

pub async fn init_rocket(pool: SqlitePool, upload_dir: PathBuf) -> Rocket<Build> {
    info!("Starting teacher ratings");

    let uploads = UploadStore::new(upload_dir);
    uploads
        .ensure_dir()
        .await
        .expect("Failed to create upload directory");

    let upload_path = uploads.dir().to_path_buf();

    let figment = rocket::Config::figment().merge(("port", env::port()));

    rocket::custom(figment)
        .manage(pool)
        .manage(uploads)
        .mount(
            "/",
            routes![
                index,
                index_anonymous,
                login,
                process_login,
                logout,
                register,
                process_register,
                teachers,
                teacher_detail,
                rate_teacher,
                admin,
                admin_new_teacher,
                admin_create_teacher,
                admin_edit_teacher,
                admin_update_teacher,
                admin_delete_teacher,
            ],
        )
        .mount("/uploads", FileServer::from(upload_path))
        .register("/", catchers![unauthorized, forbidden])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
