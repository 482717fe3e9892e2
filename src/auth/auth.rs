use rocket::State;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::response::content::RawText;
use rocket::response::status::Custom;
use rocket_dyn_templates::{Template, context};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{authenticate_user, create_user, create_user_session, invalidate_session};
use crate::error::AppError;

use super::UserSession;

#[derive(FromForm)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[get("/login?<username>")]
pub fn login(username: Option<String>) -> Template {
    Template::render(
        "login",
        context! {
            title: "Login",
            username: username.unwrap_or_default(),
        },
    )
}

#[post("/login", data = "<form>")]
pub async fn process_login(
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    db: &State<SqlitePool>,
) -> Result<Redirect, RawText<&'static str>> {
    info!("Login attempt: {}", &form.username);

    let user = match authenticate_user(db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            e.log("process_login");
            None
        }
    };

    match user {
        Some(user) => {
            info!("Authentication successful for {}", &form.username);

            let token = UserSession::generate_token();
            let expires_at = UserSession::default_expiry();

            if let Err(e) = create_user_session(db, user.id, &token, expires_at).await {
                e.log("process_login");
                return Err(RawText("Login failed"));
            }

            cookies.add_private(
                Cookie::build(("session_token", token))
                    .same_site(SameSite::Lax)
                    .http_only(true),
            );

            Ok(Redirect::to("/teachers"))
        }
        _ => Err(RawText("Login failed")),
    }
}

#[get("/logout")]
pub async fn logout(cookies: &CookieJar<'_>, db: &State<SqlitePool>) -> Redirect {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    cookies.remove_private(Cookie::build("session_token"));
    Redirect::to("/login")
}

#[derive(FromForm)]
pub struct RegisterForm {
    username: String,
    password: String,
}

#[get("/register")]
pub fn register() -> Template {
    Template::render(
        "register",
        context! {
            title: "Register",
        },
    )
}

#[post("/register", data = "<form>")]
pub async fn process_register(
    form: Form<RegisterForm>,
    db: &State<SqlitePool>,
) -> Result<Redirect, Custom<RawText<&'static str>>> {
    match create_user(db, &form.username, &form.password, false).await {
        Ok(_) => Ok(Redirect::to("/login")),
        Err(AppError::DuplicateUsername(username)) => {
            warn!(username = %username, "Registration rejected, username taken");
            Err(Custom(
                rocket::http::Status::Ok,
                RawText("Registration failed: username already exists"),
            ))
        }
        Err(e) => {
            let status = e.to_status_with_log("process_register");
            Err(Custom(status, RawText("Registration failed")))
        }
    }
}
