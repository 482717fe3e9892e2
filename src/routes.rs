use rocket::State;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::response::content::RawText;
use rocket::response::status::Custom;
use rocket_dyn_templates::{Template, context};
use sqlx::SqlitePool;

use crate::auth::{AdminUser, User};
use crate::db::{
    add_rating, average_rating, create_teacher, delete_teacher, get_teacher, list_accounts,
    list_teachers_with_average, ratings_for_teacher, update_teacher,
};
use crate::error::AppError;
use crate::uploads::UploadStore;

fn failure(e: AppError, ctx: &str) -> Custom<RawText<&'static str>> {
    Custom(e.to_status_with_log(ctx), RawText("Something went wrong"))
}

#[get("/")]
pub fn index(_user: User) -> Redirect {
    Redirect::to("/teachers")
}

#[get("/", rank = 2)]
pub fn index_anonymous() -> Redirect {
    Redirect::to("/login")
}

#[get("/teachers")]
pub async fn teachers(user: User, db: &State<SqlitePool>) -> Result<Template, AppError> {
    let teachers = list_teachers_with_average(db).await?;

    Ok(Template::render(
        "teachers",
        context! {
            title: "Teachers",
            teachers: teachers,
            current_user: user,
        },
    ))
}

#[get("/teachers/<id>")]
pub async fn teacher_detail(
    id: i64,
    user: User,
    db: &State<SqlitePool>,
) -> Result<Template, Custom<RawText<&'static str>>> {
    let teacher = get_teacher(db, id)
        .await
        .map_err(|e| failure(e, "teacher_detail"))?;

    let Some(teacher) = teacher else {
        return Err(Custom(Status::NotFound, RawText("Teacher not found")));
    };

    let ratings = ratings_for_teacher(db, id)
        .await
        .map_err(|e| failure(e, "teacher_detail"))?;

    let average = average_rating(db, id)
        .await
        .map_err(|e| failure(e, "teacher_detail"))?;

    Ok(Template::render(
        "teacher",
        context! {
            title: teacher.name.clone(),
            teacher: teacher,
            ratings: ratings,
            average_stars: average,
            current_user: user,
        },
    ))
}

#[derive(FromForm)]
pub struct RateForm {
    stars: i64,
    comment: String,
}

#[post("/teachers/<id>/rate", data = "<form>")]
pub async fn rate_teacher(
    id: i64,
    form: Form<RateForm>,
    user: User,
    db: &State<SqlitePool>,
) -> Result<Redirect, AppError> {
    add_rating(db, id, user.id, form.stars, &form.comment).await?;

    Ok(Redirect::to(uri!(teacher_detail(id))))
}

#[get("/admin")]
pub async fn admin(admin: AdminUser, db: &State<SqlitePool>) -> Result<Template, AppError> {
    let teachers = list_teachers_with_average(db).await?;
    let accounts = list_accounts(db).await?;

    Ok(Template::render(
        "admin",
        context! {
            title: "Admin",
            teachers: teachers,
            accounts: accounts,
            current_user: admin.0,
        },
    ))
}

#[get("/admin/teachers/new")]
pub fn admin_new_teacher(admin: AdminUser) -> Template {
    Template::render(
        "teacher_form",
        context! {
            title: "New teacher",
            form_title: "New teacher",
            action: "/admin/teachers",
            current_user: admin.0,
        },
    )
}

#[derive(FromForm)]
pub struct TeacherUpsertForm<'f> {
    name: String,
    description: String,
    image: Option<TempFile<'f>>,
}

#[post("/admin/teachers", data = "<form>")]
pub async fn admin_create_teacher(
    _admin: AdminUser,
    mut form: Form<TeacherUpsertForm<'_>>,
    db: &State<SqlitePool>,
    uploads: &State<UploadStore>,
) -> Result<Redirect, AppError> {
    let image = match form.image.as_mut() {
        Some(file) => uploads.store(file).await?,
        None => None,
    };

    create_teacher(db, &form.name, &form.description, image.as_deref()).await?;

    Ok(Redirect::to("/admin"))
}

#[get("/admin/teachers/<id>/edit")]
pub async fn admin_edit_teacher(
    id: i64,
    admin: AdminUser,
    db: &State<SqlitePool>,
) -> Result<Template, Custom<RawText<&'static str>>> {
    let teacher = get_teacher(db, id)
        .await
        .map_err(|e| failure(e, "admin_edit_teacher"))?;

    let Some(teacher) = teacher else {
        return Err(Custom(Status::NotFound, RawText("Teacher not found")));
    };

    Ok(Template::render(
        "teacher_form",
        context! {
            title: "Edit teacher",
            form_title: "Edit teacher",
            action: format!("/admin/teachers/{}/update", id),
            teacher: teacher,
            current_user: admin.0,
        },
    ))
}

#[post("/admin/teachers/<id>/update", data = "<form>")]
pub async fn admin_update_teacher(
    id: i64,
    _admin: AdminUser,
    mut form: Form<TeacherUpsertForm<'_>>,
    db: &State<SqlitePool>,
    uploads: &State<UploadStore>,
) -> Result<Redirect, AppError> {
    // A blank file input leaves the stored image untouched.
    let image = match form.image.as_mut() {
        Some(file) => uploads.store(file).await?,
        None => None,
    };

    update_teacher(db, id, &form.name, &form.description, image.as_deref()).await?;

    Ok(Redirect::to("/admin"))
}

#[post("/admin/teachers/<id>/delete")]
pub async fn admin_delete_teacher(
    id: i64,
    _admin: AdminUser,
    db: &State<SqlitePool>,
) -> Result<Redirect, AppError> {
    delete_teacher(db, id).await?;

    Ok(Redirect::to("/admin"))
}
