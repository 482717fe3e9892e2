use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, DbUserSession, User, UserSession};
use crate::error::AppError;
use crate::models::{
    AccountRecord, DbRatingWithAuthor, DbTeacher, DbTeacherSummary, Rating, RatingWithAuthor,
    Teacher, TeacherSummary,
};

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    password: String,
    is_admin: bool,
}

#[instrument(skip_all, fields(username))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    is_admin: bool,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::DuplicateUsername(username.to_string()));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO users (username, password, is_admin) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed_password)
        .bind(is_admin)
        .execute(pool)
        .await;

    match res {
        Ok(res) => Ok(res.last_insert_rowid()),
        // The UNIQUE constraint backs the pre-check up under concurrent inserts.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::DuplicateUsername(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");

    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, username, password, is_admin FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => match bcrypt::verify(password, &row.password) {
            Ok(true) => Ok(Some(User {
                id: row.id,
                username: row.username,
                is_admin: row.is_admin,
            })),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

/// Seeds the default admin/admin account on first run. Safe to call on every
/// start; a second run finds the existing account and does nothing.
#[instrument(skip_all)]
pub async fn ensure_admin_account(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    match create_user(pool, "admin", "admin", true).await {
        Ok(_) => {
            info!("Seeded default admin account");
            Ok(())
        }
        Err(AppError::DuplicateUsername(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username, is_admin FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn find_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, AppError> {
    info!("Getting user by username");
    let row =
        sqlx::query_as::<_, DbUser>("SELECT id, username, is_admin FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(User::from))
}

#[instrument]
pub async fn list_accounts(pool: &Pool<Sqlite>) -> Result<Vec<AccountRecord>, AppError> {
    info!("Listing all user accounts");
    let rows = sqlx::query_as::<_, AccountRecord>(
        "SELECT id, username, password, is_admin FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[instrument]
pub async fn count_users_with_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[instrument]
pub async fn list_teachers_with_average(
    pool: &Pool<Sqlite>,
) -> Result<Vec<TeacherSummary>, AppError> {
    info!("Listing teachers with average stars");
    let rows = sqlx::query_as::<_, DbTeacherSummary>(
        "SELECT t.id, t.name, t.image, t.description, AVG(r.stars) AS average_stars
         FROM teachers t
         LEFT JOIN ratings r ON t.id = r.teacher_id
         GROUP BY t.id
         ORDER BY t.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TeacherSummary::from).collect())
}

#[instrument]
pub async fn get_teacher(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Teacher>, AppError> {
    info!("Fetching teacher by ID");
    let row = sqlx::query_as::<_, DbTeacher>(
        "SELECT id, name, image, description FROM teachers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Teacher::from))
}

#[instrument(skip(pool))]
pub async fn create_teacher(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
    image: Option<&str>,
) -> Result<i64, AppError> {
    info!("Creating teacher");
    let res = sqlx::query("INSERT INTO teachers (name, image, description) VALUES (?, ?, ?)")
        .bind(name)
        .bind(image)
        .bind(description)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

/// Updates a teacher record. The image column is only touched when a new
/// reference is supplied; otherwise the existing one stays.
#[instrument(skip(pool))]
pub async fn update_teacher(
    pool: &Pool<Sqlite>,
    id: i64,
    name: &str,
    description: &str,
    image: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating teacher");
    let result = match image {
        Some(image) => {
            sqlx::query("UPDATE teachers SET name = ?, description = ?, image = ? WHERE id = ?")
                .bind(name)
                .bind(description)
                .bind(image)
                .bind(id)
                .execute(pool)
                .await?
        }
        None => sqlx::query("UPDATE teachers SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(pool)
            .await?,
    };

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Teacher with id {} not found", id)));
    }

    Ok(())
}

/// Deletes a teacher. Ratings referencing it are left in place; the schema
/// defines no cascade.
#[instrument]
pub async fn delete_teacher(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting teacher");
    let result = sqlx::query("DELETE FROM teachers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Teacher with id {} not found", id)));
    }

    Ok(())
}

/// Inserts a rating exactly as supplied. Stars are not range-checked and the
/// same (user, teacher) pair may rate any number of times.
#[instrument(skip(pool, comment))]
pub async fn add_rating(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
    user_id: i64,
    stars: i64,
    comment: &str,
) -> Result<Rating, AppError> {
    info!("Adding rating");
    let res =
        sqlx::query("INSERT INTO ratings (teacher_id, user_id, stars, comment) VALUES (?, ?, ?, ?)")
            .bind(teacher_id)
            .bind(user_id)
            .bind(stars)
            .bind(comment)
            .execute(pool)
            .await?;

    Ok(Rating {
        id: res.last_insert_rowid(),
        teacher_id,
        user_id,
        stars,
        comment: comment.to_string(),
    })
}

#[instrument]
pub async fn ratings_for_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
) -> Result<Vec<RatingWithAuthor>, AppError> {
    info!("Listing ratings for teacher");
    let rows = sqlx::query_as::<_, DbRatingWithAuthor>(
        "SELECT r.id, r.teacher_id, r.user_id, r.stars, r.comment, u.username
         FROM ratings r
         JOIN users u ON r.user_id = u.id
         WHERE r.teacher_id = ?
         ORDER BY r.id",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RatingWithAuthor::from).collect())
}

#[instrument]
pub async fn average_rating(pool: &Pool<Sqlite>, teacher_id: i64) -> Result<Option<f64>, AppError> {
    info!("Computing average rating");
    let average =
        sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(stars) FROM ratings WHERE teacher_id = ?")
            .bind(teacher_id)
            .fetch_one(pool)
            .await?;

    Ok(average)
}

#[instrument]
pub async fn count_ratings_for_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings WHERE teacher_id = ?")
        .bind(teacher_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
