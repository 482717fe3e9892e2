use serde::Serialize;

#[derive(Serialize, Clone)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub description: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacher {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl From<DbTeacher> for Teacher {
    fn from(teacher: DbTeacher) -> Self {
        Self {
            id: teacher.id.unwrap_or_default(),
            name: teacher.name.unwrap_or_default(),
            image: teacher.image,
            description: teacher.description.unwrap_or_default(),
        }
    }
}

/// Catalog row for the teacher list: the teacher joined with the arithmetic
/// mean of its ratings. `average_stars` is `None` when no ratings exist,
/// never zero.
#[derive(Serialize, Clone)]
pub struct TeacherSummary {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub description: String,
    pub average_stars: Option<f64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacherSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub average_stars: Option<f64>,
}

impl From<DbTeacherSummary> for TeacherSummary {
    fn from(row: DbTeacherSummary) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            image: row.image,
            description: row.description.unwrap_or_default(),
            average_stars: row.average_stars,
        }
    }
}

#[derive(Serialize, Clone)]
pub struct Rating {
    pub id: i64,
    pub teacher_id: i64,
    pub user_id: i64,
    pub stars: i64,
    pub comment: String,
}

/// A rating joined with its author's username for the detail page.
#[derive(Serialize, Clone)]
pub struct RatingWithAuthor {
    pub id: i64,
    pub teacher_id: i64,
    pub user_id: i64,
    pub stars: i64,
    pub comment: String,
    pub username: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbRatingWithAuthor {
    pub id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub user_id: Option<i64>,
    pub stars: Option<i64>,
    pub comment: Option<String>,
    pub username: Option<String>,
}

impl From<DbRatingWithAuthor> for RatingWithAuthor {
    fn from(row: DbRatingWithAuthor) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            teacher_id: row.teacher_id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            stars: row.stars.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            username: row.username.unwrap_or_default(),
        }
    }
}

/// Full account row for the admin page, stored password column included.
#[derive(Serialize, sqlx::FromRow, Clone)]
pub struct AccountRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}
