#[cfg(test)]
pub mod test_db {
    use crate::db::{add_rating, create_teacher, create_user};
    use crate::error::AppError;
    use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        teachers: Vec<TestTeacher>,
        ratings: Vec<TestRating>,
    }

    pub struct TestUser {
        pub username: String,
        pub password: String,
        pub is_admin: bool,
    }

    pub struct TestTeacher {
        pub name: String,
        pub description: String,
        pub image: Option<String>,
    }

    pub struct TestRating {
        pub teacher_name: String,
        pub username: String,
        pub stars: i64,
        pub comment: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                password: STANDARD_PASSWORD.to_string(),
                is_admin: false,
            });
            self
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                password: STANDARD_PASSWORD.to_string(),
                is_admin: true,
            });
            self
        }

        pub fn user_with_password(mut self, username: &str, password: &str, is_admin: bool) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                password: password.to_string(),
                is_admin,
            });
            self
        }

        pub fn teacher(mut self, name: &str, description: &str) -> Self {
            self.teachers.push(TestTeacher {
                name: name.to_string(),
                description: description.to_string(),
                image: None,
            });
            self
        }

        pub fn teacher_with_image(mut self, name: &str, description: &str, image: &str) -> Self {
            self.teachers.push(TestTeacher {
                name: name.to_string(),
                description: description.to_string(),
                image: Some(image.to_string()),
            });
            self
        }

        pub fn rating(
            mut self,
            teacher_name: &str,
            username: &str,
            stars: i64,
            comment: &str,
        ) -> Self {
            self.ratings.push(TestRating {
                teacher_name: teacher_name.to_string(),
                username: username.to_string(),
                stars,
                comment: comment.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder().is_test(true).try_init();
            });

            // A single connection keeps every query on the same in-memory
            // database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut teacher_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id =
                    create_user(&pool, &user.username, &user.password, user.is_admin).await?;

                user_id_map.insert(user.username.clone(), user_id);
            }

            for teacher in &self.teachers {
                let teacher_id = create_teacher(
                    &pool,
                    &teacher.name,
                    &teacher.description,
                    teacher.image.as_deref(),
                )
                .await?;

                teacher_id_map.insert(teacher.name.clone(), teacher_id);
            }

            for rating in &self.ratings {
                let teacher_id = teacher_id_map
                    .get(&rating.teacher_name)
                    .copied()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Unknown test teacher {}", rating.teacher_name))
                    })?;

                let user_id = user_id_map.get(&rating.username).copied().ok_or_else(|| {
                    AppError::NotFound(format!("Unknown test user {}", rating.username))
                })?;

                add_rating(&pool, teacher_id, user_id, rating.stars, &rating.comment).await?;
            }

            Ok(TestDb {
                pool,
                user_id_map,
                teacher_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub teacher_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub fn teacher_id(&self, name: &str) -> Option<i64> {
            self.teacher_id_map.get(name).copied()
        }
    }
}
