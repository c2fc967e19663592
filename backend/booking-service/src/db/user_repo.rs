/// User repository
use crate::models::{Role, User};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! user_columns {
    () => {
        "id, name, email, password_hash, role, phone, gender, date_of_birth, address, created_at, updated_at"
    };
}

pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!(
        "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING ",
        user_columns!()
    ))
    .bind(name)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(Role::User)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users WHERE email = $1"
    ))
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!("SELECT ", user_columns!(), " FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email.to_lowercase())
        .fetch_one(pool)
        .await
}

/// Accounts other than admins, newest first.
pub async fn list_non_admins(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users WHERE role <> 'admin' ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_non_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role <> 'admin'")
        .fetch_one(pool)
        .await
}

pub async fn update_role_by_email(
    pool: &PgPool,
    email: &str,
    role: Role,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE email = $2 RETURNING ",
        user_columns!()
    ))
    .bind(role)
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Profile fields; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub gender: Option<i16>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    changes: ProfileChanges<'_>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(concat!(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            gender = COALESCE($4, gender),
            date_of_birth = COALESCE($5, date_of_birth),
            address = COALESCE($6, address),
            password_hash = COALESCE($7, password_hash),
            updated_at = NOW()
        WHERE id = $1
        RETURNING "#,
        user_columns!()
    ))
    .bind(id)
    .bind(changes.name)
    .bind(changes.phone)
    .bind(changes.gender)
    .bind(changes.date_of_birth)
    .bind(changes.address)
    .bind(changes.password_hash)
    .fetch_optional(pool)
    .await
}
