/// Account handlers - registration, login, profile and admin user management
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, ok};
use crate::db::user_repo::{self, ProfileChanges};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{Page, PageQuery, Role, User};
use crate::security::{hash_password, jwt, verify_password};
use crate::validators;

const USERS_PER_PAGE: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: jwt::TokenResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<i16>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub password: Option<String>,
}

impl UpdateProfileRequest {
    fn check(&self, today: NaiveDate) -> Result<()> {
        self.validate()?;
        if let Some(phone) = &self.phone {
            if !validators::validate_phone(phone) {
                return Err(AppError::Validation("Invalid phone number".into()));
            }
        }
        if let Some(gender) = self.gender {
            if !validators::validate_gender(gender) {
                return Err(AppError::Validation("Gender must be 0 or 1".into()));
            }
        }
        if let Some(dob) = self.date_of_birth {
            if !validators::validate_date_of_birth(dob, today) {
                return Err(AppError::Validation(
                    "Date of birth must be in the past".into(),
                ));
            }
        }
        if let Some(password) = &self.password {
            if !validators::validate_profile_password(password) {
                return Err(AppError::Validation(
                    "Password must contain an uppercase letter and a digit".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub email: String,
    pub role: Role,
}

async fn hash_off_thread(password: String) -> Result<String> {
    web::block(move || hash_password(&password)).await?
}

/// POST /api/v1/auth/register
pub async fn register(
    pool: web::Data<PgPool>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    if !validators::validate_password(&req.password) {
        return Err(AppError::Validation(
            "Password must be 8-255 characters with lowercase, uppercase and a digit".into(),
        ));
    }
    if user_repo::email_exists(pool.get_ref(), &req.email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_off_thread(req.password).await?;
    let user = user_repo::create_user(pool.get_ref(), &req.name, &req.email, &password_hash).await?;
    let token = jwt::generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(created("Registered successfully", AuthResponse { user, token }))
}

/// POST /api/v1/auth/login
pub async fn login(pool: web::Data<PgPool>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let req = req.into_inner();
    let invalid = || AppError::Authentication("Invalid email or password".into());

    let user = user_repo::find_by_email(pool.get_ref(), &req.email)
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let verified = web::block(move || verify_password(&req.password, &hash)).await??;
    if !verified {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(invalid());
    }

    let token = jwt::generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(ok("Logged in successfully", AuthResponse { user, token }))
}

async fn load_profile(pool: &PgPool, id: Uuid) -> Result<User> {
    user_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

async fn apply_profile(pool: &PgPool, id: Uuid, req: UpdateProfileRequest) -> Result<User> {
    req.check(Utc::now().date_naive())?;
    let password_hash = match req.password {
        Some(password) => Some(hash_off_thread(password).await?),
        None => None,
    };
    let changes = ProfileChanges {
        name: req.name.as_deref(),
        phone: req.phone.as_deref(),
        gender: req.gender,
        date_of_birth: req.date_of_birth,
        address: req.address.as_deref(),
        password_hash: password_hash.as_deref(),
    };
    user_repo::update_profile(pool, id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// GET /api/v1/users/me
pub async fn me(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    let profile = load_profile(pool.get_ref(), user.id).await?;
    Ok(ok("Profile", profile))
}

/// PUT /api/v1/users/me
pub async fn update_me(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let profile = apply_profile(pool.get_ref(), user.id, req.into_inner()).await?;
    Ok(ok("Profile updated", profile))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_admin(&user)?;
    let query = query.into_inner();
    let users =
        user_repo::list_non_admins(pool.get_ref(), USERS_PER_PAGE, query.offset(USERS_PER_PAGE))
            .await?;
    let total = user_repo::count_non_admins(pool.get_ref()).await?;
    Ok(ok("Users", Page::new(users, query, USERS_PER_PAGE, total)))
}

/// PUT /api/v1/admin/users/role
///
/// Admin accounts cannot be created or demoted through the API.
pub async fn update_role(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse> {
    permissions::require_admin(&user)?;
    let req = req.into_inner();
    if !validators::validate_email(&req.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.role == Role::Admin {
        return Err(AppError::BadRequest("Cannot grant the admin role".into()));
    }
    let target = user_repo::find_by_email(pool.get_ref(), &req.email)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if target.role == Role::Admin {
        return Err(AppError::Authorization(
            "Cannot change the role of an admin".into(),
        ));
    }

    let updated = user_repo::update_role_by_email(pool.get_ref(), &req.email, req.role)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    tracing::info!(
        admin_id = %user.id,
        user_id = %updated.id,
        role = %updated.role,
        "role updated"
    );
    Ok(ok("Role updated", updated))
}

/// GET /api/v1/admin/profile
pub async fn admin_profile(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    permissions::require_admin(&user)?;
    let profile = load_profile(pool.get_ref(), user.id).await?;
    Ok(ok("Profile", profile))
}

/// PUT /api/v1/admin/profile
pub async fn update_admin_profile(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    permissions::require_admin(&user)?;
    let profile = apply_profile(pool.get_ref(), user.id, req.into_inner()).await?;
    Ok(ok("Profile updated", profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(json: serde_json::Value) -> UpdateProfileRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_profile_rules() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(profile(serde_json::json!({ "phone": "0905 123 456" }))
            .check(today)
            .is_ok());
        assert!(profile(serde_json::json!({ "phone": "abc" }))
            .check(today)
            .is_err());
        assert!(profile(serde_json::json!({ "gender": 2 }))
            .check(today)
            .is_err());
        assert!(profile(serde_json::json!({ "date_of_birth": "2024-06-01" }))
            .check(today)
            .is_err());
        assert!(profile(serde_json::json!({ "password": "lowercase1" }))
            .check(today)
            .is_err());
        assert!(profile(serde_json::json!({ "password": "Upper1" }))
            .check(today)
            .is_ok());
    }
}
