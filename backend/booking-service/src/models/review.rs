use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub hotel_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Review joined with the reviewer's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub hotel_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reply {
    pub id: Uuid,
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
