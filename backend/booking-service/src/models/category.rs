use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Image;

/// A class of room within a hotel.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub size: Option<f64>,
    pub bed: Option<i32>,
    pub bathroom_facilities: Option<String>,
    pub amenities: Option<String>,
    pub directions_view: Option<String>,
    pub price: f64,
    pub max_people: Option<i32>,
    pub is_smoking: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Room {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Category with its rooms and pictures.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub rooms: Vec<Room>,
    pub images: Vec<Image>,
}

/// Free rooms of one category for a date range.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryAvailability {
    pub category: Category,
    pub available_count: usize,
    pub room_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
    pub hotel_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub size: Option<f64>,
    #[validate(range(min = 0))]
    pub bed: Option<i32>,
    pub bathroom_facilities: Option<String>,
    pub amenities: Option<String>,
    pub directions_view: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1))]
    pub max_people: Option<i32>,
    #[serde(default)]
    pub is_smoking: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CategoryPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub size: Option<f64>,
    #[validate(range(min = 0))]
    pub bed: Option<i32>,
    pub bathroom_facilities: Option<String>,
    pub amenities: Option<String>,
    pub directions_view: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1))]
    pub max_people: Option<i32>,
    pub is_smoking: Option<bool>,
}
