use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub nation: String,
    pub hotline: String,
    pub email: String,
    pub description: Option<String>,
    pub room_total: i32,
    pub parking_slot: i32,
    pub bathrooms: i32,
    pub amenities: String,
    pub safety_hygiene: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: i32,
    pub price: f64,
    pub rating: f64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A picture attached to a hotel or a category.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    /// Hotel or category the image belongs to
    pub owner_id: Uuid,
    pub image_url: String,
    pub image_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hotel plus its images, as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct HotelWithImages {
    #[serde(flatten)]
    pub hotel: Hotel,
    pub images: Vec<Image>,
}

impl HotelWithImages {
    /// Attach `images` to their hotels, preserving hotel order.
    pub fn group(hotels: Vec<Hotel>, images: Vec<Image>) -> Vec<Self> {
        let mut by_hotel: HashMap<Uuid, Vec<Image>> = HashMap::new();
        for image in images {
            by_hotel.entry(image.owner_id).or_default().push(image);
        }
        hotels
            .into_iter()
            .map(|hotel| {
                let images = by_hotel.remove(&hotel.id).unwrap_or_default();
                Self { hotel, images }
            })
            .collect()
    }
}

/// Count of live bookings per hotel, for the top-booked listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HotelBookingCount {
    pub hotel_id: Uuid,
    pub total: i64,
}

/// Body of `POST /hotels`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewHotel {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 255))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub nation: String,
    pub hotline: String,
    #[validate(email)]
    pub email: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub room_total: i32,
    #[validate(range(min = 0))]
    pub parking_slot: i32,
    #[validate(range(min = 0))]
    pub bathrooms: i32,
    #[validate(length(min = 1))]
    pub amenities: String,
    #[validate(length(min = 1))]
    pub safety_hygiene: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub guests: i32,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: f64,
}

/// Body of `PUT /hotels/{id}`; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct HotelPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub nation: Option<String>,
    pub hotline: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub room_total: Option<i32>,
    #[validate(range(min = 0))]
    pub parking_slot: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    pub amenities: Option<String>,
    pub safety_hygiene: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    #[validate(range(min = 0))]
    pub guests: Option<i32>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel(id: Uuid) -> Hotel {
        let now = Utc::now();
        Hotel {
            id,
            name: "Sea Breeze".into(),
            address: "1 Beach Rd".into(),
            city: "Da Nang".into(),
            nation: "Vietnam".into(),
            hotline: "0236 123 4567".into(),
            email: "stay@seabreeze.vn".into(),
            description: None,
            room_total: 10,
            parking_slot: 4,
            bathrooms: 10,
            amenities: "pool".into(),
            safety_hygiene: "daily cleaning".into(),
            check_in: Some("14:00".into()),
            check_out: Some("12:00".into()),
            guests: 2,
            price: 80.0,
            rating: 0.0,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn image(owner_id: Uuid) -> Image {
        let now = Utc::now();
        Image {
            id: Uuid::new_v4(),
            owner_id,
            image_url: "https://cdn.example.com/a.jpg".into(),
            image_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_group_keeps_hotel_order_and_ownership() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = HotelWithImages::group(
            vec![hotel(a), hotel(b)],
            vec![image(b), image(a), image(b)],
        );

        assert_eq!(grouped[0].hotel.id, a);
        assert_eq!(grouped[0].images.len(), 1);
        assert_eq!(grouped[1].hotel.id, b);
        assert_eq!(grouped[1].images.len(), 2);
    }

    #[test]
    fn test_new_hotel_validation() {
        let body: NewHotel = serde_json::from_value(serde_json::json!({
            "name": "Sea Breeze",
            "address": "1 Beach Rd",
            "city": "Da Nang",
            "nation": "Vietnam",
            "hotline": "0236 123 4567",
            "email": "not-an-email",
            "room_total": 10,
            "parking_slot": 2,
            "bathrooms": 10,
            "amenities": "pool",
            "safety_hygiene": "daily cleaning"
        }))
        .unwrap();

        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
