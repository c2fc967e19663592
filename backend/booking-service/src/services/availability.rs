/// Room availability - overlap rules, stay validation and price quotes
use crate::db::{category_repo, hotel_repo, room_repo};
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryAvailability, Room};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Inclusive overlap of two stays.
pub fn overlaps(a_in: NaiveDate, a_out: NaiveDate, b_in: NaiveDate, b_out: NaiveDate) -> bool {
    a_in <= b_out && a_out >= b_in
}

/// Nights between check-in and check-out, bounded by `max_nights`.
pub fn stay_nights(date_in: NaiveDate, date_out: NaiveDate, max_nights: i64) -> Result<i64> {
    if date_out <= date_in {
        return Err(AppError::BadRequest(
            "date_out must be after date_in".to_string(),
        ));
    }
    let nights = (date_out - date_in).num_days();
    if nights > max_nights {
        return Err(AppError::BadRequest(format!(
            "A stay cannot exceed {} nights",
            max_nights
        )));
    }
    Ok(nights)
}

/// Total for one room per price over `nights`.
pub fn quote<I>(prices: I, nights: i64) -> f64
where
    I: IntoIterator<Item = f64>,
{
    prices.into_iter().map(|price| price * nights as f64).sum()
}

/// Attach free rooms to their categories. Categories keep their order and
/// appear even when nothing is free.
pub fn group_by_category(categories: Vec<Category>, rooms: Vec<Room>) -> Vec<CategoryAvailability> {
    let mut by_category: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for room in rooms {
        by_category.entry(room.category_id).or_default().push(room.id);
    }
    categories
        .into_iter()
        .map(|category| {
            let room_ids = by_category.remove(&category.id).unwrap_or_default();
            CategoryAvailability {
                available_count: room_ids.len(),
                room_ids,
                category,
            }
        })
        .collect()
}

pub async fn available_rooms_for_hotel(
    pool: &PgPool,
    hotel_id: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
    max_nights: i64,
) -> Result<Vec<CategoryAvailability>> {
    stay_nights(date_in, date_out, max_nights)?;
    hotel_repo::find_by_id(pool, hotel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;

    let categories = category_repo::list_by_hotel(pool, hotel_id).await?;
    let rooms = room_repo::free_in_hotel(pool, hotel_id, date_in, date_out).await?;
    Ok(group_by_category(categories, rooms))
}

pub async fn available_count_for_category(
    pool: &PgPool,
    category_id: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
    max_nights: i64,
) -> Result<i64> {
    stay_nights(date_in, date_out, max_nights)?;
    category_repo::find_by_id(pool, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let count = room_repo::free_count_in_category(pool, category_id, date_in, date_out).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn category(id: Uuid) -> Category {
        let now = Utc::now();
        Category {
            id,
            hotel_id: Uuid::new_v4(),
            name: "Deluxe".into(),
            description: None,
            size: Some(32.0),
            bed: Some(2),
            bathroom_facilities: None,
            amenities: None,
            directions_view: None,
            price: 120.0,
            max_people: Some(3),
            is_smoking: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn room(category_id: Uuid) -> Room {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4(),
            category_id,
            name: "101".into(),
            status: "available".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_overlap_is_inclusive() {
        assert!(overlaps(day(1), day(3), day(3), day(5)));
        assert!(overlaps(day(2), day(4), day(1), day(10)));
        assert!(!overlaps(day(1), day(3), day(4), day(6)));
        assert!(!overlaps(day(5), day(7), day(1), day(4)));
    }

    #[test]
    fn test_stay_nights_bounds() {
        assert_eq!(stay_nights(day(1), day(2), 7).unwrap(), 1);
        assert_eq!(stay_nights(day(1), day(8), 7).unwrap(), 7);
        assert!(matches!(
            stay_nights(day(1), day(9), 7),
            Err(AppError::BadRequest(_))
        ));
        assert!(stay_nights(day(3), day(3), 7).is_err());
        assert!(stay_nights(day(4), day(3), 7).is_err());
    }

    #[test]
    fn test_quote_sums_price_times_nights() {
        assert_eq!(quote(vec![100.0, 50.0], 3), 450.0);
        assert_eq!(quote(Vec::new(), 3), 0.0);
    }

    #[test]
    fn test_group_by_category_counts_free_rooms() {
        let deluxe = Uuid::new_v4();
        let suite = Uuid::new_v4();
        let grouped = group_by_category(
            vec![category(deluxe), category(suite)],
            vec![room(deluxe), room(deluxe)],
        );

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].category.id, deluxe);
        assert_eq!(grouped[0].available_count, 2);
        assert_eq!(grouped[1].available_count, 0);
        assert!(grouped[1].room_ids.is_empty());
    }
}
