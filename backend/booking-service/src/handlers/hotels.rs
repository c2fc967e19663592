/// Hotel handlers - listings, search filters and owner management
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok, owned_hotel};
use crate::db::hotel_repo::{self, HotelFilter};
use crate::db::image_repo::{self, ImageKind};
use crate::db::review_repo;
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{
    Hotel, HotelPatch, HotelWithImages, NewHotel, Page, PageQuery, ReviewWithAuthor,
};
use crate::services::cascade;
use crate::validators;

const HOTELS_PER_PAGE: i64 = 20;
const REVIEWS_PER_PAGE: i64 = 20;
const LATEST_LIMIT: i64 = 7;
const NEARBY_LIMIT: i64 = 7;
const TOP_BOOKED_LIMIT: i64 = 6;
const CITIES_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct HotelDetail {
    #[serde(flatten)]
    pub hotel: HotelWithImages,
    pub reviews: Vec<ReviewWithAuthor>,
}

#[derive(Debug, Serialize)]
pub struct TopBookedHotel {
    #[serde(flatten)]
    pub hotel: HotelWithImages,
    pub bookings: i64,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub min_price: f64,
    pub max_price: f64,
    pub city: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RatingQuery {
    pub rating: f64,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GuestsQuery {
    pub guests: i32,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub q: String,
    pub page: Option<i64>,
}

async fn with_images(pool: &PgPool, hotels: Vec<Hotel>) -> Result<Vec<HotelWithImages>> {
    let ids: Vec<Uuid> = hotels.iter().map(|h| h.id).collect();
    let images = image_repo::for_owners(pool, ImageKind::Hotel, &ids).await?;
    Ok(HotelWithImages::group(hotels, images))
}

async fn page_of(pool: &PgPool, filter: HotelFilter<'_>, query: PageQuery) -> Result<HttpResponse> {
    let hotels =
        hotel_repo::list(pool, &filter, HOTELS_PER_PAGE, query.offset(HOTELS_PER_PAGE)).await?;
    let total = hotel_repo::count(pool, &filter).await?;
    let items = with_images(pool, hotels).await?;
    Ok(ok("Hotels", Page::new(items, query, HOTELS_PER_PAGE, total)))
}

fn check_hotline(hotline: &str) -> Result<()> {
    if validators::validate_phone(hotline) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Hotline must be at least {} characters of digits, spaces, -, + or parentheses",
            validators::MIN_PHONE_LEN
        )))
    }
}

async fn check_unique(
    pool: &PgPool,
    hotline: Option<&str>,
    email: Option<&str>,
    except: Option<Uuid>,
) -> Result<()> {
    if let Some(hotline) = hotline {
        if hotel_repo::hotline_taken(pool, hotline, except).await? {
            return Err(AppError::Conflict("Hotline is already in use".into()));
        }
    }
    if let Some(email) = email {
        if hotel_repo::email_taken(pool, email, except).await? {
            return Err(AppError::Conflict("Email is already in use".into()));
        }
    }
    Ok(())
}

/// GET /api/v1/hotels
pub async fn list_hotels(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    page_of(pool.get_ref(), HotelFilter::All, query.into_inner()).await
}

/// GET /api/v1/hotels/mine
pub async fn my_hotels(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_hotel_manager(&user)?;
    page_of(pool.get_ref(), HotelFilter::Owner(user.id), query.into_inner()).await
}

/// POST /api/v1/hotels
pub async fn create_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<NewHotel>,
) -> Result<HttpResponse> {
    permissions::require_hotel_manager(&user)?;
    let req = req.into_inner();
    req.validate()?;
    check_hotline(&req.hotline)?;
    check_unique(pool.get_ref(), Some(&req.hotline), Some(&req.email), None).await?;

    let hotel = hotel_repo::create(pool.get_ref(), user.id, &req).await?;
    tracing::info!(hotel_id = %hotel.id, owner_id = %user.id, "hotel created");
    Ok(created("Hotel created", hotel))
}

/// GET /api/v1/hotels/latest
pub async fn latest_hotels(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let hotels = hotel_repo::latest(pool.get_ref(), LATEST_LIMIT).await?;
    Ok(ok("Latest hotels", with_images(pool.get_ref(), hotels).await?))
}

/// GET /api/v1/hotels/nearby?city=
pub async fn nearby_hotels(
    pool: web::Data<PgPool>,
    query: web::Query<NearbyQuery>,
) -> Result<HttpResponse> {
    let city = query.city.trim();
    if city.is_empty() {
        return Err(AppError::Validation("city is required".into()));
    }
    let hotels = hotel_repo::in_city(pool.get_ref(), city, NEARBY_LIMIT).await?;
    Ok(ok("Nearby hotels", with_images(pool.get_ref(), hotels).await?))
}

/// GET /api/v1/hotels/top-booked
pub async fn top_booked_hotels(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let counts = hotel_repo::top_booked(pool.get_ref(), TOP_BOOKED_LIMIT).await?;
    let ids: Vec<Uuid> = counts.iter().map(|c| c.hotel_id).collect();
    let hotels = hotel_repo::find_by_ids(pool.get_ref(), &ids).await?;
    let mut by_id: HashMap<Uuid, HotelWithImages> = with_images(pool.get_ref(), hotels)
        .await?
        .into_iter()
        .map(|h| (h.hotel.id, h))
        .collect();

    let top: Vec<TopBookedHotel> = counts
        .into_iter()
        .filter_map(|count| {
            by_id.remove(&count.hotel_id).map(|hotel| TopBookedHotel {
                hotel,
                bookings: count.total,
            })
        })
        .collect();
    Ok(ok("Top booked hotels", top))
}

/// GET /api/v1/hotels/cities
pub async fn hotel_cities(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let cities = hotel_repo::distinct_cities(pool.get_ref(), CITIES_LIMIT).await?;
    Ok(ok("Cities", cities))
}

/// GET /api/v1/hotels/search/{field}/{term}
pub async fn search_hotels(
    pool: web::Data<PgPool>,
    path: web::Path<(String, String)>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (field, term) = path.into_inner();
    let filter = match field.as_str() {
        "name" => HotelFilter::NameLike(&term),
        "address" => HotelFilter::AddressLike(&term),
        "city" => HotelFilter::CityLike(&term),
        "nation" => HotelFilter::NationLike(&term),
        other => {
            return Err(AppError::BadRequest(format!(
                "Cannot search hotels by '{}'",
                other
            )))
        }
    };
    page_of(pool.get_ref(), filter, query.into_inner()).await
}

/// GET /api/v1/hotels/filter/price
pub async fn filter_by_price(
    pool: web::Data<PgPool>,
    query: web::Query<PriceQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    validators::validate_price_range(query.min_price, query.max_price)
        .map_err(AppError::Validation)?;
    let filter = HotelFilter::Price {
        min: query.min_price,
        max: query.max_price,
        city: query.city.as_deref().filter(|c| !c.trim().is_empty()),
    };
    page_of(pool.get_ref(), filter, PageQuery { page: query.page }).await
}

/// GET /api/v1/hotels/filter/rating
pub async fn filter_by_rating(
    pool: web::Data<PgPool>,
    query: web::Query<RatingQuery>,
) -> Result<HttpResponse> {
    if !validators::validate_rating_filter(query.rating) {
        return Err(AppError::Validation("Rating must be between 0 and 5".into()));
    }
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), HotelFilter::MinRating(query.rating), page).await
}

/// GET /api/v1/hotels/filter/guests
pub async fn filter_by_guests(
    pool: web::Data<PgPool>,
    query: web::Query<GuestsQuery>,
) -> Result<HttpResponse> {
    if query.guests < 0 {
        return Err(AppError::Validation("Guests must not be negative".into()));
    }
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), HotelFilter::MinGuests(query.guests), page).await
}

/// GET /api/v1/hotels/filter/amenities
pub async fn filter_by_amenities(
    pool: web::Data<PgPool>,
    query: web::Query<TextQuery>,
) -> Result<HttpResponse> {
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), HotelFilter::AmenitiesLike(&query.q), page).await
}

/// GET /api/v1/hotels/filter/safety-hygiene
pub async fn filter_by_safety_hygiene(
    pool: web::Data<PgPool>,
    query: web::Query<TextQuery>,
) -> Result<HttpResponse> {
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), HotelFilter::SafetyHygieneLike(&query.q), page).await
}

/// GET /api/v1/hotels/{id}
pub async fn get_hotel(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let hotel = hotel_repo::find_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    let hotel = with_images(pool.get_ref(), vec![hotel])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    let reviews = review_repo::for_hotel(pool.get_ref(), id, REVIEWS_PER_PAGE, 0).await?;
    Ok(ok("Hotel", HotelDetail { hotel, reviews }))
}

/// PUT /api/v1/hotels/{id}
pub async fn update_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<HotelPatch>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_hotel(pool.get_ref(), &user, id).await?;
    let patch = req.into_inner();
    patch.validate()?;
    if let Some(hotline) = &patch.hotline {
        check_hotline(hotline)?;
    }
    check_unique(
        pool.get_ref(),
        patch.hotline.as_deref(),
        patch.email.as_deref(),
        Some(id),
    )
    .await?;

    let hotel = hotel_repo::update(pool.get_ref(), id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    Ok(ok("Hotel updated", hotel))
}

/// DELETE /api/v1/hotels/{id}
pub async fn delete_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    owned_hotel(pool.get_ref(), &user, id).await?;
    cascade::delete_hotel(pool.get_ref(), id).await?;
    Ok(done("Hotel deleted"))
}

/// POST /api/v1/hotels/{id}/restore
pub async fn restore_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let hotel = hotel_repo::find_including_deleted(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    permissions::check_hotel_owner(&user, &hotel)?;
    cascade::restore_hotel(pool.get_ref(), id, hotel.deleted_at).await?;
    Ok(done("Hotel restored"))
}
