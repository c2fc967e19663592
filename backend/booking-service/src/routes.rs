//! Route configuration
//!
//! Every API path lives under `/api/v1`. Fixed segments such as `/mine` are
//! registered ahead of the `{id}` resources they would otherwise collide with.

use actix_web::web;

use crate::db::image_repo::ImageKind;
use crate::error::AppError;
use crate::handlers::{
    booking_details, bookings, categories, health, hotels, images, payments, replies, reviews,
    rooms, users,
};
use crate::metrics;

/// Configure all routes for the application
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .app_data(json_config())
                .route("/health", web::get().to(health::health_check))
                .route("/health/ready", web::get().to(health::readiness_check))
                .configure(auth)
                .configure(hotel_routes)
                .configure(category_routes)
                .configure(room_routes)
                .configure(|cfg| image_routes(cfg, ImageKind::Hotel, "hotel-images", "hotels"))
                .configure(|cfg| {
                    image_routes(cfg, ImageKind::Category, "category-images", "categories")
                })
                .configure(booking_routes)
                .configure(payment_routes)
                .configure(review_routes)
                .configure(reply_routes),
        );
}

/// Malformed bodies come back as 400 in the usual error envelope.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(users::register))
        .route("/auth/login", web::post().to(users::login))
        .service(
            web::resource("/users/me")
                .route(web::get().to(users::me))
                .route(web::put().to(users::update_me)),
        )
        .route("/admin/users", web::get().to(users::list_users))
        .route("/admin/users/role", web::put().to(users::update_role))
        .service(
            web::resource("/admin/profile")
                .route(web::get().to(users::admin_profile))
                .route(web::put().to(users::update_admin_profile)),
        );
}

fn hotel_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/hotels")
            .route(web::get().to(hotels::list_hotels))
            .route(web::post().to(hotels::create_hotel)),
    )
    .route("/hotels/mine", web::get().to(hotels::my_hotels))
    .route("/hotels/latest", web::get().to(hotels::latest_hotels))
    .route("/hotels/nearby", web::get().to(hotels::nearby_hotels))
    .route("/hotels/top-booked", web::get().to(hotels::top_booked_hotels))
    .route("/hotels/cities", web::get().to(hotels::hotel_cities))
    .route("/hotels/search/{field}/{term}", web::get().to(hotels::search_hotels))
    .route("/hotels/filter/price", web::get().to(hotels::filter_by_price))
    .route("/hotels/filter/rating", web::get().to(hotels::filter_by_rating))
    .route("/hotels/filter/guests", web::get().to(hotels::filter_by_guests))
    .route("/hotels/filter/amenities", web::get().to(hotels::filter_by_amenities))
    .route(
        "/hotels/filter/safety-hygiene",
        web::get().to(hotels::filter_by_safety_hygiene),
    )
    .service(
        web::resource("/hotels/{id}")
            .route(web::get().to(hotels::get_hotel))
            .route(web::put().to(hotels::update_hotel))
            .route(web::delete().to(hotels::delete_hotel)),
    )
    .route("/hotels/{id}/restore", web::post().to(hotels::restore_hotel))
    .service(
        web::resource("/hotels/{id}/categories")
            .route(web::get().to(categories::categories_of_hotel))
            .route(web::delete().to(categories::delete_categories_of_hotel)),
    )
    .route(
        "/hotels/{id}/categories/restore",
        web::post().to(categories::restore_categories_of_hotel),
    )
    .route("/hotels/{id}/rooms/restore", web::post().to(rooms::restore_rooms_of_hotel))
    .route("/hotels/{id}/bookings", web::get().to(bookings::bookings_of_hotel))
    .route("/hotels/{id}/reviews", web::get().to(reviews::reviews_of_hotel))
    .route(
        "/hotels/{id}/reviews/mine",
        web::delete().to(reviews::delete_my_reviews_of_hotel),
    )
    .route(
        "/hotels/{id}/reviews/mine/restore",
        web::post().to(reviews::restore_my_reviews_of_hotel),
    );
}

fn category_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/categories", web::post().to(categories::create_category))
        .route("/categories/availability", web::get().to(categories::hotel_availability))
        .service(
            web::resource("/categories/{id}")
                .route(web::get().to(categories::get_category))
                .route(web::put().to(categories::update_category))
                .route(web::delete().to(categories::delete_category)),
        )
        .route("/categories/{id}/restore", web::post().to(categories::restore_category))
        .service(
            web::resource("/categories/{id}/price")
                .route(web::get().to(categories::get_price))
                .route(web::put().to(categories::update_price)),
        )
        .route(
            "/categories/{id}/availability",
            web::get().to(categories::category_availability),
        )
        .route("/categories/{id}/rooms/count", web::get().to(rooms::count_rooms_of_category))
        .route(
            "/categories/{id}/rooms/restore",
            web::post().to(rooms::restore_rooms_of_category),
        );
}

fn room_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/rooms")
            .route(web::get().to(rooms::list_rooms))
            .route(web::post().to(rooms::create_room)),
    )
    .route("/rooms/batch", web::post().to(rooms::create_rooms))
    .service(
        web::resource("/rooms/{id}")
            .route(web::get().to(rooms::get_room))
            .route(web::put().to(rooms::update_room))
            .route(web::delete().to(rooms::delete_room)),
    )
    .route("/rooms/{id}/restore", web::post().to(rooms::restore_room))
    .route("/rooms/{id}/booking-details", web::get().to(booking_details::details_of_room));
}

/// Hotel and category images share handlers; the resource carries the kind.
fn image_routes(cfg: &mut web::ServiceConfig, kind: ImageKind, collection: &str, owners: &str) {
    let kind = web::Data::new(kind);
    cfg.service(
        web::resource(format!("/{}", collection))
            .app_data(kind.clone())
            .route(web::get().to(images::list_images))
            .route(web::post().to(images::create_image)),
    )
    .service(
        web::resource(format!("/{}/{{id}}", collection))
            .app_data(kind.clone())
            .route(web::get().to(images::get_image))
            .route(web::put().to(images::update_image))
            .route(web::delete().to(images::delete_image)),
    )
    .service(
        web::resource(format!("/{}/{{id}}/images", owners))
            .app_data(kind.clone())
            .route(web::get().to(images::images_of_owner))
            .route(web::delete().to(images::delete_images_of_owner)),
    )
    .service(
        web::resource(format!("/{}/{{id}}/images/restore", owners))
            .app_data(kind)
            .route(web::post().to(images::restore_images_of_owner)),
    );
}

fn booking_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/bookings", web::post().to(bookings::create_booking))
        .route("/bookings/mine", web::get().to(bookings::my_bookings))
        .route("/bookings/mine/history", web::get().to(bookings::my_booking_history))
        .route("/bookings/hotel", web::get().to(bookings::host_bookings))
        .route("/bookings/hotel/history", web::get().to(bookings::host_booking_history))
        .route("/bookings/{id}", web::get().to(bookings::get_booking))
        .route("/bookings/{id}/accept", web::post().to(bookings::accept_booking))
        .route("/bookings/{id}/reject", web::post().to(bookings::reject_booking))
        .route("/bookings/{id}/details", web::get().to(booking_details::details_of_booking))
        .service(
            web::resource("/bookings/{id}/payment")
                .route(web::get().to(payments::payment_of))
                .route(web::delete().to(payments::delete_payment_of)),
        )
        .route("/bookings/{id}/review", web::get().to(reviews::review_of_booking))
        .route("/booking-details", web::get().to(booking_details::list_details))
        .service(
            web::resource("/booking-details/{id}")
                .route(web::get().to(booking_details::get_detail))
                .route(web::delete().to(booking_details::delete_detail)),
        )
        .route(
            "/booking-details/{id}/restore",
            web::post().to(booking_details::restore_detail),
        );
}

fn payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/payments", web::put().to(payments::confirm_payment))
        .service(
            web::resource("/payments/{id}")
                .route(web::get().to(payments::get_payment))
                .route(web::delete().to(payments::delete_payment)),
        );
}

fn review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reviews")
            .route(web::get().to(reviews::list_reviews))
            .route(web::post().to(reviews::create_review)),
    )
    .route("/reviews/mine", web::delete().to(reviews::delete_my_reviews))
    .route("/reviews/mine/restore", web::post().to(reviews::restore_my_reviews))
    .service(
        web::resource("/reviews/{id}")
            .route(web::get().to(reviews::get_review))
            .route(web::put().to(reviews::update_review))
            .route(web::delete().to(reviews::delete_review)),
    )
    .route("/reviews/{id}/restore", web::post().to(reviews::restore_review))
    .service(
        web::resource("/reviews/{id}/replies")
            .route(web::get().to(replies::replies_of_review))
            .route(web::delete().to(replies::delete_replies_of_review)),
    )
    .route(
        "/reviews/{id}/replies/restore",
        web::post().to(replies::restore_replies_of_review),
    );
}

fn reply_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/replies")
            .route(web::get().to(replies::list_replies))
            .route(web::post().to(replies::create_reply)),
    )
    .service(
        web::resource("/replies/{id}")
            .route(web::get().to(replies::get_reply))
            .route(web::put().to(replies::update_reply))
            .route(web::delete().to(replies::delete_reply)),
    )
    .route("/replies/{id}/restore", web::post().to(replies::restore_reply));
}
