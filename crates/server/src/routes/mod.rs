use axum::{
    Router,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{doc::ApiDoc, state::AppState};

pub mod admin;
pub mod booking;
pub mod category;
pub mod class;
pub mod health;
pub mod instructor;
pub mod review;
pub mod root;
pub mod user;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route(
            "/users/profile",
            get(user::get_profile).patch(user::update_profile),
        )
        .route("/users/change-password", post(user::change_password))
        .route("/users", get(user::get_users))
        .route("/users/{id}", get(user::get_user_by_id))
        .route("/categories", get(category::get_categories))
        .route("/categories/{id}", get(category::get_category_by_id))
        .route("/classes", get(class::get_classes))
        .route("/classes/search", get(class::search_classes))
        .route("/classes/calendar", get(class::get_calendar))
        .route(
            "/classes/schedule/{id}",
            get(class::get_schedule_availability),
        )
        .route("/classes/{id}", get(class::get_class_by_id))
        .route("/bookings/create", post(booking::create_booking))
        .route("/bookings/my-bookings", get(booking::get_my_bookings))
        .route(
            "/bookings/my-bookings/{id}",
            get(booking::get_booking_by_id),
        )
        .route(
            "/bookings/schedule/{schedule_id}",
            get(booking::get_booking_for_schedule),
        )
        .route("/bookings/{id}/update", patch(booking::update_booking))
        .route("/bookings/{id}/cancel", patch(booking::cancel_booking))
        .route("/reviews/create", post(review::create_review))
        .route("/reviews/my-reviews", get(review::get_my_reviews))
        .route("/reviews/class/{class_id}", get(review::get_class_reviews))
        .route("/instructor/dashboard", get(instructor::get_dashboard))
        .route(
            "/instructor/schedules",
            get(instructor::get_schedules).post(instructor::create_schedule),
        )
        .route("/admin/analytics", get(admin::get_analytics))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()))
        .with_state(state)
}
