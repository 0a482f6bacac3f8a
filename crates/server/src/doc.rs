use crate::routes::{admin, booking, category, class, health, instructor, review, root, user};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        user::register,
        user::login,
        user::get_profile,
        user::update_profile,
        user::change_password,
        user::get_users,
        user::get_user_by_id,
        category::get_categories,
        category::get_category_by_id,
        class::get_classes,
        class::search_classes,
        class::get_class_by_id,
        class::get_calendar,
        class::get_schedule_availability,
        booking::create_booking,
        booking::get_my_bookings,
        booking::get_booking_by_id,
        booking::get_booking_for_schedule,
        booking::update_booking,
        booking::cancel_booking,
        review::create_review,
        review::get_my_reviews,
        review::get_class_reviews,
        instructor::get_dashboard,
        instructor::get_schedules,
        instructor::create_schedule,
        admin::get_analytics
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Users", description = "Account lifecycle and profile endpoints"),
        (name = "Catalog", description = "Class catalog and schedule browsing"),
        (name = "Bookings", description = "Booking, waitlist and cancellation endpoints"),
        (name = "Reviews", description = "Class review endpoints"),
        (name = "Instructor", description = "Instructor dashboard endpoints"),
        (name = "Admin", description = "Admin analytics endpoints"),
    ),
    info(
        title = "Get Fit API",
        version = "1.0.0",
        description = "Fitness class booking platform API",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
