use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use database::services::{
    AnalyticsService,
    analytics::TrendPeriod,
};

use crate::{
    auth::CurrentUser,
    dtos::analytics::{
        AdminAnalyticsResponse, AnalyticsParams, BookingStatisticsResponse,
        ClassStatisticsResponse, PopularClassResponse, TrendPointResponse,
        UserStatisticsResponse,
    },
    error::ApiError,
    response::ApiEnvelope,
    state::AppState,
};

/// Platform-wide statistics and booking trends for admins
#[utoipa::path(
    get,
    path = "/admin/analytics",
    params(AnalyticsParams),
    responses(
        (status = 200, description = "Admin analytics retrieved successfully", body = AdminAnalyticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<ApiEnvelope<AdminAnalyticsResponse>>, ApiError> {
    current_user.require_admin()?;

    let period = TrendPeriod::parse(params.period.as_deref().unwrap_or_default());
    let overview = AnalyticsService::admin_overview(&state.db, period, Utc::now()).await?;

    let response = AdminAnalyticsResponse {
        period: overview.period.as_str().to_string(),
        user_statistics: UserStatisticsResponse {
            total_users: overview.user_statistics.total_users,
            active_users: overview.user_statistics.active_users,
            new_users: overview.user_statistics.new_users,
            instructors: overview.user_statistics.instructors,
        },
        class_statistics: ClassStatisticsResponse {
            total_classes: overview.class_statistics.total_classes,
            active_classes: overview.class_statistics.active_classes,
            new_classes: overview.class_statistics.new_classes,
        },
        booking_statistics: BookingStatisticsResponse {
            total_bookings: overview.booking_statistics.total_bookings,
            recent_bookings: overview.booking_statistics.recent_bookings,
            by_status: overview.booking_statistics.by_status,
        },
        popular_classes: overview
            .popular_classes
            .into_iter()
            .map(|class| PopularClassResponse {
                class_id: class.class_id.to_string(),
                name: class.name,
                instructor_name: class.instructor_name,
                booking_count: class.booking_count,
            })
            .collect(),
        booking_trends: overview
            .booking_trends
            .into_iter()
            .map(|point| TrendPointResponse {
                date: point.date,
                bookings: point.bookings,
            })
            .collect(),
    };

    Ok(ApiEnvelope::success(
        "Admin analytics retrieved successfully",
        response,
    ))
}
