use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use database::services::{
    AnalyticsService, CatalogService, ScheduleService,
    catalog::ClassFilter,
    schedule::{NewSchedule, parse_recurrence},
};
use log::info;

use crate::{
    auth::CurrentUser,
    dtos::analytics::{InstructorDashboardResponse, InstructorStatisticsResponse},
    dtos::schedule::{
        CreateScheduleRequest, InstructorScheduleParams, InstructorScheduleResponse,
        ParticipantResponse, ScheduleResponse,
    },
    error::ApiError,
    response::ApiEnvelope,
    routes::class::{convert_to_class_response, convert_to_schedule_response},
    state::AppState,
};

/// Overview of the instructor's classes, upcoming sessions and statistics
#[utoipa::path(
    get,
    path = "/instructor/dashboard",
    responses(
        (status = 200, description = "Instructor dashboard data retrieved successfully", body = InstructorDashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Instructor access required")
    ),
    security(("jwt" = [])),
    tag = "Instructor"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiEnvelope<InstructorDashboardResponse>>, ApiError> {
    current_user.require_instructor()?;

    let now = Utc::now();

    let statistics =
        AnalyticsService::instructor_statistics(&state.db, current_user.id, now).await?;

    let (class_rows, _) = CatalogService::list_classes(
        &state.db,
        ClassFilter {
            instructor_id: Some(current_user.id),
            ..ClassFilter::default()
        },
        1,
        100,
    )
    .await?;
    let classes = CatalogService::load_context(&state.db, class_rows).await?;

    let sessions =
        ScheduleService::instructor_schedules(&state.db, current_user.id, true, now).await?;

    let upcoming_sessions: Vec<ScheduleResponse> = sessions
        .iter()
        .take(10)
        .map(|(schedule, class, _)| convert_to_schedule_response(schedule, Some(class), None))
        .collect();

    let response = InstructorDashboardResponse {
        statistics: convert_statistics(statistics),
        classes: classes
            .into_iter()
            .map(|(class, instructor, category)| {
                convert_to_class_response(&class, Some(&instructor), Some(&category))
            })
            .collect(),
        upcoming_sessions,
    };

    Ok(ApiEnvelope::success(
        "Instructor dashboard data retrieved successfully",
        response,
    ))
}

/// The instructor's sessions with their participants
#[utoipa::path(
    get,
    path = "/instructor/schedules",
    params(InstructorScheduleParams),
    responses(
        (status = 200, description = "Instructor schedules retrieved successfully", body = [InstructorScheduleResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Instructor access required")
    ),
    security(("jwt" = [])),
    tag = "Instructor"
)]
pub async fn get_schedules(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<InstructorScheduleParams>,
) -> Result<Json<ApiEnvelope<Vec<InstructorScheduleResponse>>>, ApiError> {
    current_user.require_instructor()?;

    let rows = ScheduleService::instructor_schedules(
        &state.db,
        current_user.id,
        params.upcoming_only,
        Utc::now(),
    )
    .await?;

    let schedules = rows
        .into_iter()
        .map(|(schedule, class, participants)| InstructorScheduleResponse {
            schedule: convert_to_schedule_response(&schedule, Some(&class), None),
            participants: participants
                .into_iter()
                .map(|(booking, user)| ParticipantResponse {
                    booking_id: booking.id.to_string(),
                    user_id: user.id.to_string(),
                    display_name: user.display_name(),
                    email: user.email,
                    status: booking.status.to_string(),
                    is_waitlisted: booking.is_waitlisted,
                    waitlist_position: booking.waitlist_position,
                })
                .collect(),
        })
        .collect();

    Ok(ApiEnvelope::success(
        "Instructor schedules retrieved successfully",
        schedules,
    ))
}

/// Create a session for one of the instructor's classes, generating
/// recurring instances when requested
#[utoipa::path(
    post,
    path = "/instructor/schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created successfully", body = [ScheduleResponse]),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Instructor access required"),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Instructor"
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<Vec<ScheduleResponse>>>), ApiError> {
    current_user.require_instructor()?;

    let recurrence = parse_recurrence(request.recurrence.as_deref().unwrap_or("none"));

    let created = ScheduleService::create_for_instructor(
        &state.db,
        current_user.id,
        NewSchedule {
            class_id: request.class_id,
            start_time: request.start_time,
            end_time: request.end_time,
            max_capacity: request.max_capacity,
            waitlist_enabled: request.waitlist_enabled,
            recurrence,
            recurrence_end_date: request.recurrence_end_date,
            notes: request.notes,
        },
        Utc::now(),
    )
    .await?;

    info!(
        "instructor {} created {} schedule(s) for class {}",
        current_user.id,
        created.len(),
        request.class_id
    );

    let schedules = created
        .iter()
        .map(|schedule| convert_to_schedule_response(schedule, None, None))
        .collect();

    Ok((
        StatusCode::CREATED,
        ApiEnvelope::success("Schedule created successfully", schedules),
    ))
}

fn convert_statistics(
    statistics: database::services::analytics::InstructorStatistics,
) -> InstructorStatisticsResponse {
    InstructorStatisticsResponse {
        total_classes: statistics.total_classes,
        active_classes: statistics.active_classes,
        featured_classes: statistics.featured_classes,
        total_schedules: statistics.total_schedules,
        upcoming_schedules: statistics.upcoming_schedules,
        total_bookings: statistics.total_bookings,
        active_bookings: statistics.active_bookings,
        completed_bookings: statistics.completed_bookings,
        total_reviews: statistics.total_reviews,
        average_rating: statistics.average_rating,
    }
}
