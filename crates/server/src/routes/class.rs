use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveTime, TimeZone, Utc};
use database::{
    entities::{categories, classes, schedules, users},
    services::{CatalogService, ScheduleService, catalog::ClassFilter},
};
use models::class_options::{DifficultyLevel, LocationType};
use sea_orm::prelude::Uuid;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    dtos::catalog::{
        ClassDetailResponse, ClassQueryParams, ClassResponse, PaginatedClassesResponse,
        PaginationMeta,
    },
    dtos::schedule::{AvailabilityResponse, CalendarDayResponse, CalendarParams, ScheduleResponse},
    error::ApiError,
    response::ApiEnvelope,
    state::AppState,
};

/// Paginated catalog of active classes
#[utoipa::path(
    get,
    path = "/classes",
    params(ClassQueryParams),
    responses(
        (status = 200, description = "Classes retrieved successfully", body = PaginatedClassesResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_classes(
    State(state): State<AppState>,
    Query(params): Query<ClassQueryParams>,
) -> Result<Json<ApiEnvelope<PaginatedClassesResponse>>, ApiError> {
    list_classes(state, params, "Classes retrieved successfully").await
}

/// Multi-parameter class search; same filters as the catalog listing plus
/// duration and price bounds
#[utoipa::path(
    get,
    path = "/classes/search",
    params(ClassQueryParams),
    responses(
        (status = 200, description = "Search results retrieved successfully", body = PaginatedClassesResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn search_classes(
    State(state): State<AppState>,
    Query(params): Query<ClassQueryParams>,
) -> Result<Json<ApiEnvelope<PaginatedClassesResponse>>, ApiError> {
    list_classes(state, params, "Search results retrieved successfully").await
}

async fn list_classes(
    state: AppState,
    params: ClassQueryParams,
    message: &str,
) -> Result<Json<ApiEnvelope<PaginatedClassesResponse>>, ApiError> {
    let filter = convert_filter(&params)?;

    let (rows, total_items) =
        CatalogService::list_classes(&state.db, filter, params.page, params.per_page).await?;
    let joined = CatalogService::load_context(&state.db, rows).await?;

    let classes = joined
        .into_iter()
        .map(|(class, instructor, category)| {
            convert_to_class_response(&class, Some(&instructor), Some(&category))
        })
        .collect();

    let pagination = PaginationMeta::new(params.page, params.per_page, total_items);

    Ok(ApiEnvelope::success(
        message,
        PaginatedClassesResponse { classes, pagination },
    ))
}

/// One class with rating aggregates and upcoming session count
#[utoipa::path(
    get,
    path = "/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class retrieved successfully", body = ClassDetailResponse),
        (status = 404, description = "Class not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_class_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<ClassDetailResponse>>, ApiError> {
    let (class, instructor, category) = CatalogService::class_detail(&state.db, id).await?;
    let aggregates = CatalogService::class_aggregates(&state.db, id, Utc::now()).await?;

    let response = ClassDetailResponse {
        class: convert_to_class_response(&class, Some(&instructor), Some(&category)),
        location_address: class.location_address.clone(),
        average_rating: aggregates.average_rating,
        review_count: aggregates.review_count,
        upcoming_sessions: aggregates.upcoming_sessions,
    };

    Ok(ApiEnvelope::success(
        "Class retrieved successfully",
        response,
    ))
}

/// Active sessions in a date range, grouped by day
#[utoipa::path(
    get,
    path = "/classes/calendar",
    params(CalendarParams),
    responses(
        (status = 200, description = "Calendar retrieved successfully", body = [CalendarDayResponse]),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<ApiEnvelope<Vec<CalendarDayResponse>>>, ApiError> {
    if params.end_date < params.start_date {
        return Err(ApiError::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let from = Utc.from_utc_datetime(&params.start_date.and_time(NaiveTime::MIN));
    let to = Utc.from_utc_datetime(
        &params
            .end_date
            .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)),
    );

    let sessions =
        ScheduleService::in_range(&state.db, from, to, params.class_id, params.category_id)
            .await?;

    let mut days: BTreeMap<chrono::NaiveDate, Vec<ScheduleResponse>> = BTreeMap::new();
    for (schedule, class, instructor) in sessions {
        days.entry(schedule.start_time.date_naive())
            .or_default()
            .push(convert_to_schedule_response(
                &schedule,
                Some(&class),
                Some(&instructor),
            ));
    }

    let calendar = days
        .into_iter()
        .map(|(date, sessions)| CalendarDayResponse { date, sessions })
        .collect();

    Ok(ApiEnvelope::success(
        "Calendar retrieved successfully",
        calendar,
    ))
}

/// Capacity and availability snapshot for one session
#[utoipa::path(
    get,
    path = "/classes/schedule/{id}",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Availability retrieved successfully", body = AvailabilityResponse),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_schedule_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<AvailabilityResponse>>, ApiError> {
    let (schedule, class, instructor) = ScheduleService::availability(&state.db, id).await?;

    let response = AvailabilityResponse {
        schedule: convert_to_schedule_response(&schedule, Some(&class), Some(&instructor)),
        recurrence: schedule.recurrence.clone(),
        notes: schedule.notes.clone(),
    };

    Ok(ApiEnvelope::success(
        "Availability retrieved successfully",
        response,
    ))
}

fn convert_filter(params: &ClassQueryParams) -> Result<ClassFilter, ApiError> {
    let difficulty = match params.difficulty.as_deref() {
        None | Some("") => None,
        Some(value) => Some(DifficultyLevel::from_str(value).map_err(|_| {
            ApiError::Validation(
                "difficulty must be one of: beginner, intermediate, advanced, all_levels"
                    .to_string(),
            )
        })?),
    };

    let location_type = match params.location_type.as_deref() {
        None | Some("") => None,
        Some(value) => Some(LocationType::from_str(value).map_err(|_| {
            ApiError::Validation(
                "location_type must be one of: in_person, virtual, hybrid".to_string(),
            )
        })?),
    };

    Ok(ClassFilter {
        category_id: params.category,
        instructor_id: params.instructor,
        difficulty,
        location_type,
        featured_only: params.featured_only,
        search: params.search.clone(),
        min_duration: params.min_duration,
        max_duration: params.max_duration,
        max_price_cents: params.max_price_cents,
    })
}

/// Helper function to convert a class row to the API response
pub(crate) fn convert_to_class_response(
    class: &classes::Model,
    instructor: Option<&users::Model>,
    category: Option<&categories::Model>,
) -> ClassResponse {
    ClassResponse {
        id: class.id.to_string(),
        name: class.name.clone(),
        description: class.description.clone(),
        category_id: class.category_id.to_string(),
        category_name: category.map(|c| c.name.clone()),
        instructor_id: class.instructor_id.to_string(),
        instructor_name: instructor.map(|u| u.display_name()),
        duration_minutes: class.duration_minutes,
        difficulty: class.difficulty.clone(),
        max_capacity: class.max_capacity,
        location_type: class.location_type.clone(),
        location_name: class.location_name.clone(),
        requirements: class.requirements.clone(),
        price_cents: class.price_cents,
        currency: class.currency.clone(),
        is_featured: class.is_featured,
        image_url: class.image_url.clone(),
    }
}

/// Helper function to convert a schedule row to the API response
pub(crate) fn convert_to_schedule_response(
    schedule: &schedules::Model,
    class: Option<&classes::Model>,
    instructor: Option<&users::Model>,
) -> ScheduleResponse {
    ScheduleResponse {
        id: schedule.id.to_string(),
        class_id: schedule.class_id.to_string(),
        class_name: class.map(|c| c.name.clone()),
        instructor_name: instructor.map(|u| u.display_name()),
        start_time: schedule.start_time,
        end_time: schedule.end_time,
        max_capacity: schedule.max_capacity,
        booked_slots: schedule.booked_slots,
        available_slots: schedule.available_slots(),
        is_full: schedule.is_full(),
        waitlist_enabled: schedule.waitlist_enabled,
        status: schedule.status.to_string(),
    }
}
