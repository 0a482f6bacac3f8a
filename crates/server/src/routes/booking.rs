use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use database::{
    entities::users,
    services::{
        BookingService, UserService,
        booking::{BookingFilter, BookingWithContext, NewBooking},
    },
};
use log::info;
use models::booking_status::BookingStatus;
use sea_orm::prelude::Uuid;
use std::str::FromStr;

use crate::{
    auth::CurrentUser,
    dtos::booking::{
        BookingDetailResponse, BookingQueryParams, BookingResponse, CancelBookingRequest,
        ClassInfo, CreateBookingRequest, UpdateBookingRequest, UserInfo,
    },
    error::ApiError,
    response::ApiEnvelope,
    routes::class::convert_to_schedule_response,
    state::AppState,
};

/// Create a booking: a confirmed seat while capacity remains, a waitlist
/// entry when the session is full and waitlisting is enabled
#[utoipa::path(
    post,
    path = "/bookings/create",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created successfully", body = BookingDetailResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schedule not found")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<BookingDetailResponse>>), ApiError> {
    let now = Utc::now();

    let (booking, _) = BookingService::create_booking(
        &state.db,
        current_user.id,
        NewBooking {
            schedule_id: request.schedule_id,
            notes: request.notes,
        },
        now,
    )
    .await?;

    let message = if booking.is_waitlisted {
        format!(
            "Booking added to waitlist (position: {})",
            booking.waitlist_position.unwrap_or_default()
        )
    } else {
        "Booking created successfully".to_string()
    };

    info!(
        "user {} booked schedule {} ({})",
        current_user.id, booking.schedule_id, booking.status
    );

    let owner = UserService::find_by_id(&state.db, current_user.id).await?;
    let detail = BookingService::find_for_user(&state.db, current_user.id, booking.id).await?;

    Ok((
        StatusCode::CREATED,
        ApiEnvelope::success(&message, convert_to_booking_detail(detail, &owner)),
    ))
}

/// List the requester's bookings, filterable by status and upcoming/past
#[utoipa::path(
    get,
    path = "/bookings/my-bookings",
    params(BookingQueryParams),
    responses(
        (status = 200, description = "User bookings retrieved successfully", body = [BookingResponse]),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn get_my_bookings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<BookingQueryParams>,
) -> Result<Json<ApiEnvelope<Vec<BookingResponse>>>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(value) => Some(BookingStatus::from_str(value).map_err(|_| {
            ApiError::Validation(
                "status must be one of: booked, waitlisted, cancelled, completed".to_string(),
            )
        })?),
    };

    let rows = BookingService::list_for_user(
        &state.db,
        current_user.id,
        BookingFilter {
            status,
            upcoming_only: params.upcoming_only,
            past_only: params.past_only,
        },
        Utc::now(),
    )
    .await?;

    let bookings = rows.into_iter().map(convert_to_booking_response).collect();

    Ok(ApiEnvelope::success(
        "User bookings retrieved successfully",
        bookings,
    ))
}

/// Detailed information about one of the requester's bookings
#[utoipa::path(
    get,
    path = "/bookings/my-bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details retrieved successfully", body = BookingDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Booking not found")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn get_booking_by_id(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<BookingDetailResponse>>, ApiError> {
    let owner = UserService::find_by_id(&state.db, current_user.id).await?;
    let detail = BookingService::find_for_user(&state.db, current_user.id, id).await?;

    Ok(ApiEnvelope::success(
        "Booking details retrieved successfully",
        convert_to_booking_detail(detail, &owner),
    ))
}

/// The requester's booking for one schedule
#[utoipa::path(
    get,
    path = "/bookings/schedule/{schedule_id}",
    params(("schedule_id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Booking information retrieved successfully", body = BookingDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No booking found for this class schedule")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn get_booking_for_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<BookingDetailResponse>>, ApiError> {
    let owner = UserService::find_by_id(&state.db, current_user.id).await?;
    let detail =
        BookingService::find_for_schedule(&state.db, current_user.id, schedule_id).await?;

    Ok(ApiEnvelope::success(
        "Booking information retrieved successfully",
        convert_to_booking_detail(detail, &owner),
    ))
}

/// Edit the notes on an open booking
#[utoipa::path(
    patch,
    path = "/bookings/{id}/update",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated successfully", body = BookingDetailResponse),
        (status = 400, description = "Booking is cancelled or completed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Booking not found")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<ApiEnvelope<BookingDetailResponse>>, ApiError> {
    let booking =
        BookingService::update_notes(&state.db, current_user.id, id, request.notes, Utc::now())
            .await?;

    let owner = UserService::find_by_id(&state.db, current_user.id).await?;
    let detail = BookingService::find_for_user(&state.db, current_user.id, booking.id).await?;

    Ok(ApiEnvelope::success(
        "Booking updated successfully",
        convert_to_booking_detail(detail, &owner),
    ))
}

/// Cancel a booking, subject to the cancellation window
#[utoipa::path(
    patch,
    path = "/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking cancelled successfully", body = BookingDetailResponse),
        (status = 400, description = "Cancellation not allowed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Booking not found")
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<ApiEnvelope<BookingDetailResponse>>, ApiError> {
    let (booking, _) = BookingService::cancel_booking(
        &state.db,
        current_user.id,
        id,
        request.cancellation_reason,
        &state.cancellation_policy,
        Utc::now(),
    )
    .await?;

    info!(
        "user {} cancelled booking {} on schedule {}",
        current_user.id, booking.id, booking.schedule_id
    );

    let owner = UserService::find_by_id(&state.db, current_user.id).await?;
    let detail = BookingService::find_for_user(&state.db, current_user.id, booking.id).await?;

    Ok(ApiEnvelope::success(
        "Booking cancelled successfully",
        convert_to_booking_detail(detail, &owner),
    ))
}

/// Helper function to convert a joined booking row to the list response
fn convert_to_booking_response(row: BookingWithContext) -> BookingResponse {
    let (booking, schedule, class, instructor) = row;

    BookingResponse {
        id: booking.id.to_string(),
        status: booking.status.to_string(),
        booking_time: booking.booking_time,
        cancellation_time: booking.cancellation_time,
        is_waitlisted: booking.is_waitlisted,
        waitlist_position: booking.waitlist_position,
        class_name: class.name.clone(),
        instructor_name: instructor.display_name(),
        schedule_info: convert_to_schedule_response(&schedule, Some(&class), Some(&instructor)),
    }
}

/// Helper function to convert a joined booking row to the detail response
fn convert_to_booking_detail(row: BookingWithContext, owner: &users::Model) -> BookingDetailResponse {
    let (booking, schedule, class, instructor) = row;

    let summary = convert_to_booking_response((
        booking.clone(),
        schedule,
        class.clone(),
        instructor,
    ));

    BookingDetailResponse {
        booking: summary,
        notes: booking.notes,
        class_info: ClassInfo {
            id: class.id.to_string(),
            name: class.name,
            description: class.description,
            duration_minutes: class.duration_minutes,
            difficulty: class.difficulty,
            location_type: class.location_type,
            location_name: class.location_name,
            requirements: class.requirements,
            image_url: class.image_url,
        },
        user_info: UserInfo {
            id: owner.id.to_string(),
            email: owner.email.clone(),
            full_name: owner.full_name(),
        },
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    }
}
