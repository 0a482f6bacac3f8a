use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use database::services::{
    ReviewService, UserService,
    review::NewReview,
};
use log::info;
use sea_orm::prelude::Uuid;

use crate::{
    auth::CurrentUser,
    dtos::review::{
        ClassReviewsResponse, CreateReviewRequest, ReviewQueryParams, ReviewResponse,
        ReviewStatisticsResponse,
    },
    error::ApiError,
    response::ApiEnvelope,
    state::AppState,
};

/// Submit a review for a completed session
#[utoipa::path(
    post,
    path = "/reviews/create",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review submitted successfully", body = ReviewResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schedule not found")
    ),
    security(("jwt" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<ReviewResponse>>), ApiError> {
    let review = ReviewService::create_review(
        &state.db,
        current_user.id,
        NewReview {
            schedule_id: request.schedule_id,
            rating: request.rating,
            review: request.review,
        },
        Utc::now(),
    )
    .await?;

    info!(
        "user {} reviewed schedule {} ({} stars)",
        current_user.id, review.schedule_id, review.rating
    );

    let user = UserService::find_by_id(&state.db, current_user.id).await?;

    let response = ReviewResponse {
        id: review.id.to_string(),
        rating: review.rating,
        review: review.review,
        user_name: user.display_name(),
        class_name: None,
        created_at: review.created_at,
    };

    Ok((
        StatusCode::CREATED,
        ApiEnvelope::success("Review submitted successfully", response),
    ))
}

/// The requester's reviews, newest first
#[utoipa::path(
    get,
    path = "/reviews/my-reviews",
    responses(
        (status = 200, description = "User reviews retrieved successfully", body = [ReviewResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "Reviews"
)]
pub async fn get_my_reviews(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiEnvelope<Vec<ReviewResponse>>>, ApiError> {
    let user = UserService::find_by_id(&state.db, current_user.id).await?;
    let rows = ReviewService::list_for_user(&state.db, current_user.id).await?;

    let reviews = rows
        .into_iter()
        .map(|(review, class)| ReviewResponse {
            id: review.id.to_string(),
            rating: review.rating,
            review: review.review,
            user_name: user.display_name(),
            class_name: Some(class.name),
            created_at: review.created_at,
        })
        .collect();

    Ok(ApiEnvelope::success(
        "User reviews retrieved successfully",
        reviews,
    ))
}

/// Reviews for one class with rating statistics; public
#[utoipa::path(
    get,
    path = "/reviews/class/{class_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class ID"),
        ReviewQueryParams
    ),
    responses(
        (status = 200, description = "Class reviews retrieved successfully", body = ClassReviewsResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reviews"
)]
pub async fn get_class_reviews(
    State(state): State<AppState>,
    Path(class_id): Path<Uuid>,
    Query(params): Query<ReviewQueryParams>,
) -> Result<Json<ApiEnvelope<ClassReviewsResponse>>, ApiError> {
    let (rows, statistics) =
        ReviewService::list_for_class(&state.db, class_id, params.min_rating, params.max_rating)
            .await?;

    let reviews = rows
        .into_iter()
        .map(|(review, user)| ReviewResponse {
            id: review.id.to_string(),
            rating: review.rating,
            review: review.review,
            user_name: user.display_name(),
            class_name: None,
            created_at: review.created_at,
        })
        .collect();

    let response = ClassReviewsResponse {
        reviews,
        statistics: ReviewStatisticsResponse {
            total_reviews: statistics.total_reviews,
            average_rating: statistics.average_rating,
            rating_distribution: statistics.rating_distribution,
        },
    };

    Ok(ApiEnvelope::success(
        "Class reviews retrieved successfully",
        response,
    ))
}
