use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use database::{
    entities::users,
    services::{
        UserService,
        user::{NewUser, ProfileUpdate, UserFilter},
    },
};
use log::info;
use models::role::UserRole;
use sea_orm::prelude::Uuid;
use std::str::FromStr;

use crate::{
    auth::{self, CurrentUser},
    dtos::catalog::PaginationMeta,
    dtos::user::{
        ChangePasswordRequest, LoginRequest, PaginatedUsersResponse, RegisterRequest,
        TokenResponse, UpdateProfileRequest, UserQueryParams, UserResponse,
    },
    error::ApiError,
    response::ApiEnvelope,
    state::AppState,
};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a new account
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<UserResponse>>), ApiError> {
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    let role = match request.role.as_deref() {
        None | Some("") => UserRole::User,
        Some(value) => match UserRole::from_str(value) {
            Ok(UserRole::Admin) | Err(()) => {
                return Err(ApiError::Validation(
                    "role must be one of: user, instructor".to_string(),
                ));
            }
            Ok(role) => role,
        },
    };

    let now = Utc::now();
    let password_hash = auth::hash_password(&request.password)?;

    let user = UserService::register(
        &state.db,
        NewUser {
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            role,
            bio: request.bio,
        },
        now,
    )
    .await?;

    info!("registered user {}", user.email);

    Ok((
        StatusCode::CREATED,
        ApiEnvelope::success("User registered successfully", convert_to_user_response(&user)),
    ))
}

/// Verify credentials and issue a bearer token
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiEnvelope<TokenResponse>>, ApiError> {
    let user = UserService::find_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".to_string()))?;

    if !auth::verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("account is disabled".to_string()));
    }

    let now = Utc::now();
    let user = UserService::stamp_last_login(&state.db, user, now).await?;
    let token = state.auth.issue_token(&user, now)?;

    info!("user {} logged in", user.email);

    Ok(ApiEnvelope::success(
        "Login successful",
        TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in_hours: state.auth.token_ttl_hours(),
            user: convert_to_user_response(&user),
        },
    ))
}

/// The authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiEnvelope<UserResponse>>, ApiError> {
    let user = UserService::find_by_id(&state.db, current_user.id).await?;

    Ok(ApiEnvelope::success(
        "Profile retrieved successfully",
        convert_to_user_response(&user),
    ))
}

/// Update profile fields on the authenticated user
#[utoipa::path(
    patch,
    path = "/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiEnvelope<UserResponse>>, ApiError> {
    let user = UserService::update_profile(
        &state.db,
        current_user.id,
        ProfileUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            bio: request.bio,
            profile_picture: request.profile_picture,
        },
        Utc::now(),
    )
    .await?;

    Ok(ApiEnvelope::success(
        "Profile updated successfully",
        convert_to_user_response(&user),
    ))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>, ApiError> {
    if request.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    let user = UserService::find_by_id(&state.db, current_user.id).await?;

    if !auth::verify_password(&request.old_password, &user.password_hash)? {
        return Err(ApiError::Validation(
            "old password is incorrect".to_string(),
        ));
    }

    let new_hash = auth::hash_password(&request.new_password)?;
    UserService::change_password(&state.db, current_user.id, new_hash, Utc::now()).await?;

    Ok(ApiEnvelope::success(
        "Password changed successfully",
        serde_json::json!({}),
    ))
}

/// Paginated user listing for admins
#[utoipa::path(
    get,
    path = "/users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "Users retrieved successfully", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn get_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<ApiEnvelope<PaginatedUsersResponse>>, ApiError> {
    current_user.require_admin()?;

    let role = match params.role.as_deref() {
        None | Some("") => None,
        Some(value) => Some(UserRole::from_str(value).map_err(|_| {
            ApiError::Validation("role must be one of: user, instructor, admin".to_string())
        })?),
    };

    let (rows, total_items) = UserService::list(
        &state.db,
        UserFilter {
            role,
            active_only: params.active_only,
            search: params.search,
        },
        params.page,
        params.per_page,
    )
    .await?;

    let users = rows.iter().map(convert_to_user_response).collect();
    let pagination = PaginationMeta::new(params.page, params.per_page, total_items);

    Ok(ApiEnvelope::success(
        "Users retrieved successfully",
        PaginatedUsersResponse { users, pagination },
    ))
}

/// One user by id, for admins
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<UserResponse>>, ApiError> {
    current_user.require_admin()?;

    let user = UserService::find_by_id(&state.db, id).await?;

    Ok(ApiEnvelope::success(
        "User retrieved successfully",
        convert_to_user_response(&user),
    ))
}

/// Helper function to convert a user row to the API response
pub(crate) fn convert_to_user_response(user: &users::Model) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        full_name: user.full_name(),
        display_name: user.display_name(),
        phone_number: user.phone_number.clone(),
        role: user.role.to_string(),
        is_active: user.is_active,
        is_verified: user.is_verified,
        bio: user.bio.clone(),
        profile_picture: user.profile_picture.clone(),
        date_joined: user.date_joined,
        last_login: user.last_login,
    }
}
