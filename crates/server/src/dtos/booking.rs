use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dtos::schedule::ScheduleResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub schedule_id: uuid::Uuid,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct BookingQueryParams {
    /// Filter by booking status: booked, waitlisted, cancelled, completed
    pub status: Option<String>,

    #[serde(default)]
    pub upcoming_only: bool,

    #[serde(default)]
    pub past_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: String,
    pub status: String,
    pub booking_time: DateTime<Utc>,
    pub cancellation_time: Option<DateTime<Utc>>,
    pub is_waitlisted: bool,
    pub waitlist_position: Option<i32>,
    pub class_name: String,
    pub instructor_name: String,
    pub schedule_info: ScheduleResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetailResponse {
    #[serde(flatten)]
    pub booking: BookingResponse,
    pub notes: String,
    pub class_info: ClassInfo,
    pub user_info: UserInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    pub difficulty: String,
    pub location_type: String,
    pub location_name: String,
    pub requirements: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}
