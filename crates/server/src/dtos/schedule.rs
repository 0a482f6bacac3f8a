use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub id: String,
    pub class_id: String,
    pub class_name: Option<String>,
    pub instructor_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub booked_slots: i32,
    pub available_slots: i32,
    pub is_full: bool,
    pub waitlist_enabled: bool,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    #[serde(flatten)]
    pub schedule: ScheduleResponse,
    pub recurrence: String,
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CalendarParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub class_id: Option<uuid::Uuid>,
    pub category_id: Option<uuid::Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarDayResponse {
    pub date: NaiveDate,
    pub sessions: Vec<ScheduleResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScheduleRequest {
    pub class_id: uuid::Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    #[serde(default = "default_waitlist_enabled")]
    pub waitlist_enabled: bool,
    #[serde(default)]
    pub recurrence: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

fn default_waitlist_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct InstructorScheduleParams {
    #[serde(default)]
    pub upcoming_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub booking_id: String,
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub status: String,
    pub is_waitlisted: bool,
    pub waitlist_position: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorScheduleResponse {
    #[serde(flatten)]
    pub schedule: ScheduleResponse,
    pub participants: Vec<ParticipantResponse>,
}
