use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::dtos::{catalog::ClassResponse, schedule::ScheduleResponse};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AnalyticsParams {
    /// Reporting window: week, month or year
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatisticsResponse {
    pub total_users: u64,
    pub active_users: u64,
    pub new_users: u64,
    pub instructors: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassStatisticsResponse {
    pub total_classes: u64,
    pub active_classes: u64,
    pub new_classes: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingStatisticsResponse {
    pub total_bookings: u64,
    pub recent_bookings: u64,
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PopularClassResponse {
    pub class_id: String,
    pub name: String,
    pub instructor_name: String,
    pub booking_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendPointResponse {
    pub date: NaiveDate,
    pub bookings: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAnalyticsResponse {
    pub period: String,
    pub user_statistics: UserStatisticsResponse,
    pub class_statistics: ClassStatisticsResponse,
    pub booking_statistics: BookingStatisticsResponse,
    pub popular_classes: Vec<PopularClassResponse>,
    pub booking_trends: Vec<TrendPointResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorStatisticsResponse {
    pub total_classes: u64,
    pub active_classes: u64,
    pub featured_classes: u64,
    pub total_schedules: u64,
    pub upcoming_schedules: u64,
    pub total_bookings: u64,
    pub active_bookings: u64,
    pub completed_bookings: u64,
    pub total_reviews: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorDashboardResponse {
    pub statistics: InstructorStatisticsResponse,
    pub classes: Vec<ClassResponse>,
    pub upcoming_sessions: Vec<ScheduleResponse>,
}
