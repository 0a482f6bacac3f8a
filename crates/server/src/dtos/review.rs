use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub schedule_id: uuid::Uuid,
    pub rating: i16,
    #[serde(default)]
    pub review: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ReviewQueryParams {
    pub min_rating: Option<i16>,
    pub max_rating: Option<i16>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub rating: i16,
    pub review: String,
    pub user_name: String,
    pub class_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewStatisticsResponse {
    pub total_reviews: u64,
    pub average_rating: Option<f64>,
    pub rating_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub statistics: ReviewStatisticsResponse,
}
