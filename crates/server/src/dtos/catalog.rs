use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub sort_order: i32,
    pub class_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDetailResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub classes: Vec<ClassResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: String,
    pub category_name: Option<String>,
    pub instructor_id: String,
    pub instructor_name: Option<String>,
    pub duration_minutes: i32,
    pub difficulty: String,
    pub max_capacity: i32,
    pub location_type: String,
    pub location_name: String,
    pub requirements: String,
    pub price_cents: Option<i64>,
    pub currency: String,
    pub is_featured: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassDetailResponse {
    #[serde(flatten)]
    pub class: ClassResponse,
    pub location_address: String,
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub upcoming_sessions: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub classes: Vec<ClassResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(per_page.max(1));
        Self {
            page,
            per_page,
            total_pages,
            total_items,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ClassQueryParams {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u64,

    pub category: Option<uuid::Uuid>,
    pub instructor: Option<uuid::Uuid>,
    pub difficulty: Option<String>,
    pub location_type: Option<String>,
    pub search: Option<String>,

    #[serde(default)]
    pub featured_only: bool,

    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
    pub max_price_cents: Option<i64>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[cfg(test)]
mod test {
    use super::PaginationMeta;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(1, 20, 41);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = PaginationMeta::new(3, 20, 41);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_pagination_meta_empty() {
        let meta = PaginationMeta::new(1, 20, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
    }
}
