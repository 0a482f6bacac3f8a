use crate::entities::{categories, classes, reviews, schedules, users};
use chrono::{DateTime, Utc};
use models::{
    class_options::{DifficultyLevel, LocationType},
    schedule_status::ScheduleStatus,
};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::ServiceError;

/// Filters accepted by the catalog listing and search endpoints
#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub category_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub difficulty: Option<DifficultyLevel>,
    pub location_type: Option<LocationType>,
    pub featured_only: bool,
    pub search: Option<String>,
    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
    pub max_price_cents: Option<i64>,
}

/// Review and session aggregates shown on a class detail
#[derive(Debug, Clone, Default)]
pub struct ClassAggregates {
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub upcoming_sessions: u64,
}

/// A class joined with its instructor and category
pub type ClassWithContext = (classes::Model, users::Model, categories::Model);

pub struct CatalogService;

impl CatalogService {
    /// Active categories in display order, with their active-class counts
    pub async fn list_categories(
        db: &DatabaseConnection,
    ) -> Result<Vec<(categories::Model, u64)>, ServiceError> {
        let rows = categories::Entity::find()
            .filter(categories::Column::IsActive.eq(true))
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(db)
            .await?;

        let class_categories: Vec<Uuid> = classes::Entity::find()
            .select_only()
            .column(classes::Column::CategoryId)
            .filter(classes::Column::IsActive.eq(true))
            .into_tuple()
            .all(db)
            .await?;

        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for category_id in class_categories {
            *counts.entry(category_id).or_default() += 1;
        }

        Ok(rows
            .into_iter()
            .map(|category| {
                let count = counts.get(&category.id).copied().unwrap_or_default();
                (category, count)
            })
            .collect())
    }

    /// One category with its active classes
    pub async fn category_detail(
        db: &DatabaseConnection,
        category_id: Uuid,
    ) -> Result<(categories::Model, Vec<classes::Model>), ServiceError> {
        let category = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or(ServiceError::CategoryNotFound)?;

        let classes = classes::Entity::find()
            .filter(classes::Column::CategoryId.eq(category_id))
            .filter(classes::Column::IsActive.eq(true))
            .order_by_desc(classes::Column::IsFeatured)
            .order_by_desc(classes::Column::CreatedAt)
            .all(db)
            .await?;

        Ok((category, classes))
    }

    /// Query active classes with pagination and filtering
    pub async fn list_classes(
        db: &DatabaseConnection,
        filter: ClassFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<classes::Model>, u64), ServiceError> {
        let mut condition = Condition::all().add(classes::Column::IsActive.eq(true));

        if let Some(category_id) = filter.category_id {
            condition = condition.add(classes::Column::CategoryId.eq(category_id));
        }

        if let Some(instructor_id) = filter.instructor_id {
            condition = condition.add(classes::Column::InstructorId.eq(instructor_id));
        }

        if let Some(difficulty) = filter.difficulty {
            condition = condition.add(classes::Column::Difficulty.eq(difficulty.as_str()));
        }

        if let Some(location_type) = filter.location_type {
            condition = condition.add(classes::Column::LocationType.eq(location_type.as_str()));
        }

        if filter.featured_only {
            condition = condition.add(classes::Column::IsFeatured.eq(true));
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search_condition = Condition::any()
                .add(classes::Column::Name.like(format!("%{search}%")))
                .add(classes::Column::Description.like(format!("%{search}%")));
            condition = condition.add(search_condition);
        }

        if let Some(min_duration) = filter.min_duration {
            condition = condition.add(classes::Column::DurationMinutes.gte(min_duration));
        }

        if let Some(max_duration) = filter.max_duration {
            condition = condition.add(classes::Column::DurationMinutes.lte(max_duration));
        }

        if let Some(max_price) = filter.max_price_cents {
            condition = condition.add(classes::Column::PriceCents.lte(max_price));
        }

        let query = classes::Entity::find()
            .filter(condition)
            .order_by_desc(classes::Column::IsFeatured)
            .order_by_desc(classes::Column::CreatedAt);

        let total_items = query.clone().count(db).await?;
        let paginator = query.paginate(db, per_page);
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total_items))
    }

    /// One class with its instructor and category
    pub async fn class_detail(
        db: &DatabaseConnection,
        class_id: Uuid,
    ) -> Result<ClassWithContext, ServiceError> {
        let class = classes::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or(ServiceError::ClassNotFound)?;

        let instructor = users::Entity::find_by_id(class.instructor_id)
            .one(db)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let category = categories::Entity::find_by_id(class.category_id)
            .one(db)
            .await?
            .ok_or(ServiceError::CategoryNotFound)?;

        Ok((class, instructor, category))
    }

    /// Rating and session aggregates for one class
    pub async fn class_aggregates(
        db: &DatabaseConnection,
        class_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ClassAggregates, ServiceError> {
        let ratings: Vec<i16> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::ClassId.eq(class_id))
            .into_tuple()
            .all(db)
            .await?;

        let average_rating = if ratings.is_empty() {
            None
        } else {
            let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
            // one decimal place, matching the catalog display
            Some((sum as f64 / ratings.len() as f64 * 10.0).round() / 10.0)
        };

        let upcoming_sessions = schedules::Entity::find()
            .filter(schedules::Column::ClassId.eq(class_id))
            .filter(schedules::Column::StartTime.gte(now))
            .filter(schedules::Column::Status.eq(ScheduleStatus::Active))
            .count(db)
            .await?;

        Ok(ClassAggregates {
            average_rating,
            review_count: ratings.len() as u64,
            upcoming_sessions,
        })
    }

    /// Batch-join classes with their instructors and categories for list
    /// responses
    pub async fn load_context(
        db: &DatabaseConnection,
        rows: Vec<classes::Model>,
    ) -> Result<Vec<ClassWithContext>, ServiceError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let instructor_ids: Vec<Uuid> = rows.iter().map(|c| c.instructor_id).collect();
        let category_ids: Vec<Uuid> = rows.iter().map(|c| c.category_id).collect();

        let (instructors, categories) = futures::try_join!(
            users::Entity::find()
                .filter(users::Column::Id.is_in(instructor_ids))
                .all(db),
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(db),
        )?;

        let users_by_id: HashMap<Uuid, users::Model> =
            instructors.into_iter().map(|u| (u.id, u)).collect();
        let categories_by_id: HashMap<Uuid, categories::Model> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        Ok(rows
            .into_iter()
            .filter_map(|class| {
                let instructor = users_by_id.get(&class.instructor_id)?.clone();
                let category = categories_by_id.get(&class.category_id)?.clone();
                Some((class, instructor, category))
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::{CatalogService, ClassFilter};
    use crate::entities::classes;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    fn class_fixture(name: &str) -> classes::Model {
        let now = Utc::now();
        classes::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            category_id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            duration_minutes: 60,
            difficulty: "all_levels".to_string(),
            max_capacity: 20,
            location_type: "in_person".to_string(),
            location_name: String::new(),
            location_address: String::new(),
            requirements: String::new(),
            price_cents: None,
            currency: "USD".to_string(),
            is_active: true,
            is_featured: false,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_classes_reports_total() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![maplit_count(2)]])
            .append_query_results([vec![class_fixture("Yoga"), class_fixture("Pilates")]])
            .into_connection();

        let (rows, total) = CatalogService::list_classes(&db, ClassFilter::default(), 1, 20)
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(rows.len(), 2);
    }

    // COUNT(*) rows come back as a single bigint column named num_items
    fn maplit_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }
}
