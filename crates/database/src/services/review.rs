use crate::entities::{bookings, classes, reviews, schedules, users};
use chrono::{DateTime, Utc};
use models::booking_status::BookingStatus;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::ServiceError;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Input for a review submission
#[derive(Debug, Clone)]
pub struct NewReview {
    pub schedule_id: Uuid,
    pub rating: i16,
    pub review: String,
}

/// Aggregates over one class's reviews
#[derive(Debug, Clone)]
pub struct ReviewStatistics {
    pub total_reviews: u64,
    pub average_rating: Option<f64>,
    /// Count of reviews per rating value, keyed "1" through "5"
    pub rating_distribution: BTreeMap<String, u64>,
}

pub struct ReviewService;

impl ReviewService {
    /// Accept a review for a session the user attended.
    ///
    /// A confirmed booking whose session has already started counts as
    /// attended and is stamped completed here, since booking completion is
    /// derived from the session's own completion. The class reference is
    /// denormalized from the schedule at creation so aggregates survive
    /// schedule mutation.
    pub async fn create_review(
        db: &DatabaseConnection,
        user_id: Uuid,
        request: NewReview,
        now: DateTime<Utc>,
    ) -> Result<reviews::Model, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(ServiceError::Invalid(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let schedule = schedules::Entity::find_by_id(request.schedule_id)
            .one(db)
            .await?
            .ok_or(ServiceError::ScheduleNotFound)?;

        let booking = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .filter(bookings::Column::ScheduleId.eq(request.schedule_id))
            .one(db)
            .await?;

        match booking {
            Some(booking) if booking.status == BookingStatus::Completed => {}
            Some(booking)
                if booking.status == BookingStatus::Booked && schedule.start_time < now =>
            {
                let mut update: bookings::ActiveModel = booking.into();
                update.status = Set(BookingStatus::Completed);
                update.updated_at = Set(now);
                update.update(db).await?;
            }
            _ => return Err(ServiceError::ReviewNotEligible),
        }

        let existing = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::ScheduleId.eq(request.schedule_id))
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::DuplicateReview);
        }

        let review = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            schedule_id: Set(request.schedule_id),
            class_id: Set(schedule.class_id),
            rating: Set(request.rating),
            review: Set(request.review),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(review)
    }

    /// Reviews for one class, newest first, with rating statistics
    pub async fn list_for_class(
        db: &DatabaseConnection,
        class_id: Uuid,
        min_rating: Option<i16>,
        max_rating: Option<i16>,
    ) -> Result<(Vec<(reviews::Model, users::Model)>, ReviewStatistics), ServiceError> {
        let mut query = reviews::Entity::find().filter(reviews::Column::ClassId.eq(class_id));

        if let Some(min_rating) = min_rating {
            query = query.filter(reviews::Column::Rating.gte(min_rating));
        }

        if let Some(max_rating) = max_rating {
            query = query.filter(reviews::Column::Rating.lte(max_rating));
        }

        let rows = query
            .order_by_desc(reviews::Column::CreatedAt)
            .all(db)
            .await?;

        let statistics = Self::statistics(&rows);

        let user_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        let users = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?;

        let users_by_id: HashMap<Uuid, users::Model> =
            users.into_iter().map(|u| (u.id, u)).collect();

        let joined = rows
            .into_iter()
            .filter_map(|review| {
                let user = users_by_id.get(&review.user_id)?.clone();
                Some((review, user))
            })
            .collect();

        Ok((joined, statistics))
    }

    /// The user's own reviews, newest first, with the reviewed classes
    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<(reviews::Model, classes::Model)>, ServiceError> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(db)
            .await?;

        let class_ids: Vec<Uuid> = rows.iter().map(|r| r.class_id).collect();
        let classes = classes::Entity::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(db)
            .await?;

        let classes_by_id: HashMap<Uuid, classes::Model> =
            classes.into_iter().map(|c| (c.id, c)).collect();

        Ok(rows
            .into_iter()
            .filter_map(|review| {
                let class = classes_by_id.get(&review.class_id)?.clone();
                Some((review, class))
            })
            .collect())
    }

    fn statistics(rows: &[reviews::Model]) -> ReviewStatistics {
        let mut rating_distribution: BTreeMap<String, u64> = (MIN_RATING..=MAX_RATING)
            .map(|rating| (rating.to_string(), 0))
            .collect();

        for review in rows {
            *rating_distribution
                .entry(review.rating.to_string())
                .or_default() += 1;
        }

        let average_rating = if rows.is_empty() {
            None
        } else {
            let sum: i64 = rows.iter().map(|r| r.rating as i64).sum();
            Some((sum as f64 / rows.len() as f64 * 10.0).round() / 10.0)
        };

        ReviewStatistics {
            total_reviews: rows.len() as u64,
            average_rating,
            rating_distribution,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{NewReview, ReviewService};
    use crate::entities::{bookings, reviews, schedules};
    use crate::services::ServiceError;
    use chrono::{Duration, Utc};
    use models::{booking_status::BookingStatus, schedule_status::ScheduleStatus};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    fn schedule_fixture() -> schedules::Model {
        let now = Utc::now();
        schedules::Model {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            start_time: now - Duration::days(1),
            end_time: now - Duration::days(1) + Duration::minutes(60),
            max_capacity: 10,
            booked_slots: 5,
            waitlist_enabled: true,
            recurrence: "none".to_string(),
            recurrence_end_date: None,
            parent_schedule_id: None,
            status: ScheduleStatus::Completed,
            notes: String::new(),
            cancellation_reason: String::new(),
            created_at: now - Duration::days(30),
            updated_at: now - Duration::days(1),
        }
    }

    fn completed_booking(user_id: Uuid, schedule_id: Uuid) -> bookings::Model {
        let now = Utc::now();
        bookings::Model {
            id: Uuid::new_v4(),
            user_id,
            schedule_id,
            status: BookingStatus::Completed,
            booking_time: now - Duration::days(10),
            cancellation_time: None,
            is_waitlisted: false,
            waitlist_position: None,
            notes: String::new(),
            created_at: now - Duration::days(10),
            updated_at: now - Duration::days(1),
        }
    }

    #[tokio::test]
    async fn test_review_requires_completed_booking() {
        let now = Utc::now();
        let schedule = schedule_fixture();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .into_connection();

        let request = NewReview {
            schedule_id: schedule.id,
            rating: 5,
            review: "great session".to_string(),
        };
        let result = ReviewService::create_review(&db, Uuid::new_v4(), request, now).await;

        assert!(matches!(result, Err(ServiceError::ReviewNotEligible)));
    }

    #[tokio::test]
    async fn test_second_review_rejected() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let schedule = schedule_fixture();

        let existing = reviews::Model {
            id: Uuid::new_v4(),
            user_id,
            schedule_id: schedule.id,
            class_id: schedule.class_id,
            rating: 4,
            review: String::new(),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([vec![completed_booking(user_id, schedule.id)]])
            .append_query_results([vec![existing]])
            .into_connection();

        let request = NewReview {
            schedule_id: schedule.id,
            rating: 5,
            review: String::new(),
        };
        let result = ReviewService::create_review(&db, user_id, request, now).await;

        assert!(matches!(result, Err(ServiceError::DuplicateReview)));
    }

    #[tokio::test]
    async fn test_booked_seat_on_past_session_becomes_completed() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let schedule = schedule_fixture();

        let mut booking = completed_booking(user_id, schedule.id);
        booking.status = BookingStatus::Booked;

        let mut completed = booking.clone();
        completed.status = BookingStatus::Completed;

        let inserted = reviews::Model {
            id: Uuid::new_v4(),
            user_id,
            schedule_id: schedule.id,
            class_id: schedule.class_id,
            rating: 5,
            review: "great session".to_string(),
            created_at: now,
            updated_at: now,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([vec![booking]])
            .append_query_results([vec![completed]])
            .append_query_results([Vec::<reviews::Model>::new()])
            .append_query_results([vec![inserted]])
            .into_connection();

        let request = NewReview {
            schedule_id: schedule.id,
            rating: 5,
            review: "great session".to_string(),
        };
        let review = ReviewService::create_review(&db, user_id, request, now)
            .await
            .unwrap();

        assert_eq!(review.class_id, schedule.class_id);
        assert_eq!(review.rating, 5);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let request = NewReview {
            schedule_id: Uuid::new_v4(),
            rating: 6,
            review: String::new(),
        };
        let result = ReviewService::create_review(&db, Uuid::new_v4(), request, now).await;

        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }
}
