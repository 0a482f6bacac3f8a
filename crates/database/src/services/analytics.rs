use crate::entities::{bookings, classes, reviews, schedules, users};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use models::{booking_status::BookingStatus, role::UserRole, schedule_status::ScheduleStatus};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Alias, Expr},
};
use std::collections::{BTreeMap, HashMap};
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::ServiceError;

/// Reporting window for the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendPeriod {
    Week,
    #[default]
    Month,
    Year,
}

impl TrendPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// Unknown values fall back to the monthly window
    pub fn parse(value: &str) -> Self {
        match value {
            "week" => Self::Week,
            "year" => Self::Year,
            _ => Self::Month,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserStatistics {
    pub total_users: u64,
    pub active_users: u64,
    pub new_users: u64,
    pub instructors: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ClassStatistics {
    pub total_classes: u64,
    pub active_classes: u64,
    pub new_classes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BookingStatistics {
    pub total_bookings: u64,
    pub recent_bookings: u64,
    /// Count per booking status, keyed by the stored status value
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct PopularClass {
    pub class_id: Uuid,
    pub name: String,
    pub instructor_name: String,
    pub booking_count: i64,
}

#[derive(Debug, Clone)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub bookings: u64,
}

#[derive(Debug, Clone)]
pub struct AdminOverview {
    pub period: TrendPeriod,
    pub user_statistics: UserStatistics,
    pub class_statistics: ClassStatistics,
    pub booking_statistics: BookingStatistics,
    pub popular_classes: Vec<PopularClass>,
    pub booking_trends: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct InstructorStatistics {
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

pub struct AnalyticsService;

impl AnalyticsService {
    const POPULAR_CLASSES_LIMIT: u64 = 10;

    /// Read-only aggregates for the admin dashboard
    pub async fn admin_overview(
        db: &DatabaseConnection,
        period: TrendPeriod,
        now: DateTime<Utc>,
    ) -> Result<AdminOverview, ServiceError> {
        let start = now - Duration::days(period.days());

        let user_statistics = UserStatistics {
            total_users: users::Entity::find().count(db).await?,
            active_users: users::Entity::find()
                .filter(users::Column::IsActive.eq(true))
                .count(db)
                .await?,
            new_users: users::Entity::find()
                .filter(users::Column::DateJoined.gte(start))
                .count(db)
                .await?,
            instructors: users::Entity::find()
                .filter(users::Column::Role.eq(UserRole::Instructor))
                .count(db)
                .await?,
        };

        let class_statistics = ClassStatistics {
            total_classes: classes::Entity::find().count(db).await?,
            active_classes: classes::Entity::find()
                .filter(classes::Column::IsActive.eq(true))
                .count(db)
                .await?,
            new_classes: classes::Entity::find()
                .filter(classes::Column::CreatedAt.gte(start))
                .count(db)
                .await?,
        };

        let mut by_status = BTreeMap::new();
        for status in BookingStatus::iter() {
            let count = bookings::Entity::find()
                .filter(bookings::Column::Status.eq(status))
                .count(db)
                .await?;
            by_status.insert(status.as_str().to_string(), count);
        }

        let booking_statistics = BookingStatistics {
            total_bookings: bookings::Entity::find().count(db).await?,
            recent_bookings: bookings::Entity::find()
                .filter(bookings::Column::BookingTime.gte(start))
                .count(db)
                .await?,
            by_status,
        };

        let popular_classes = Self::popular_classes(db).await?;
        let booking_trends = Self::booking_trends(db, start, now).await?;

        Ok(AdminOverview {
            period,
            user_statistics,
            class_statistics,
            booking_statistics,
            popular_classes,
            booking_trends,
        })
    }

    /// Classes ranked by total bookings across all their sessions
    async fn popular_classes(db: &DatabaseConnection) -> Result<Vec<PopularClass>, ServiceError> {
        let counts: Vec<(Uuid, i64)> = bookings::Entity::find()
            .select_only()
            .column(schedules::Column::ClassId)
            .column_as(bookings::Column::Id.count(), "booking_count")
            .join(JoinType::InnerJoin, bookings::Relation::Schedule.def())
            .group_by(schedules::Column::ClassId)
            .order_by_desc(Expr::col(Alias::new("booking_count")))
            .limit(Self::POPULAR_CLASSES_LIMIT)
            .into_tuple()
            .all(db)
            .await?;

        if counts.is_empty() {
            return Ok(vec![]);
        }

        let class_ids: Vec<Uuid> = counts.iter().map(|(id, _)| *id).collect();
        let class_rows = classes::Entity::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(db)
            .await?;

        let instructor_ids: Vec<Uuid> = class_rows.iter().map(|c| c.instructor_id).collect();
        let instructors = users::Entity::find()
            .filter(users::Column::Id.is_in(instructor_ids))
            .all(db)
            .await?;

        let classes_by_id: HashMap<Uuid, classes::Model> =
            class_rows.into_iter().map(|c| (c.id, c)).collect();
        let users_by_id: HashMap<Uuid, users::Model> =
            instructors.into_iter().map(|u| (u.id, u)).collect();

        Ok(counts
            .into_iter()
            .filter_map(|(class_id, booking_count)| {
                let class = classes_by_id.get(&class_id)?;
                let instructor_name = users_by_id
                    .get(&class.instructor_id)
                    .map(|u| u.display_name())
                    .unwrap_or_default();
                Some(PopularClass {
                    class_id,
                    name: class.name.clone(),
                    instructor_name,
                    booking_count,
                })
            })
            .collect())
    }

    /// Daily booking counts over the window, zero-filled
    async fn booking_trends(
        db: &DatabaseConnection,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, ServiceError> {
        let times: Vec<DateTime<Utc>> = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::BookingTime)
            .filter(bookings::Column::BookingTime.gte(start))
            .into_tuple()
            .all(db)
            .await?;

        let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut day = start.date_naive();
        while day <= now.date_naive() {
            buckets.insert(day, 0);
            day = day.succ_opt().unwrap_or(day);
        }

        for time in times {
            *buckets.entry(time.date_naive()).or_default() += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(date, bookings)| TrendPoint { date, bookings })
            .collect())
    }

    /// Aggregates for one instructor's dashboard
    pub async fn instructor_statistics(
        db: &DatabaseConnection,
        instructor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<InstructorStatistics, ServiceError> {
        let total_classes = classes::Entity::find()
            .filter(classes::Column::InstructorId.eq(instructor_id))
            .count(db)
            .await?;
        let active_classes = classes::Entity::find()
            .filter(classes::Column::InstructorId.eq(instructor_id))
            .filter(classes::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let featured_classes = classes::Entity::find()
            .filter(classes::Column::InstructorId.eq(instructor_id))
            .filter(classes::Column::IsFeatured.eq(true))
            .count(db)
            .await?;

        let total_schedules = schedules::Entity::find()
            .filter(schedules::Column::InstructorId.eq(instructor_id))
            .count(db)
            .await?;
        let upcoming_schedules = schedules::Entity::find()
            .filter(schedules::Column::InstructorId.eq(instructor_id))
            .filter(schedules::Column::StartTime.gte(now))
            .filter(schedules::Column::Status.eq(ScheduleStatus::Active))
            .count(db)
            .await?;

        let total_bookings = Self::instructor_booking_count(db, instructor_id, None).await?;
        let active_bookings =
            Self::instructor_booking_count(db, instructor_id, Some(BookingStatus::Booked)).await?;
        let completed_bookings =
            Self::instructor_booking_count(db, instructor_id, Some(BookingStatus::Completed))
                .await?;

        let class_ids: Vec<Uuid> = classes::Entity::find()
            .select_only()
            .column(classes::Column::Id)
            .filter(classes::Column::InstructorId.eq(instructor_id))
            .into_tuple()
            .all(db)
            .await?;

        let ratings: Vec<i16> = if class_ids.is_empty() {
            vec![]
        } else {
            reviews::Entity::find()
                .select_only()
                .column(reviews::Column::Rating)
                .filter(reviews::Column::ClassId.is_in(class_ids))
                .into_tuple()
                .all(db)
                .await?
        };

        let average_rating = if ratings.is_empty() {
            None
        } else {
            let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
            Some((sum as f64 / ratings.len() as f64 * 10.0).round() / 10.0)
        };

        Ok(InstructorStatistics {
            total_classes,
            active_classes,
            featured_classes,
            total_schedules,
            upcoming_schedules,
            total_bookings,
            active_bookings,
            completed_bookings,
            total_reviews: ratings.len() as u64,
            average_rating,
        })
    }

    async fn instructor_booking_count(
        db: &DatabaseConnection,
        instructor_id: Uuid,
        status: Option<BookingStatus>,
    ) -> Result<u64, ServiceError> {
        let mut query = bookings::Entity::find()
            .join(JoinType::InnerJoin, bookings::Relation::Schedule.def())
            .filter(schedules::Column::InstructorId.eq(instructor_id));

        if let Some(status) = status {
            query = query.filter(bookings::Column::Status.eq(status));
        }

        Ok(query.count(db).await?)
    }
}

#[cfg(test)]
mod test {
    use super::TrendPeriod;

    #[test]
    fn test_period_parsing_defaults_to_month() {
        assert_eq!(TrendPeriod::parse("week"), TrendPeriod::Week);
        assert_eq!(TrendPeriod::parse("year"), TrendPeriod::Year);
        assert_eq!(TrendPeriod::parse("quarter"), TrendPeriod::Month);
        assert_eq!(TrendPeriod::parse(""), TrendPeriod::Month);
    }

    #[test]
    fn test_period_windows() {
        assert_eq!(TrendPeriod::Week.days(), 7);
        assert_eq!(TrendPeriod::Month.days(), 30);
        assert_eq!(TrendPeriod::Year.days(), 365);
    }
}
