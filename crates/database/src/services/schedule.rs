use crate::entities::{bookings, classes, schedules, users};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use models::{capacity, class_options::Recurrence, schedule_status::ScheduleStatus};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::{collections::HashMap, str::FromStr};
use uuid::Uuid;

use super::ServiceError;

/// Input for an instructor creating one session (plus generated recurring
/// instances)
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub class_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub waitlist_enabled: bool,
    pub recurrence: Recurrence,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: String,
}

/// A schedule joined with its class and instructor
pub type ScheduleWithContext = (schedules::Model, classes::Model, users::Model);

pub struct ScheduleService;

impl ScheduleService {
    /// Upper bound on generated recurring instances for one request
    const MAX_GENERATED_INSTANCES: usize = 366;

    /// Capacity snapshot for one session
    pub async fn availability(
        db: &DatabaseConnection,
        schedule_id: Uuid,
    ) -> Result<ScheduleWithContext, ServiceError> {
        let schedule = schedules::Entity::find_by_id(schedule_id)
            .one(db)
            .await?
            .ok_or(ServiceError::ScheduleNotFound)?;

        let class = classes::Entity::find_by_id(schedule.class_id)
            .one(db)
            .await?
            .ok_or(ServiceError::ClassNotFound)?;

        let instructor = users::Entity::find_by_id(schedule.instructor_id)
            .one(db)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        Ok((schedule, class, instructor))
    }

    /// Sessions in a date range, for the calendar view
    pub async fn in_range(
        db: &DatabaseConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        class_id: Option<Uuid>,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ScheduleWithContext>, ServiceError> {
        let mut query = schedules::Entity::find()
            .filter(schedules::Column::StartTime.gte(from))
            .filter(schedules::Column::StartTime.lte(to))
            .filter(schedules::Column::Status.eq(ScheduleStatus::Active));

        if let Some(class_id) = class_id {
            query = query.filter(schedules::Column::ClassId.eq(class_id));
        }

        let rows = query
            .order_by_asc(schedules::Column::StartTime)
            .all(db)
            .await?;

        let mut joined = Self::load_context(db, rows).await?;

        if let Some(category_id) = category_id {
            joined.retain(|(_, class, _)| class.category_id == category_id);
        }

        Ok(joined)
    }

    /// Create a session for one of the instructor's classes. When a
    /// recurrence is requested, generates the instances up to the end date as
    /// a one-level tree under the first session.
    pub async fn create_for_instructor(
        db: &DatabaseConnection,
        instructor_id: Uuid,
        request: NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<Vec<schedules::Model>, ServiceError> {
        let class = classes::Entity::find_by_id(request.class_id)
            .filter(classes::Column::InstructorId.eq(instructor_id))
            .one(db)
            .await?
            .ok_or(ServiceError::ClassNotFound)?;

        if request.start_time <= now {
            return Err(ServiceError::Invalid(
                "start time must be in the future".to_string(),
            ));
        }

        let max_capacity = request.max_capacity.unwrap_or(class.max_capacity);
        if !capacity::valid_capacity(max_capacity) {
            return Err(ServiceError::Invalid(format!(
                "capacity must be between {} and {}",
                capacity::MIN_CAPACITY,
                capacity::MAX_CAPACITY
            )));
        }

        let duration = request
            .end_time
            .map(|end| end - request.start_time)
            .unwrap_or_else(|| Duration::minutes(class.duration_minutes as i64));

        if duration <= Duration::zero() {
            return Err(ServiceError::Invalid(
                "end time must be after start time".to_string(),
            ));
        }

        let txn = db.begin().await?;

        let parent = Self::insert_schedule(
            &txn,
            &class,
            instructor_id,
            request.start_time,
            duration,
            max_capacity,
            &request,
            None,
            now,
        )
        .await?;

        let mut created = vec![parent.clone()];

        if request.recurrence != Recurrence::None {
            if let Some(end_date) = request.recurrence_end_date {
                let mut start = request.start_time;
                while created.len() < Self::MAX_GENERATED_INSTANCES {
                    let Some(next) = request.recurrence.next_occurrence(start) else {
                        break;
                    };
                    if next.date_naive() > end_date {
                        break;
                    }

                    let instance = Self::insert_schedule(
                        &txn,
                        &class,
                        instructor_id,
                        next,
                        duration,
                        max_capacity,
                        &request,
                        Some(parent.id),
                        now,
                    )
                    .await?;
                    created.push(instance);
                    start = next;
                }
            }
        }

        txn.commit().await?;

        Ok(created)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_schedule<C: sea_orm::ConnectionTrait>(
        conn: &C,
        class: &classes::Model,
        instructor_id: Uuid,
        start_time: DateTime<Utc>,
        duration: Duration,
        max_capacity: i32,
        request: &NewSchedule,
        parent_schedule_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<schedules::Model, ServiceError> {
        let status = ScheduleStatus::Active.derive(0, max_capacity, start_time, now);

        let schedule = schedules::ActiveModel {
            id: Set(Uuid::new_v4()),
            class_id: Set(class.id),
            instructor_id: Set(instructor_id),
            start_time: Set(start_time),
            end_time: Set(start_time + duration),
            max_capacity: Set(max_capacity),
            booked_slots: Set(0),
            waitlist_enabled: Set(request.waitlist_enabled),
            recurrence: Set(request.recurrence.to_string()),
            recurrence_end_date: Set(request.recurrence_end_date),
            parent_schedule_id: Set(parent_schedule_id),
            status: Set(status),
            notes: Set(request.notes.clone()),
            cancellation_reason: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        Ok(schedule)
    }

    /// The instructor's sessions with their booked and waitlisted
    /// participants, soonest first
    pub async fn instructor_schedules(
        db: &DatabaseConnection,
        instructor_id: Uuid,
        upcoming_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<(schedules::Model, classes::Model, Vec<(bookings::Model, users::Model)>)>, ServiceError>
    {
        let mut query =
            schedules::Entity::find().filter(schedules::Column::InstructorId.eq(instructor_id));

        if upcoming_only {
            query = query.filter(schedules::Column::StartTime.gte(now));
        }

        let schedules = query
            .order_by_asc(schedules::Column::StartTime)
            .all(db)
            .await?;

        if schedules.is_empty() {
            return Ok(vec![]);
        }

        let class_ids: Vec<Uuid> = schedules.iter().map(|s| s.class_id).collect();
        let classes = classes::Entity::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(db)
            .await?;

        let schedule_ids: Vec<Uuid> = schedules.iter().map(|s| s.id).collect();
        let bookings = bookings::Entity::find()
            .filter(bookings::Column::ScheduleId.is_in(schedule_ids))
            .all(db)
            .await?;

        let user_ids: Vec<Uuid> = bookings.iter().map(|b| b.user_id).collect();
        let users = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?;

        let classes_by_id: HashMap<Uuid, classes::Model> =
            classes.into_iter().map(|c| (c.id, c)).collect();
        let users_by_id: HashMap<Uuid, users::Model> =
            users.into_iter().map(|u| (u.id, u)).collect();

        let mut bookings_by_schedule: HashMap<Uuid, Vec<(bookings::Model, users::Model)>> =
            HashMap::new();
        for booking in bookings {
            let Some(user) = users_by_id.get(&booking.user_id) else {
                continue;
            };
            bookings_by_schedule
                .entry(booking.schedule_id)
                .or_default()
                .push((booking, user.clone()));
        }

        let mut results = Vec::new();
        for schedule in schedules {
            let Some(class) = classes_by_id.get(&schedule.class_id) else {
                continue;
            };
            let participants = bookings_by_schedule.remove(&schedule.id).unwrap_or_default();
            results.push((schedule, class.clone(), participants));
        }

        Ok(results)
    }

    async fn load_context(
        db: &DatabaseConnection,
        rows: Vec<schedules::Model>,
    ) -> Result<Vec<ScheduleWithContext>, ServiceError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let class_ids: Vec<Uuid> = rows.iter().map(|s| s.class_id).collect();
        let instructor_ids: Vec<Uuid> = rows.iter().map(|s| s.instructor_id).collect();

        let (classes, instructors) = futures::try_join!(
            classes::Entity::find()
                .filter(classes::Column::Id.is_in(class_ids))
                .all(db),
            users::Entity::find()
                .filter(users::Column::Id.is_in(instructor_ids))
                .all(db),
        )?;

        let classes_by_id: HashMap<Uuid, classes::Model> =
            classes.into_iter().map(|c| (c.id, c)).collect();
        let users_by_id: HashMap<Uuid, users::Model> =
            instructors.into_iter().map(|u| (u.id, u)).collect();

        Ok(rows
            .into_iter()
            .filter_map(|schedule| {
                let class = classes_by_id.get(&schedule.class_id)?.clone();
                let instructor = users_by_id.get(&schedule.instructor_id)?.clone();
                Some((schedule, class, instructor))
            })
            .collect())
    }
}

/// Parse a stored recurrence string, defaulting to none for unknown values
pub fn parse_recurrence(value: &str) -> Recurrence {
    Recurrence::from_str(value).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::parse_recurrence;
    use models::class_options::Recurrence;

    #[test]
    fn test_parse_recurrence_falls_back_to_none() {
        assert_eq!(parse_recurrence("weekly"), Recurrence::Weekly);
        assert_eq!(parse_recurrence("fortnightly"), Recurrence::None);
    }
}
