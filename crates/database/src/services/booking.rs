use crate::entities::{bookings, classes, schedules, users};
use chrono::{DateTime, Utc};
use models::{
    booking_status::BookingStatus, capacity::CancellationPolicy, schedule_status::ScheduleStatus,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::ServiceError;

/// Input for a booking request
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub schedule_id: Uuid,
    pub notes: String,
}

/// Filters for listing a user's bookings
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub upcoming_only: bool,
    pub past_only: bool,
}

/// A booking joined with its schedule, class and instructor
pub type BookingWithContext = (
    bookings::Model,
    schedules::Model,
    classes::Model,
    users::Model,
);

pub struct BookingService;

impl BookingService {
    /// Decide a booking request: confirmed seat, waitlist entry, or rejection.
    ///
    /// The whole read-check-write sequence runs inside one transaction holding
    /// a `FOR UPDATE` lock on the schedule row, so concurrent requests against
    /// the same schedule serialize and can neither over-book the last seat nor
    /// hand out the same waitlist position twice. The unique
    /// (user_id, schedule_id) index backstops duplicate submissions.
    pub async fn create_booking(
        db: &DatabaseConnection,
        user_id: Uuid,
        request: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<(bookings::Model, schedules::Model), ServiceError> {
        let txn = db.begin().await?;

        let schedule = schedules::Entity::find_by_id(request.schedule_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::ScheduleNotFound)?;

        if !schedule.status.is_bookable() {
            return Err(ServiceError::ScheduleNotBookable);
        }

        if schedule.start_time <= now {
            return Err(ServiceError::SessionInPast);
        }

        let existing = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .filter(bookings::Column::ScheduleId.eq(request.schedule_id))
            .one(&txn)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::DuplicateBooking);
        }

        let (booking, schedule) = if schedule.booked_slots < schedule.max_capacity {
            let booked_slots = schedule.booked_slots + 1;
            let status = schedule.status.derive(
                booked_slots,
                schedule.max_capacity,
                schedule.start_time,
                now,
            );

            let mut schedule_update: schedules::ActiveModel = schedule.into();
            schedule_update.booked_slots = Set(booked_slots);
            schedule_update.status = Set(status);
            schedule_update.updated_at = Set(now);
            let schedule = schedule_update.update(&txn).await?;

            let booking = Self::insert_booking(
                &txn,
                user_id,
                &request,
                BookingStatus::Booked,
                None,
                now,
            )
            .await?;

            (booking, schedule)
        } else if schedule.waitlist_enabled {
            // Count-then-insert is safe here: the schedule row lock serializes
            // all waitlist appends for this schedule.
            let waitlisted = bookings::Entity::find()
                .filter(bookings::Column::ScheduleId.eq(request.schedule_id))
                .filter(bookings::Column::IsWaitlisted.eq(true))
                .all(&txn)
                .await?;

            let position = waitlisted.len() as i32 + 1;
            let booking = Self::insert_booking(
                &txn,
                user_id,
                &request,
                BookingStatus::Waitlisted,
                Some(position),
                now,
            )
            .await?;

            (booking, schedule)
        } else {
            return Err(ServiceError::SessionFull);
        };

        txn.commit().await?;

        Ok((booking, schedule))
    }

    async fn insert_booking<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        request: &NewBooking,
        status: BookingStatus,
        waitlist_position: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<bookings::Model, ServiceError> {
        let booking = bookings::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            schedule_id: Set(request.schedule_id),
            status: Set(status),
            booking_time: Set(now),
            cancellation_time: Set(None),
            is_waitlisted: Set(status == BookingStatus::Waitlisted),
            waitlist_position: Set(waitlist_position),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        Ok(booking)
    }

    /// Cancel a booking within the policy window.
    ///
    /// A confirmed seat releases one slot (floored at zero) and re-derives the
    /// schedule status; a waitlisted entry leaves the counters untouched.
    /// Remaining waitlisted bookings are not promoted and keep their
    /// positions.
    pub async fn cancel_booking(
        db: &DatabaseConnection,
        user_id: Uuid,
        booking_id: Uuid,
        reason: Option<String>,
        policy: &CancellationPolicy,
        now: DateTime<Utc>,
    ) -> Result<(bookings::Model, schedules::Model), ServiceError> {
        let txn = db.begin().await?;

        let booking = bookings::Entity::find_by_id(booking_id)
            .filter(bookings::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::BookingNotFound)?;

        match booking.status {
            BookingStatus::Cancelled => return Err(ServiceError::AlreadyCancelled),
            BookingStatus::Completed => return Err(ServiceError::BookingCompleted),
            BookingStatus::Booked | BookingStatus::Waitlisted => {}
        }

        let schedule = schedules::Entity::find_by_id(booking.schedule_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::ScheduleNotFound)?;

        if !policy.allows_cancellation(now, schedule.start_time) {
            return Err(ServiceError::CancellationWindowPassed(policy.window_hours()));
        }

        let mut notes = booking.notes.clone();
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            if !notes.is_empty() {
                notes.push('\n');
            }
            notes.push_str(&format!("Cancellation reason: {reason}"));
        }

        let released_seat = !booking.is_waitlisted;

        let mut booking_update: bookings::ActiveModel = booking.into();
        booking_update.status = Set(BookingStatus::Cancelled);
        booking_update.cancellation_time = Set(Some(now));
        booking_update.notes = Set(notes);
        booking_update.updated_at = Set(now);
        let booking = booking_update.update(&txn).await?;

        let schedule = if released_seat {
            let booked_slots = (schedule.booked_slots - 1).max(0);
            let status = schedule.status.derive(
                booked_slots,
                schedule.max_capacity,
                schedule.start_time,
                now,
            );

            let mut schedule_update: schedules::ActiveModel = schedule.into();
            schedule_update.booked_slots = Set(booked_slots);
            schedule_update.status = Set(status);
            schedule_update.updated_at = Set(now);
            schedule_update.update(&txn).await?
        } else {
            schedule
        };

        txn.commit().await?;

        Ok((booking, schedule))
    }

    /// Edit the free-text notes on an open booking
    pub async fn update_notes(
        db: &DatabaseConnection,
        user_id: Uuid,
        booking_id: Uuid,
        notes: String,
        now: DateTime<Utc>,
    ) -> Result<bookings::Model, ServiceError> {
        let booking = bookings::Entity::find_by_id(booking_id)
            .filter(bookings::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(ServiceError::BookingNotFound)?;

        match booking.status {
            BookingStatus::Cancelled => return Err(ServiceError::AlreadyCancelled),
            BookingStatus::Completed => return Err(ServiceError::BookingCompleted),
            BookingStatus::Booked | BookingStatus::Waitlisted => {}
        }

        let mut booking_update: bookings::ActiveModel = booking.into();
        booking_update.notes = Set(notes);
        booking_update.updated_at = Set(now);
        let booking = booking_update.update(db).await?;

        Ok(booking)
    }

    /// List the user's bookings, newest first, with optional status and
    /// upcoming/past filters
    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
        filter: BookingFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingWithContext>, ServiceError> {
        let mut query = bookings::Entity::find().filter(bookings::Column::UserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(bookings::Column::Status.eq(status));
        }

        let rows = query
            .order_by_desc(bookings::Column::BookingTime)
            .all(db)
            .await?;

        let mut joined = Self::load_context(db, rows).await?;

        if filter.upcoming_only {
            joined.retain(|(_, schedule, _, _)| schedule.start_time >= now);
        }
        if filter.past_only {
            joined.retain(|(_, schedule, _, _)| schedule.start_time < now);
        }

        Ok(joined)
    }

    /// A single booking owned by the user
    pub async fn find_for_user(
        db: &DatabaseConnection,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingWithContext, ServiceError> {
        let booking = bookings::Entity::find_by_id(booking_id)
            .filter(bookings::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(ServiceError::BookingNotFound)?;

        let mut joined = Self::load_context(db, vec![booking]).await?;
        joined.pop().ok_or(ServiceError::ScheduleNotFound)
    }

    /// The user's booking for one schedule, if any
    pub async fn find_for_schedule(
        db: &DatabaseConnection,
        user_id: Uuid,
        schedule_id: Uuid,
    ) -> Result<BookingWithContext, ServiceError> {
        let booking = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .filter(bookings::Column::ScheduleId.eq(schedule_id))
            .one(db)
            .await?
            .ok_or(ServiceError::BookingNotFound)?;

        let mut joined = Self::load_context(db, vec![booking]).await?;
        joined.pop().ok_or(ServiceError::ScheduleNotFound)
    }

    /// Batch-join bookings with their schedules, classes and instructors
    async fn load_context<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<bookings::Model>,
    ) -> Result<Vec<BookingWithContext>, ServiceError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let schedule_ids: Vec<Uuid> = rows.iter().map(|b| b.schedule_id).collect();
        let schedules = schedules::Entity::find()
            .filter(schedules::Column::Id.is_in(schedule_ids))
            .all(conn)
            .await?;

        let class_ids: Vec<Uuid> = schedules.iter().map(|s| s.class_id).collect();
        let instructor_ids: Vec<Uuid> = schedules.iter().map(|s| s.instructor_id).collect();

        let (classes, instructors) = futures::try_join!(
            classes::Entity::find()
                .filter(classes::Column::Id.is_in(class_ids))
                .all(conn),
            users::Entity::find()
                .filter(users::Column::Id.is_in(instructor_ids))
                .all(conn),
        )?;

        let schedules_by_id: HashMap<Uuid, schedules::Model> =
            schedules.into_iter().map(|s| (s.id, s)).collect();
        let classes_by_id: HashMap<Uuid, classes::Model> =
            classes.into_iter().map(|c| (c.id, c)).collect();
        let users_by_id: HashMap<Uuid, users::Model> =
            instructors.into_iter().map(|u| (u.id, u)).collect();

        let joined = rows
            .into_iter()
            .filter_map(|booking| {
                let schedule = schedules_by_id.get(&booking.schedule_id)?.clone();
                let class = classes_by_id.get(&schedule.class_id)?.clone();
                let instructor = users_by_id.get(&schedule.instructor_id)?.clone();
                Some((booking, schedule, class, instructor))
            })
            .collect();

        Ok(joined)
    }
}

#[cfg(test)]
mod test {
    use super::{BookingService, NewBooking};
    use crate::entities::{bookings, schedules};
    use crate::services::ServiceError;
    use chrono::{DateTime, Duration, Utc};
    use models::{
        booking_status::BookingStatus, capacity::CancellationPolicy,
        schedule_status::ScheduleStatus,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn schedule_fixture(
        booked_slots: i32,
        max_capacity: i32,
        waitlist_enabled: bool,
        status: ScheduleStatus,
        start_time: DateTime<Utc>,
    ) -> schedules::Model {
        let now = start_time - Duration::days(7);
        schedules::Model {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            start_time,
            end_time: start_time + Duration::minutes(60),
            max_capacity,
            booked_slots,
            waitlist_enabled,
            recurrence: "none".to_string(),
            recurrence_end_date: None,
            parent_schedule_id: None,
            status,
            notes: String::new(),
            cancellation_reason: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn booking_fixture(
        user_id: Uuid,
        schedule_id: Uuid,
        status: BookingStatus,
        waitlist_position: Option<i32>,
        now: DateTime<Utc>,
    ) -> bookings::Model {
        bookings::Model {
            id: Uuid::new_v4(),
            user_id,
            schedule_id,
            status,
            booking_time: now,
            cancellation_time: None,
            is_waitlisted: status == BookingStatus::Waitlisted,
            waitlist_position,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn exec_results(n: usize) -> Vec<MockExecResult> {
        (0..n)
            .map(|_| MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_booking_takes_a_seat() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(0, 1, false, ScheduleStatus::Active, start);
        let mut updated = schedule.clone();
        updated.booked_slots = 1;
        updated.status = ScheduleStatus::Full;
        let inserted = booking_fixture(user_id, schedule.id, BookingStatus::Booked, None, now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([vec![updated.clone()]])
            .append_query_results([vec![inserted.clone()]])
            .append_exec_results(exec_results(4))
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let (booking, schedule) = BookingService::create_booking(&db, user_id, request, now)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Booked);
        assert!(!booking.is_waitlisted);
        assert_eq!(schedule.booked_slots, 1);
        assert_eq!(schedule.status, ScheduleStatus::Full);
    }

    #[tokio::test]
    async fn test_full_session_without_waitlist_rejects() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(1, 1, false, ScheduleStatus::Full, start);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let result = BookingService::create_booking(&db, user_id, request, now).await;

        assert!(matches!(result, Err(ServiceError::SessionFull)));
    }

    #[tokio::test]
    async fn test_full_session_with_waitlist_appends() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(1, 1, true, ScheduleStatus::Full, start);
        let first_waitlisted = booking_fixture(
            Uuid::new_v4(),
            schedule.id,
            BookingStatus::Waitlisted,
            Some(1),
            now,
        );
        let inserted = booking_fixture(
            user_id,
            schedule.id,
            BookingStatus::Waitlisted,
            Some(2),
            now,
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([vec![first_waitlisted]])
            .append_query_results([vec![inserted]])
            .append_exec_results(exec_results(4))
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let (booking, schedule) = BookingService::create_booking(&db, user_id, request, now)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Waitlisted);
        assert_eq!(booking.waitlist_position, Some(2));
        // waitlist entries never consume seats
        assert_eq!(schedule.booked_slots, 1);
    }

    #[tokio::test]
    async fn test_duplicate_booking_rejected() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(0, 10, true, ScheduleStatus::Active, start);
        let existing = booking_fixture(user_id, schedule.id, BookingStatus::Booked, None, now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([vec![existing]])
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let result = BookingService::create_booking(&db, user_id, request, now).await;

        assert!(matches!(result, Err(ServiceError::DuplicateBooking)));
    }

    #[tokio::test]
    async fn test_past_session_rejected() {
        let now = Utc::now();
        let start = now - Duration::hours(1);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(0, 10, true, ScheduleStatus::Active, start);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let result = BookingService::create_booking(&db, user_id, request, now).await;

        assert!(matches!(result, Err(ServiceError::SessionInPast)));
    }

    #[tokio::test]
    async fn test_cancelled_session_not_bookable() {
        let now = Utc::now();
        let start = now + Duration::hours(48);

        let schedule = schedule_fixture(0, 10, true, ScheduleStatus::Cancelled, start);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .into_connection();

        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let result = BookingService::create_booking(&db, Uuid::new_v4(), request, now).await;

        assert!(matches!(result, Err(ServiceError::ScheduleNotBookable)));
    }

    #[tokio::test]
    async fn test_cancel_confirmed_seat_releases_slot() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(2, 2, true, ScheduleStatus::Full, start);
        let booking = booking_fixture(user_id, schedule.id, BookingStatus::Booked, None, now);

        let mut cancelled = booking.clone();
        cancelled.status = BookingStatus::Cancelled;
        cancelled.cancellation_time = Some(now);

        let mut released = schedule.clone();
        released.booked_slots = 1;
        released.status = ScheduleStatus::Active;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking.clone()]])
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([vec![cancelled.clone()]])
            .append_query_results([vec![released.clone()]])
            .append_exec_results(exec_results(4))
            .into_connection();

        let policy = CancellationPolicy::default();
        let (booking, schedule) =
            BookingService::cancel_booking(&db, user_id, booking.id, None, &policy, now)
                .await
                .unwrap();

        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(booking.cancellation_time.is_some());
        assert_eq!(schedule.booked_slots, 1);
        assert_eq!(schedule.status, ScheduleStatus::Active);
    }

    #[tokio::test]
    async fn test_cancel_waitlisted_leaves_counters_alone() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(2, 2, true, ScheduleStatus::Full, start);
        let booking = booking_fixture(
            user_id,
            schedule.id,
            BookingStatus::Waitlisted,
            Some(1),
            now,
        );

        let mut cancelled = booking.clone();
        cancelled.status = BookingStatus::Cancelled;
        cancelled.cancellation_time = Some(now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking.clone()]])
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([vec![cancelled.clone()]])
            .append_exec_results(exec_results(3))
            .into_connection();

        let policy = CancellationPolicy::default();
        let (booking, schedule) =
            BookingService::cancel_booking(&db, user_id, booking.id, None, &policy, now)
                .await
                .unwrap();

        assert_eq!(booking.status, BookingStatus::Cancelled);
        // the schedule was never written: counters and status unchanged
        assert_eq!(schedule.booked_slots, 2);
        assert_eq!(schedule.status, ScheduleStatus::Full);
    }

    #[tokio::test]
    async fn test_cancel_inside_window_rejected() {
        let now = Utc::now();
        // 23h59m before start is inside the 24h window
        let start = now + Duration::hours(23) + Duration::minutes(59);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(1, 2, true, ScheduleStatus::Active, start);
        let booking = booking_fixture(user_id, schedule.id, BookingStatus::Booked, None, now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking.clone()]])
            .append_query_results([vec![schedule.clone()]])
            .into_connection();

        let policy = CancellationPolicy::default();
        let result =
            BookingService::cancel_booking(&db, user_id, booking.id, None, &policy, now).await;

        assert!(matches!(
            result,
            Err(ServiceError::CancellationWindowPassed(24))
        ));
    }

    #[tokio::test]
    async fn test_cancel_twice_rejected() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_id = Uuid::new_v4();

        let schedule = schedule_fixture(1, 2, true, ScheduleStatus::Active, start);
        let mut booking = booking_fixture(user_id, schedule.id, BookingStatus::Booked, None, now);
        booking.status = BookingStatus::Cancelled;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking.clone()]])
            .into_connection();

        let policy = CancellationPolicy::default();
        let result =
            BookingService::cancel_booking(&db, user_id, booking.id, None, &policy, now).await;

        assert!(matches!(result, Err(ServiceError::AlreadyCancelled)));
    }

    #[tokio::test]
    async fn test_capacity_two_fills_waitlists_and_releases() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let user_c = Uuid::new_v4();

        let schedule = schedule_fixture(0, 2, true, ScheduleStatus::Active, start);

        // user A takes the first seat
        let mut after_a = schedule.clone();
        after_a.booked_slots = 1;
        let booking_a = booking_fixture(user_a, schedule.id, BookingStatus::Booked, None, now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![schedule.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([vec![after_a.clone()]])
            .append_query_results([vec![booking_a.clone()]])
            .append_exec_results(exec_results(4))
            .into_connection();
        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let (booking, state) = BookingService::create_booking(&db, user_a, request, now)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Booked);
        assert_eq!(state.booked_slots, 1);

        // user B takes the last seat, the session derives to full
        let mut after_b = after_a.clone();
        after_b.booked_slots = 2;
        after_b.status = ScheduleStatus::Full;
        let booking_b = booking_fixture(user_b, schedule.id, BookingStatus::Booked, None, now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![after_a.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([vec![after_b.clone()]])
            .append_query_results([vec![booking_b]])
            .append_exec_results(exec_results(4))
            .into_connection();
        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let (booking, state) = BookingService::create_booking(&db, user_b, request, now)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Booked);
        assert_eq!(state.booked_slots, 2);
        assert_eq!(state.status, ScheduleStatus::Full);

        // user C lands on the waitlist at position 1
        let booking_c = booking_fixture(
            user_c,
            schedule.id,
            BookingStatus::Waitlisted,
            Some(1),
            now,
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![after_b.clone()]])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([Vec::<bookings::Model>::new()])
            .append_query_results([vec![booking_c.clone()]])
            .append_exec_results(exec_results(4))
            .into_connection();
        let request = NewBooking {
            schedule_id: schedule.id,
            notes: String::new(),
        };
        let (booking, state) = BookingService::create_booking(&db, user_c, request, now)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Waitlisted);
        assert_eq!(booking.waitlist_position, Some(1));
        assert_eq!(state.booked_slots, 2);

        // cancelling A frees a slot; C stays waitlisted at position 1
        let mut cancelled_a = booking_a.clone();
        cancelled_a.status = BookingStatus::Cancelled;
        cancelled_a.cancellation_time = Some(now);
        let mut released = after_b.clone();
        released.booked_slots = 1;
        released.status = ScheduleStatus::Active;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking_a.clone()]])
            .append_query_results([vec![after_b.clone()]])
            .append_query_results([vec![cancelled_a]])
            .append_query_results([vec![released]])
            .append_exec_results(exec_results(4))
            .into_connection();
        let policy = CancellationPolicy::default();
        let (booking, state) =
            BookingService::cancel_booking(&db, user_a, booking_a.id, None, &policy, now)
                .await
                .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(state.booked_slots, 1);
        assert_eq!(state.status, ScheduleStatus::Active);
        // no promotion happened: C's booking row was never touched
        assert_eq!(booking_c.waitlist_position, Some(1));
    }

    #[tokio::test]
    async fn test_update_notes_on_completed_booking_rejected() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let booking = booking_fixture(
            user_id,
            Uuid::new_v4(),
            BookingStatus::Completed,
            None,
            now,
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![booking.clone()]])
            .into_connection();

        let result =
            BookingService::update_notes(&db, user_id, booking.id, "bring a mat".to_string(), now)
                .await;

        assert!(matches!(result, Err(ServiceError::BookingCompleted)));
    }
}
