use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

#[cfg(feature = "database")]
use sea_orm::Value;

/// Status of one scheduled session.
///
/// `Cancelled` and `Completed` are terminal. `Active` and `Full` are derived
/// from the capacity counters and must never be set directly; call
/// [`ScheduleStatus::derive`] after every mutation of `booked_slots` or the
/// session times instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Full,
    Cancelled,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Full => "full",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Recompute the status from the current counters and clock.
    ///
    /// A full session that is past its start time stays `Full`; only an
    /// `Active` session rolls over to `Completed`.
    pub fn derive(
        self,
        booked_slots: i32,
        max_capacity: i32,
        start_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            Self::Completed => Self::Completed,
            Self::Active | Self::Full => {
                let next = if booked_slots >= max_capacity {
                    Self::Full
                } else {
                    Self::Active
                };

                if next == Self::Active && start_time < now {
                    Self::Completed
                } else {
                    next
                }
            }
        }
    }

    /// Whether a booking request may still target the session. A `Full`
    /// session stays bookable so the waitlist can accept entries; the
    /// capacity decision happens downstream.
    pub fn is_bookable(self) -> bool {
        matches!(self, Self::Active | Self::Full)
    }
}

impl Display for ScheduleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = ();

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "active" => Ok(Self::Active),
            "full" => Ok(Self::Full),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::ValueType for ScheduleStatus {
    fn try_from(v: Value) -> Result<Self, sea_orm::sea_query::ValueTypeErr> {
        match v {
            Value::String(Some(s)) => s.parse().map_err(|_| sea_orm::sea_query::ValueTypeErr),
            _ => Err(sea_orm::sea_query::ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "ScheduleStatus".to_string()
    }

    fn array_type() -> sea_orm::sea_query::ArrayType {
        sea_orm::sea_query::ArrayType::String
    }

    fn column_type() -> sea_orm::sea_query::ColumnType {
        sea_orm::sea_query::ColumnType::Text
    }
}

#[cfg(feature = "database")]
impl From<ScheduleStatus> for Value {
    fn from(status: ScheduleStatus) -> Self {
        Value::String(Some(Box::new(status.as_str().to_string())))
    }
}

#[cfg(feature = "database")]
impl sea_orm::TryGetable for ScheduleStatus {
    fn try_get_by<I: sea_orm::ColIdx>(
        res: &sea_orm::QueryResult,
        index: I,
    ) -> Result<Self, sea_orm::TryGetError> {
        let val: String = res.try_get_by(index)?;

        val.parse().map_err(|_| {
            sea_orm::TryGetError::DbErr(sea_orm::DbErr::Type(format!(
                "unknown schedule status: {val}"
            )))
        })
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::Nullable for ScheduleStatus {
    fn null() -> Value {
        Value::String(None)
    }
}

#[cfg(test)]
mod test {
    use crate::schedule_status::ScheduleStatus;
    use chrono::{Duration, Utc};

    #[test]
    fn test_active_flips_to_full_at_capacity() {
        let now = Utc::now();
        let start = now + Duration::hours(48);

        assert_eq!(
            ScheduleStatus::Active.derive(10, 10, start, now),
            ScheduleStatus::Full
        );
        assert_eq!(
            ScheduleStatus::Active.derive(9, 10, start, now),
            ScheduleStatus::Active
        );
    }

    #[test]
    fn test_full_flips_back_when_slots_free_up() {
        let now = Utc::now();
        let start = now + Duration::hours(48);

        assert_eq!(
            ScheduleStatus::Full.derive(9, 10, start, now),
            ScheduleStatus::Active
        );
    }

    #[test]
    fn test_active_completes_after_start() {
        let now = Utc::now();
        let start = now - Duration::minutes(1);

        assert_eq!(
            ScheduleStatus::Active.derive(3, 10, start, now),
            ScheduleStatus::Completed
        );
        // a full session does not roll over to completed
        assert_eq!(
            ScheduleStatus::Full.derive(10, 10, start, now),
            ScheduleStatus::Full
        );
    }

    #[test]
    fn test_terminal_states_stay_put() {
        let now = Utc::now();
        let start = now + Duration::hours(48);

        assert_eq!(
            ScheduleStatus::Cancelled.derive(0, 10, start, now),
            ScheduleStatus::Cancelled
        );
        assert_eq!(
            ScheduleStatus::Completed.derive(10, 10, start, now),
            ScheduleStatus::Completed
        );
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let now = Utc::now();
        let start = now + Duration::hours(48);

        for status in [
            ScheduleStatus::Active,
            ScheduleStatus::Full,
            ScheduleStatus::Cancelled,
            ScheduleStatus::Completed,
        ] {
            for booked in [0, 5, 10] {
                let once = status.derive(booked, 10, start, now);
                let twice = once.derive(booked, 10, start, now);
                assert_eq!(once, twice);
            }
        }
    }
}
