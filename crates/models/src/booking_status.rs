use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use strum::EnumIter;

#[cfg(feature = "database")]
use sea_orm::Value;

/// Lifecycle of a booking row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Holds a confirmed seat counted against the schedule capacity
    Booked,
    /// Parked on the waitlist, does not consume a seat
    Waitlisted,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Waitlisted => "waitlisted",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// A booking that can still be edited or cancelled
    pub fn is_open(self) -> bool {
        matches!(self, Self::Booked | Self::Waitlisted)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "booked" => Ok(Self::Booked),
            "waitlisted" => Ok(Self::Waitlisted),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::ValueType for BookingStatus {
    fn try_from(v: Value) -> Result<Self, sea_orm::sea_query::ValueTypeErr> {
        match v {
            Value::String(Some(s)) => s.parse().map_err(|_| sea_orm::sea_query::ValueTypeErr),
            _ => Err(sea_orm::sea_query::ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "BookingStatus".to_string()
    }

    fn array_type() -> sea_orm::sea_query::ArrayType {
        sea_orm::sea_query::ArrayType::String
    }

    fn column_type() -> sea_orm::sea_query::ColumnType {
        sea_orm::sea_query::ColumnType::Text
    }
}

#[cfg(feature = "database")]
impl From<BookingStatus> for Value {
    fn from(status: BookingStatus) -> Self {
        Value::String(Some(Box::new(status.as_str().to_string())))
    }
}

#[cfg(feature = "database")]
impl sea_orm::TryGetable for BookingStatus {
    fn try_get_by<I: sea_orm::ColIdx>(
        res: &sea_orm::QueryResult,
        index: I,
    ) -> Result<Self, sea_orm::TryGetError> {
        let val: String = res.try_get_by(index)?;

        val.parse().map_err(|_| {
            sea_orm::TryGetError::DbErr(sea_orm::DbErr::Type(format!(
                "unknown booking status: {val}"
            )))
        })
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::Nullable for BookingStatus {
    fn null() -> Value {
        Value::String(None)
    }
}

#[cfg(test)]
mod test {
    use crate::booking_status::BookingStatus;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Booked,
            BookingStatus::Waitlisted,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn test_open_states() {
        assert!(BookingStatus::Booked.is_open());
        assert!(BookingStatus::Waitlisted.is_open());
        assert!(!BookingStatus::Cancelled.is_open());
        assert!(!BookingStatus::Completed.is_open());
    }
}
