use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Difficulty tier of a class definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    AllLevels,
}

impl DifficultyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::AllLevels => "all_levels",
        }
    }
}

impl Display for DifficultyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = ();

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "all_levels" => Ok(Self::AllLevels),
            _ => Err(()),
        }
    }
}

/// Where a class takes place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    InPerson,
    Virtual,
    Hybrid,
}

impl LocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::Virtual => "virtual",
            Self::Hybrid => "hybrid",
        }
    }
}

impl Display for LocationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = ();

    fn from_str(location: &str) -> Result<Self, Self::Err> {
        match location {
            "in_person" => Ok(Self::InPerson),
            "virtual" => Ok(Self::Virtual),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(()),
        }
    }
}

/// Repeat rule for generated schedule instances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// The start time of the occurrence after `start`, or `None` for
    /// non-repeating schedules.
    pub fn next_occurrence(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::None => None,
            Self::Daily => Some(start + Duration::days(1)),
            Self::Weekly => Some(start + Duration::weeks(1)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
        }
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = ();

    fn from_str(recurrence: &str) -> Result<Self, Self::Err> {
        match recurrence {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::class_options::{DifficultyLevel, LocationType, Recurrence};
    use chrono::{DateTime, Duration, Utc};
    use std::str::FromStr;

    #[test]
    fn test_option_round_trips() {
        for level in [
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
            DifficultyLevel::Advanced,
            DifficultyLevel::AllLevels,
        ] {
            assert_eq!(DifficultyLevel::from_str(level.as_str()), Ok(level));
        }

        for location in [
            LocationType::InPerson,
            LocationType::Virtual,
            LocationType::Hybrid,
        ] {
            assert_eq!(LocationType::from_str(location.as_str()), Ok(location));
        }
    }

    #[test]
    fn test_next_occurrence_steps() {
        let start: DateTime<Utc> = "2026-01-15T09:00:00Z".parse().unwrap();

        assert_eq!(Recurrence::None.next_occurrence(start), None);
        assert_eq!(
            Recurrence::Daily.next_occurrence(start),
            Some(start + Duration::days(1))
        );
        assert_eq!(
            Recurrence::Weekly.next_occurrence(start),
            Some(start + Duration::weeks(1))
        );

        let monthly = Recurrence::Monthly.next_occurrence(start).unwrap();
        assert_eq!(monthly.to_rfc3339(), "2026-02-15T09:00:00+00:00");
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let start: DateTime<Utc> = "2026-01-31T09:00:00Z".parse().unwrap();

        let next = Recurrence::Monthly.next_occurrence(start).unwrap();
        assert_eq!(next.to_rfc3339(), "2026-02-28T09:00:00+00:00");
    }
}
