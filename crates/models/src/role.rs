use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use strum::EnumIter;

#[cfg(feature = "database")]
use sea_orm::Value;

/// Account role stored on every user row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular member who books sessions
    User,
    /// Owns classes and runs sessions
    Instructor,
    /// Full access, including analytics
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(role: &str) -> Result<Self, Self::Err> {
        match role {
            "user" => Ok(Self::User),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::ValueType for UserRole {
    fn try_from(v: Value) -> Result<Self, sea_orm::sea_query::ValueTypeErr> {
        match v {
            Value::String(Some(s)) => s.parse().map_err(|_| sea_orm::sea_query::ValueTypeErr),
            _ => Err(sea_orm::sea_query::ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "UserRole".to_string()
    }

    fn array_type() -> sea_orm::sea_query::ArrayType {
        sea_orm::sea_query::ArrayType::String
    }

    fn column_type() -> sea_orm::sea_query::ColumnType {
        sea_orm::sea_query::ColumnType::Text
    }
}

#[cfg(feature = "database")]
impl From<UserRole> for Value {
    fn from(role: UserRole) -> Self {
        Value::String(Some(Box::new(role.as_str().to_string())))
    }
}

#[cfg(feature = "database")]
impl sea_orm::TryGetable for UserRole {
    fn try_get_by<I: sea_orm::ColIdx>(
        res: &sea_orm::QueryResult,
        index: I,
    ) -> Result<Self, sea_orm::TryGetError> {
        let val: String = res.try_get_by(index)?;

        val.parse().map_err(|_| {
            sea_orm::TryGetError::DbErr(sea_orm::DbErr::Type(format!("unknown user role: {val}")))
        })
    }
}

#[cfg(feature = "database")]
impl sea_orm::sea_query::Nullable for UserRole {
    fn null() -> Value {
        Value::String(None)
    }
}

#[cfg(test)]
mod test {
    use crate::role::UserRole;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::User, UserRole::Instructor, UserRole::Admin] {
            assert_eq!(UserRole::from_str(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(UserRole::from_str("superuser").is_err());
        assert!(UserRole::from_str("").is_err());
    }
}
