use crate::entities::users;
use chrono::{DateTime, Utc};
use models::role::UserRole;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::ServiceError;

/// Input for account registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub bio: String,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Filters for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub active_only: bool,
    pub search: Option<String>,
}

pub struct UserService;

impl UserService {
    /// Create the account row with its profile defaults in one step
    pub async fn register(
        db: &DatabaseConnection,
        new_user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<users::Model, ServiceError> {
        let email = new_user.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::Invalid(
                "enter a valid email address".to_string(),
            ));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::EmailTaken);
        }

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            phone_number: Set(new_user.phone_number),
            role: Set(new_user.role),
            is_active: Set(true),
            is_verified: Set(false),
            bio: Set(new_user.bio),
            profile_picture: Set(None),
            date_joined: Set(now),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<users::Model>, ServiceError> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<users::Model, ServiceError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn stamp_last_login(
        db: &DatabaseConnection,
        user: users::Model,
        now: DateTime<Utc>,
    ) -> Result<users::Model, ServiceError> {
        let mut update: users::ActiveModel = user.into();
        update.last_login = Set(Some(now));
        update.updated_at = Set(now);

        Ok(update.update(db).await?)
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user_id: Uuid,
        changes: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<users::Model, ServiceError> {
        let user = Self::find_by_id(db, user_id).await?;

        let mut update: users::ActiveModel = user.into();
        if let Some(first_name) = changes.first_name {
            update.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            update.last_name = Set(last_name);
        }
        if let Some(phone_number) = changes.phone_number {
            update.phone_number = Set(phone_number);
        }
        if let Some(bio) = changes.bio {
            update.bio = Set(bio);
        }
        if let Some(profile_picture) = changes.profile_picture {
            update.profile_picture = Set(Some(profile_picture));
        }
        update.updated_at = Set(now);

        Ok(update.update(db).await?)
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        user_id: Uuid,
        new_password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let user = Self::find_by_id(db, user_id).await?;

        let mut update: users::ActiveModel = user.into();
        update.password_hash = Set(new_password_hash);
        update.updated_at = Set(now);
        update.update(db).await?;

        Ok(())
    }

    /// Paginated user listing for the admin dashboard
    pub async fn list(
        db: &DatabaseConnection,
        filter: UserFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<users::Model>, u64), ServiceError> {
        let mut condition = Condition::all();

        if let Some(role) = filter.role {
            condition = condition.add(users::Column::Role.eq(role));
        }

        if filter.active_only {
            condition = condition.add(users::Column::IsActive.eq(true));
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search_condition = Condition::any()
                .add(users::Column::Email.like(format!("%{search}%")))
                .add(users::Column::FirstName.like(format!("%{search}%")))
                .add(users::Column::LastName.like(format!("%{search}%")));
            condition = condition.add(search_condition);
        }

        let query = users::Entity::find()
            .filter(condition)
            .order_by_desc(users::Column::DateJoined);

        let total_items = query.clone().count(db).await?;
        let paginator = query.paginate(db, per_page);
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total_items))
    }
}

#[cfg(test)]
mod test {
    use super::{NewUser, UserService};
    use crate::entities::users;
    use crate::services::ServiceError;
    use chrono::Utc;
    use models::role::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    fn user_fixture(email: &str) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "$2b$12$fixture".to_string(),
            first_name: "Jamie".to_string(),
            last_name: "Doe".to_string(),
            phone_number: String::new(),
            role: UserRole::User,
            is_active: true,
            is_verified: false,
            bio: String::new(),
            profile_picture: None,
            date_joined: now,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_fixture("taken@example.com")]])
            .into_connection();

        let new_user = NewUser {
            email: "taken@example.com".to_string(),
            password_hash: "$2b$12$fixture".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            role: UserRole::User,
            bio: String::new(),
        };
        let result = UserService::register(&db, new_user, Utc::now()).await;

        assert!(matches!(result, Err(ServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let new_user = NewUser {
            email: "not-an-email".to_string(),
            password_hash: "$2b$12$fixture".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            role: UserRole::User,
            bio: String::new(),
        };
        let result = UserService::register(&db, new_user, Utc::now()).await;

        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }
}
