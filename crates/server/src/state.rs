use models::capacity::CancellationPolicy;
use sea_orm::DatabaseConnection;

use crate::auth::AuthConfig;

/// Shared application state. The connection pool is the single
/// serialization point for all durable state.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: AuthConfig,
    pub cancellation_policy: CancellationPolicy,
}

impl AppState {
    pub fn new(db: DatabaseConnection, auth: AuthConfig, cancellation_policy: CancellationPolicy) -> Self {
        Self {
            db,
            auth,
            cancellation_policy,
        }
    }
}
