use log::info;
use models::capacity::CancellationPolicy;

mod auth;
mod doc;
mod dtos;
mod error;
mod response;
mod routes;
mod state;
mod utils;

use auth::AuthConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let db = database::db::create_connection()
        .await
        .expect("failed to connect to database");

    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET is not set");
    let token_ttl_hours = env_i64("TOKEN_TTL_HOURS", AuthConfig::DEFAULT_TOKEN_TTL_HOURS);
    let cancellation_window_hours = env_i64(
        "CANCELLATION_WINDOW_HOURS",
        CancellationPolicy::DEFAULT_WINDOW_HOURS,
    );

    let state = AppState::new(
        db,
        AuthConfig::new(jwt_secret, token_ttl_hours),
        CancellationPolicy::new(cancellation_window_hours),
    );

    let app = routes::router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Running axum on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown::shutdown_signal())
        .await
        .unwrap();
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
