use axum::http::StatusCode;

/// Simple endpoint that identifies the service
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", content_type = "text/plain", body = String)
    ),
    tag = ""
)]
pub async fn root() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Get Fit API")
}
