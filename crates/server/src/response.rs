use axum::Json;
use serde::Serialize;

/// Uniform response envelope returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub message: String,
    pub data: T,
    pub error: Option<String>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn success(message: &str, data: T) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            data,
            error: None,
        })
    }
}

impl ApiEnvelope<serde_json::Value> {
    pub fn failure(message: &str, error: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            data: serde_json::json!({}),
            error: Some(error.to_string()),
        })
    }
}

#[cfg(test)]
mod test {
    use super::ApiEnvelope;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiEnvelope::success("ok", serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&envelope.0).unwrap();

        assert_eq!(value["message"], "ok");
        assert_eq!(value["data"]["id"], 1);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = ApiEnvelope::failure("Error", "schedule not found");
        let value = serde_json::to_value(&envelope.0).unwrap();

        assert_eq!(value["message"], "Error");
        assert_eq!(value["error"], "schedule not found");
        assert_eq!(value["data"], serde_json::json!({}));
    }
}
