use actix_web::web;
use serde::Serialize;

/// Success envelope: `{success: true, message, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok<M: Into<String>>(message: M, data: T) -> web::Json<Self> {
        web::Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    /// Success with a message only, no payload.
    pub fn ok_message<M: Into<String>>(message: M) -> web::Json<Self> {
        web::Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::ok("xong", serde_json::json!({"id": 1}));
        let json = serde_json::to_string(&body.0).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"xong\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_message_only_omits_data() {
        let body = ApiResponse::ok_message("xong");
        let json = serde_json::to_string(&body.0).unwrap();
        assert!(!json.contains("\"data\""));
    }
}
