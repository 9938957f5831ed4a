use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::backend::gateway::GatewayError;

/// Body of every JSON response: `{ success, msg?, data? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    let body = Envelope {
        success: true,
        msg: None,
        data: Some(data),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn with_msg<T: Serialize>(status: StatusCode, msg: &str, data: T) -> Response {
    let body = Envelope {
        success: true,
        msg: Some(msg.to_string()),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

pub fn failure(status: StatusCode, msg: impl Into<String>) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        msg: Some(msg.into()),
        data: None,
    };
    (status, Json(body)).into_response()
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Store(e) => {
                error!(error = %e, "store failure");
                failure(status, "internal server error")
            }
            other => failure(status, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories_map_to_status_codes() {
        assert_eq!(
            GatewayError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Store(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn failure_envelope_omits_data() {
        let body: Envelope<()> = Envelope {
            success: false,
            msg: Some("goal not found".into()),
            data: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "msg": "goal not found"})
        );
    }
}
