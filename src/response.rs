use serde::Serialize;

use crate::error::{GeoError, GeoResult};

/// Envelope returned by every geolocation operation. Callers branch on
/// `success` instead of handling errors.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Converts a core result, logging what the user will not see.
    pub fn from_result(context: &str, result: GeoResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                match &err {
                    GeoError::Storage(_) => log::error!("{}: {}", context, err),
                    _ => log::debug!("{}: {}", context, err),
                }
                Self::failure(err.user_message())
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
