use thiserror::Error;

/// Errors raised by the geolocation core. The façade turns every variant into
/// a failed [`ApiResponse`](crate::response::ApiResponse).
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type GeoResult<T> = Result<T, GeoError>;

impl GeoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Message safe to show to warehouse staff. Storage details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<sqlx::Error> for GeoError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_details_are_hidden_from_users() {
        let err = GeoError::Storage("connection reset by peer".to_string());
        assert_eq!(err.user_message(), "Internal server error");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn domain_messages_pass_through() {
        let err = GeoError::conflict("Location A1-02-03 is already occupied");
        assert_eq!(err.user_message(), "Location A1-02-03 is already occupied");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }
}
