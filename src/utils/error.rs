use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("APS API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Unexpected APS response: {message}")]
    ResponseFormatError { message: String },

    #[error("Upload failed: {message}")]
    UploadError { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Upload exceeds the {limit_mb} MB limit")]
    UploadTooLarge { limit_mb: usize },

    #[error("Zip archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Upstream,
    Request,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViewerError {
    /// 建立 APS API 錯誤
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ViewerError::ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ViewerError::InvalidRequest {
            message: message.into(),
        }
    }

    /// APS 回應 404 (bucket 不存在、manifest 尚未建立)
    pub fn is_not_found(&self) -> bool {
        match self {
            ViewerError::ApiError { status, .. } => *status == 404,
            ViewerError::HttpError(e) => e.status().map(|s| s.as_u16()) == Some(404),
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ViewerError::ConfigValidationError { .. }
            | ViewerError::InvalidConfigValueError { .. }
            | ViewerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ViewerError::HttpError(_) => ErrorCategory::Network,
            ViewerError::AuthError { .. } => ErrorCategory::Authentication,
            ViewerError::ApiError { .. }
            | ViewerError::ResponseFormatError { .. }
            | ViewerError::UploadError { .. } => ErrorCategory::Upstream,
            ViewerError::InvalidRequest { .. }
            | ViewerError::UploadTooLarge { .. }
            | ViewerError::ZipError(_) => ErrorCategory::Request,
            ViewerError::IoError(_) | ViewerError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ViewerError::MissingConfigError { field } => format!(
                "Set {} (APS_CLIENT_ID and APS_CLIENT_SECRET are both required; they may also be passed on the command line or in the [aps] table of the config file)",
                field
            ),
            ViewerError::ConfigValidationError { field, .. }
            | ViewerError::InvalidConfigValueError { field, .. } => {
                format!("Check the value of '{}' in your configuration", field)
            }
            ViewerError::AuthError { .. } => {
                "Verify the APS client id and secret, and that the app has access to the required APIs"
                    .to_string()
            }
            ViewerError::HttpError(_) => {
                "Check network connectivity to the APS endpoint and retry".to_string()
            }
            ViewerError::ApiError { status, .. } if *status == 409 => {
                "The bucket key is already taken by another application; configure a different bucket"
                    .to_string()
            }
            ViewerError::ApiError { .. } | ViewerError::ResponseFormatError { .. } => {
                "Retry the request; if the problem persists check the APS service status".to_string()
            }
            ViewerError::UploadError { .. } => "Retry the upload".to_string(),
            ViewerError::InvalidRequest { .. } | ViewerError::ZipError(_) => {
                "Fix the request and try again".to_string()
            }
            ViewerError::UploadTooLarge { .. } => {
                "Upload a smaller file or raise server.max_upload_mb".to_string()
            }
            ViewerError::IoError(_) | ViewerError::SerializationError(_) => {
                "Check file permissions and paths".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => "Could not reach Autodesk Platform Services".to_string(),
            ErrorCategory::Authentication => {
                "Could not authenticate with Autodesk Platform Services".to_string()
            }
            ErrorCategory::Upstream => format!("Autodesk Platform Services request failed: {}", self),
            ErrorCategory::Request => self.to_string(),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(ViewerError::api(404, "bucket not found").is_not_found());
        assert!(!ViewerError::api(403, "forbidden").is_not_found());
        assert!(!ViewerError::invalid_request("missing file").is_not_found());
    }

    #[test]
    fn test_category_and_severity() {
        let missing = ViewerError::MissingConfigError {
            field: "APS_CLIENT_ID".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert_eq!(missing.severity(), ErrorSeverity::Critical);

        let upstream = ViewerError::api(500, "boom");
        assert_eq!(upstream.category(), ErrorCategory::Upstream);
        assert_eq!(upstream.severity(), ErrorSeverity::Medium);

        let bad = ViewerError::invalid_request("no file");
        assert_eq!(bad.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_recovery_suggestion_mentions_field() {
        let err = ViewerError::MissingConfigError {
            field: "APS_CLIENT_SECRET".to_string(),
        };
        assert!(err.recovery_suggestion().contains("APS_CLIENT_SECRET"));

        let conflict = ViewerError::api(409, "conflict");
        assert!(conflict.recovery_suggestion().contains("bucket"));
    }
}
