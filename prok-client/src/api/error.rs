use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No authentication token found")]
    MissingToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("API error: {message}")]
    Api { status: u16, message: String },

    /// A 2xx body that did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build the error for a non-2xx response from its status and extracted message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            413 => ApiError::PayloadTooLarge(message),
            _ => ApiError::Api { status, message },
        }
    }

    /// HTTP status behind this error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::BadRequest(_) => Some(400),
            ApiError::NotFound(_) => Some(404),
            ApiError::PayloadTooLarge(_) => Some(413),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::MissingToken)
    }

    /// The message a user should see: the server's `error` field when there
    /// was one, otherwise a description of what failed.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::PayloadTooLarge(m) => m.clone(),
            ApiError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Prefix an error with a category so banners read consistently.
pub fn categorize_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
            "Network Error: Connection failed. Check your network and try again".to_string()
        }
        ApiError::MissingToken | ApiError::Unauthorized(_) => format!(
            "Authorization Error: {}. Please log in again",
            error.user_message()
        ),
        ApiError::BadRequest(_) | ApiError::PayloadTooLarge(_) => {
            format!("Validation Error: {}", error.user_message())
        }
        ApiError::Api { status, .. } if *status >= 500 => format!(
            "Server Error: {}. Please try again later",
            error.user_message()
        ),
        ApiError::Decode(_) => format!(
            "Response Error: the server sent data this client could not read ({})",
            error
        ),
        _ => format!("Error: {}", error.user_message()),
    }
}
