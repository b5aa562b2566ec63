//! Error types and handling for `MapWeather`

use thiserror::Error;

/// Failure of a single call to an upstream HTTP service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection failure or timeout
    #[error("Network error: {message}")]
    Network { message: String },

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned status {status}{}", reason_suffix(.reason))]
    Status { status: u16, reason: Option<String> },

    /// Body could not be decoded into the expected structure
    #[error("Parse error: {message}")]
    Parse { message: String },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

impl UpstreamError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new status error
    #[must_use]
    pub fn status(status: u16, reason: Option<String>) -> Self {
        Self::Status { status, reason }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16(), None)
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

/// Main error type for the `MapWeather` application
#[derive(Error, Debug)]
pub enum MapWeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Upstream service errors
    #[error("Upstream error: {source}")]
    Upstream {
        #[from]
        source: UpstreamError,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MapWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MapWeatherError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            MapWeatherError::Validation { message } => format!("Invalid input: {message}"),
            MapWeatherError::Upstream { source } => match source {
                UpstreamError::Network { .. } => {
                    "Unable to reach the weather service. Please check your internet connection."
                        .to_string()
                }
                UpstreamError::Status { status, .. } => {
                    format!("The weather service rejected the request (HTTP {status}).")
                }
                UpstreamError::Parse { .. } => {
                    "The weather service returned data that could not be read.".to_string()
                }
            },
            MapWeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
