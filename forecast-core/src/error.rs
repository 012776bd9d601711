use thiserror::Error;

/// Failures that can end a fetch cycle.
///
/// None of these are fatal: the orchestrator reduces each one to a transient
/// notification (see [`ForecastError::user_message`]) and keeps whatever was
/// rendered before.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Malformed forecast response at `{field}`: {reason}")]
    MalformedResponse {
        field: String,
        reason: MalformedReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("invalid JSON ({0})")]
    InvalidJson(String),

    #[error("field is missing")]
    Missing,

    #[error("expected {0}")]
    WrongType(&'static str),

    #[error("unparsable timestamp '{0}'")]
    InvalidTimestamp(String),
}

impl ForecastError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MalformedResponse {
            field: field.into(),
            reason: MalformedReason::Missing,
        }
    }

    /// Text for the transient notification shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location permission denied. Using default location.",
            Self::LocationUnavailable(_) => "Error getting location. Using default location.",
            Self::TransportFailure(_) => "Error fetching weather data.",
            Self::MalformedResponse {
                reason: MalformedReason::InvalidTimestamp(_),
                ..
            } => "Error parsing date format.",
            Self::MalformedResponse { .. } => "Error parsing weather data.",
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportFailure(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportFailure(format!("request timed out: {err}"))
        } else {
            Self::TransportFailure(err.to_string())
        }
    }
}
