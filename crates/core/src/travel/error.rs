use thiserror::Error;

/// Failure of a third-party travel data call
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{service} API key is not configured")]
    MissingApiKey { service: &'static str },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl FetchError {
    pub fn service(&self) -> &'static str {
        match self {
            FetchError::MissingApiKey { service }
            | FetchError::Status { service, .. }
            | FetchError::Transport { service, .. }
            | FetchError::Decode { service, .. } => *service,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::MissingApiKey { .. } => "missing_api_key",
            FetchError::Status { .. } => "status",
            FetchError::Transport { .. } => "transport",
            FetchError::Decode { .. } => "decode",
        }
    }

    pub(crate) fn decode(service: &'static str, message: impl Into<String>) -> Self {
        FetchError::Decode {
            service,
            message: message.into(),
        }
    }
}

/// Budget arithmetic overflowed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("Budget for {duration_days} days overflows")]
    Overflow { duration_days: u64 },
}

/// Trip form input rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TripRequestError {
    #[error("Please enter a destination.")]
    MissingDestination,

    #[error("Budget must be at least {minimum} USD.")]
    BudgetTooLow { minimum: u32 },

    #[error("Please select at least one interest.")]
    NoInterests,

    #[error("Unknown interest: {0}")]
    UnknownInterest(String),
}

/// Itinerary cannot be generated from the gathered data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Could not fetch weather or attractions. Please try again.")]
    MissingTripData,
}
