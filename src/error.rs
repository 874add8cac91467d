use poem::{error::ResponseError, http::StatusCode};

pub type Result<T, E = DashError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DashError {
    /// Non-2xx response or transport failure. `status` is absent when no
    /// response was received at all.
    Network {
        url: String,
        status: Option<u16>,
        reason: String,
    },
    MalformedUrl(String),
    /// The requested page has no provider page number.
    PageOutOfRange(u32),
    Parse(String),
    Discovery(String),
    Config(String),
}

impl std::fmt::Display for DashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashError::Network {
                url,
                status: Some(status),
                reason,
            } => write!(f, "request to {} failed with status {}: {}", url, status, reason),
            DashError::Network { url, reason, .. } => {
                write!(f, "request to {} failed: {}", url, reason)
            }
            DashError::MalformedUrl(url) => write!(f, "malformed build url {:?}", url),
            DashError::PageOutOfRange(page) => write!(f, "page {} is out of range", page),
            DashError::Parse(msg) => write!(f, "unexpected response body: {}", msg),
            DashError::Discovery(name) => write!(f, "no base url known for service {:?}", name),
            DashError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl DashError {
    pub fn network(url: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl ResponseError for DashError {
    fn status(&self) -> StatusCode {
        match self {
            DashError::Network {
                status: Some(status),
                ..
            } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            DashError::PageOutOfRange(_) => StatusCode::BAD_REQUEST,
            DashError::Config(_) | DashError::Discovery(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}
