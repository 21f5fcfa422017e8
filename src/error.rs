use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Unauthorized(String),
    RateLimited(String),
    Vendor(String),
    NoProperty,
    UnknownRoom(i64),
}

impl Error {
    /// Transient transport-level failure. Entities degrade to unavailable
    /// instead of surfacing this to the user.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Error::RateLimited(msg) => write!(f, "rate limited by vendor: {msg}"),
            Error::Vendor(msg) => write!(f, "vendor error: {msg}"),
            Error::NoProperty => write!(f, "account has no property"),
            Error::UnknownRoom(id) => write!(f, "unknown room: {id}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
