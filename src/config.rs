use std::fmt;
use std::time::Duration;

use crate::Error;
use crate::client::TikoClient;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(300);

/// Account credentials as collected by the host's setup form.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Setup-time failure codes, shaped for a host form ("invalid_auth" style
/// error keys rather than free text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    InvalidAuth,
    RateLimited,
    NoRooms,
    CannotConnect,
    Unknown,
}

impl SetupError {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupError::InvalidAuth => "invalid_auth",
            SetupError::RateLimited => "rate_limit",
            SetupError::NoRooms => "no_rooms",
            SetupError::CannotConnect => "cannot_connect",
            SetupError::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for SetupError {}

impl From<&Error> for SetupError {
    fn from(err: &Error) -> Self {
        match err {
            Error::Unauthorized(_) => SetupError::InvalidAuth,
            Error::RateLimited(_) => SetupError::RateLimited,
            Error::NoProperty => SetupError::NoRooms,
            Error::Http(_) => SetupError::CannotConnect,
            _ => SetupError::Unknown,
        }
    }
}

/// Check credentials against the live vendor API: log in, then make sure the
/// account actually has rooms to control.
pub async fn validate_credentials(client: &TikoClient) -> Result<(), SetupError> {
    client.authenticate().await.map_err(|e| SetupError::from(&e))?;
    let rooms = client.list_rooms().await.map_err(|e| SetupError::from(&e))?;
    if rooms.is_empty() {
        return Err(SetupError::NoRooms);
    }
    Ok(())
}
