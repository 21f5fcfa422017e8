mod client;
mod config;
mod coordinator;
mod entity;
mod error;
mod graphql;
mod logger;
mod token;
mod types;

pub use client::{TikoClient, TikoClientBuilder};
pub use config::{Credentials, DEFAULT_SCAN_INTERVAL, SetupError, validate_credentials};
pub use coordinator::{TikoCoordinator, TikoCoordinatorBuilder};
pub use entity::{
    ClimateEntity, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE, SensorEntity, SensorKind,
    TARGET_TEMPERATURE_STEP,
};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use token::{Session, TokenManager};
pub use types::*;
