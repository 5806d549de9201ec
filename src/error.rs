use alloc::string::String;
use core::fmt::{Display, Formatter, Result};

use crate::{configuration::SchemaVersion, parameter::ParameterType};

/// A configuration error
#[derive(Debug)]
pub enum Error {
    UnknownParameter(String),
    InvalidValue {
        name: &'static str,
        expected: ParameterType,
    },
    NotInSchema {
        name: &'static str,
        version: SchemaVersion,
    },
    UnsupportedSchemaVersion(u64),
    ConflictingAlias {
        name: &'static str,
        alias: &'static str,
    },
    Json(serde_json::Error),
    AnnouncementNotBeforeDeepSleep {
        announcement_ms: u32,
        deep_sleep_ms: u32,
    },
    NotificationLockBelowRateLimit {
        lock_ms: u32,
        floor_ms: u32,
    },
    ZeroSampleWindow,
    InvalidSoundThreshold(f32),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Error::UnknownParameter(name) => write!(f, "Unknown parameter {name}"),
            Error::InvalidValue { name, expected } => {
                write!(f, "Parameter {name} expects a {expected} value")
            }
            Error::NotInSchema { name, version } => {
                write!(f, "Parameter {name} is not part of schema {version}")
            }
            Error::UnsupportedSchemaVersion(version) => {
                write!(f, "Unsupported schema version {version}")
            }
            Error::ConflictingAlias { name, alias } => {
                write!(f, "Parameters {name} and {alias} are set to different values")
            }
            Error::Json(e) => write!(f, "Malformed configuration document: {e}"),
            Error::AnnouncementNotBeforeDeepSleep {
                announcement_ms,
                deep_sleep_ms,
            } => write!(
                f,
                "Announcement at {announcement_ms} ms must precede deep sleep at {deep_sleep_ms} ms"
            ),
            Error::NotificationLockBelowRateLimit { lock_ms, floor_ms } => write!(
                f,
                "Notification lock of {lock_ms} ms is below the rate limit floor of {floor_ms} ms"
            ),
            Error::ZeroSampleWindow => write!(f, "Sample window width must not be zero"),
            Error::InvalidSoundThreshold(threshold) => {
                write!(f, "Sound threshold {threshold} must be finite and not negative")
            }
        }
    }
}

impl core::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}
