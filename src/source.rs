//! Where a [`DeviceConfiguration`] comes from.
//!
//! Consumers only ever see the [`ConfigurationSource`] trait. The firmware
//! uses the [`BuildTimeSource`], whose values are baked in by `build.rs` from
//! `KNOCK_KNOCK_<NAME>` environment variables at compile time. Hosted tools
//! may read the same parameters from a JSON document or from the runtime
//! environment instead.

use alloc::string::String;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{
    configuration::{DeviceConfiguration, NotificationSettings, SchemaVersion},
    error::Error,
    parameter::{Key, ParameterType, ParameterValue, ANNOUNCEMENT_ALIAS},
};

/// Prefix of the environment variables carrying parameter overrides.
pub const ENV_PREFIX: &str = "KNOCK_KNOCK_";

/// Name of the key selecting the schema revision in documents and lookups.
pub const SCHEMA_VERSION_KEY: &str = "SCHEMA_VERSION";

/// Provider of the device configuration.
///
/// Every implementation validates the configuration before handing it out.
pub trait ConfigurationSource {
    fn load(&self) -> Result<DeviceConfiguration, Error>;
}

/// Parameter values generated by `build.rs`
pub mod compiled {
    use crate::configuration::SchemaVersion;

    include!(concat!(env!("OUT_DIR"), "/settings.rs"));
}

const _: () = assert!(
    compiled::RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS
        < compiled::RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS,
    "deep sleep must be announced before it happens"
);
const _: () = assert!(
    compiled::NOTIFICATION_LOCK_IN_MILLISECONDS
        >= crate::config::NOTIFICATION_LOCK_FLOOR_IN_MILLISECONDS,
    "notification lock violates the messaging rate limit"
);
const _: () = assert!(
    compiled::SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS > 0,
    "sample window must not be empty"
);

/// The configuration baked into the binary.
pub const COMPILED: DeviceConfiguration = DeviceConfiguration::from_parts(
    compiled::SCHEMA_VERSION,
    compiled::DEBUG,
    compiled::RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS,
    compiled::RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS,
    compiled::NOTIFICATION_LOCK_IN_MILLISECONDS,
    compiled::NOTIFICATION_RETRIES,
    compiled::SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS,
    compiled::SOUND_THRESHOLD,
    if compiled::HAS_NOTIFICATION_EXTENSION {
        Some(NotificationSettings {
            notify_upcoming_deep_sleep: compiled::NOTIFY_UPCOMING_DEEP_SLEEP,
            notify_deep_sleep: compiled::NOTIFY_DEEP_SLEEP,
            silently_notify_project_startup: compiled::SILENTLY_NOTIFY_PROJECT_STARTUP,
            silently_notify_doorbell_ringing: compiled::SILENTLY_NOTIFY_DOORBELL_RINGING,
            silently_notify_upcoming_deep_sleep: compiled::SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP,
            silently_notify_deep_sleep: compiled::SILENTLY_NOTIFY_DEEP_SLEEP,
            project_startup_message: alloc::borrow::Cow::Borrowed(
                compiled::PROJECT_STARTUP_MESSAGE,
            ),
            doorbell_ringing_message: alloc::borrow::Cow::Borrowed(
                compiled::DOORBELL_RINGING_MESSAGE,
            ),
            upcoming_deep_sleep_message: alloc::borrow::Cow::Borrowed(
                compiled::UPCOMING_DEEP_SLEEP_MESSAGE,
            ),
            deep_sleep_message: alloc::borrow::Cow::Borrowed(compiled::DEEP_SLEEP_MESSAGE),
        })
    } else {
        None
    },
);

/// Configuration fixed at build time
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildTimeSource;

impl ConfigurationSource for BuildTimeSource {
    fn load(&self) -> Result<DeviceConfiguration, Error> {
        COMPILED.validate()?;
        Ok(COMPILED)
    }
}

/// Layers parameter overrides on top of the factory defaults of a schema
/// revision.
struct Overlay {
    configuration: DeviceConfiguration,
    // announcement value and whether it came in under the deprecated name
    announcement: Option<(u32, bool)>,
}

impl Overlay {
    fn new(schema_version: SchemaVersion) -> Self {
        Self {
            configuration: DeviceConfiguration::defaults(schema_version),
            announcement: None,
        }
    }

    fn apply(&mut self, key: Key, alias: bool, value: ParameterValue<'_>) -> Result<(), Error> {
        if alias {
            warn!("{ANNOUNCEMENT_ALIAS} is deprecated, use {}", key.name());
        }

        if let (Key::RuntimeBeforeDeepSleepAnnouncement, ParameterValue::UnsignedInteger(v)) =
            (key, value)
        {
            match self.announcement {
                Some((previous, previous_alias)) if previous_alias != alias && previous != v => {
                    return Err(Error::ConflictingAlias {
                        name: key.name(),
                        alias: ANNOUNCEMENT_ALIAS,
                    });
                }
                _ => self.announcement = Some((v, alias)),
            }
        }

        debug!("Override {} = {}", key.name(), value);
        self.configuration.assign(key, value)
    }

    fn finish(self) -> Result<DeviceConfiguration, Error> {
        self.configuration.validate()?;
        Ok(self.configuration)
    }
}

fn current_schema() -> u64 {
    SchemaVersion::Revision2.number().into()
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default = "current_schema", alias = "SCHEMA_VERSION")]
    schema_version: u64,
    #[serde(flatten)]
    parameters: Map<String, Value>,
}

/// Configuration read from a JSON document.
///
/// ```json
/// { "schema_version": 1, "SOUND_THRESHOLD": 850, "DOORBELL_RINGING_MESSAGE": "Ding Dong" }
/// ```
///
/// Parameters missing from the document keep their factory defaults. A
/// document without `schema_version` (or `SCHEMA_VERSION`) is read as the
/// current revision. A parameter listed twice takes its last value.
#[derive(Debug, Clone, Copy)]
pub struct JsonSource<'a> {
    document: &'a str,
}

impl<'a> JsonSource<'a> {
    pub fn new(document: &'a str) -> Self {
        Self { document }
    }
}

impl ConfigurationSource for JsonSource<'_> {
    fn load(&self) -> Result<DeviceConfiguration, Error> {
        let document: Document = serde_json::from_str(self.document)?;
        let mut overlay = Overlay::new(SchemaVersion::from_number(document.schema_version)?);

        for (name, value) in &document.parameters {
            let (key, alias) =
                Key::resolve(name).ok_or_else(|| Error::UnknownParameter(name.clone()))?;
            overlay.apply(key, alias, json_value(key, value)?)?;
        }

        overlay.finish()
    }
}

fn json_value(key: Key, value: &Value) -> Result<ParameterValue<'_>, Error> {
    match key.ty() {
        ParameterType::Bool => value.as_bool().map(ParameterValue::Bool),
        ParameterType::UnsignedInteger => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(ParameterValue::UnsignedInteger),
        ParameterType::Float => value.as_f64().map(|v| ParameterValue::Float(v as f32)),
        ParameterType::Text => value.as_str().map(ParameterValue::Text),
    }
    .ok_or(Error::InvalidValue {
        name: key.name(),
        expected: key.ty(),
    })
}

/// Configuration assembled from textual key/value lookups.
///
/// The lookup is asked for every parameter name, for the deprecated
/// announcement name and for [`SCHEMA_VERSION_KEY`]. Names it does not know
/// keep their factory defaults.
pub struct LookupSource<F> {
    lookup: F,
}

impl<F> LookupSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> ConfigurationSource for LookupSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self) -> Result<DeviceConfiguration, Error> {
        let schema_version = match (self.lookup)(SCHEMA_VERSION_KEY) {
            Some(raw) => {
                let number: u64 = raw.trim().parse().map_err(|_| Error::InvalidValue {
                    name: SCHEMA_VERSION_KEY,
                    expected: ParameterType::UnsignedInteger,
                })?;
                SchemaVersion::from_number(number)?
            }
            None => SchemaVersion::Revision2,
        };
        let mut overlay = Overlay::new(schema_version);

        let deprecated = (self.lookup)(ANNOUNCEMENT_ALIAS)
            .map(|raw| (Key::RuntimeBeforeDeepSleepAnnouncement, true, raw));
        let named = Key::iter()
            .filter_map(|key| (self.lookup)(key.name()).map(|raw| (key, false, raw)));

        for (key, alias, raw) in deprecated.into_iter().chain(named) {
            overlay.apply(key, alias, text_value(key, &raw)?)?;
        }

        overlay.finish()
    }
}

fn text_value(key: Key, raw: &str) -> Result<ParameterValue<'_>, Error> {
    let invalid = Error::InvalidValue {
        name: key.name(),
        expected: key.ty(),
    };
    let value = match key.ty() {
        ParameterType::Bool => match raw.trim() {
            "true" | "1" => ParameterValue::Bool(true),
            "false" | "0" => ParameterValue::Bool(false),
            _ => return Err(invalid),
        },
        ParameterType::UnsignedInteger => {
            ParameterValue::UnsignedInteger(raw.trim().parse().map_err(|_| invalid)?)
        }
        ParameterType::Float => ParameterValue::Float(raw.trim().parse().map_err(|_| invalid)?),
        ParameterType::Text => ParameterValue::Text(raw),
    };
    Ok(value)
}

/// Configuration read from `KNOCK_KNOCK_<NAME>` variables of the running
/// process.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentSource;

#[cfg(feature = "std")]
impl ConfigurationSource for EnvironmentSource {
    fn load(&self) -> Result<DeviceConfiguration, Error> {
        LookupSource::new(|name| std::env::var(alloc::format!("{ENV_PREFIX}{name}")).ok()).load()
    }
}
