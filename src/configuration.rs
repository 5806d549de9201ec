use alloc::{borrow::Cow, string::ToString};
use core::fmt::{Display, Formatter, Result as FmtResult};

use embassy_time::Duration;
use heapless::Vec;
use strum::IntoEnumIterator;

use crate::{
    config,
    error::Error,
    parameter::{Key, Parameter, ParameterValue},
};

/// Number of parameters known to any schema revision.
pub const PARAMETER_COUNT: usize = 17;

/// Revision of the parameter schema a configuration was written against.
///
/// Revision 2 is the current schema. Revision 1 additionally carries the
/// notification extension (enable flags, silent flags and message texts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Revision1,
    Revision2,
}

impl SchemaVersion {
    pub fn from_number(number: u64) -> Result<Self, Error> {
        match number {
            1 => Ok(Self::Revision1),
            2 => Ok(Self::Revision2),
            other => Err(Error::UnsupportedSchemaVersion(other)),
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Revision1 => 1,
            Self::Revision2 => 2,
        }
    }

    pub const fn has_notification_extension(self) -> bool {
        matches!(self, Self::Revision1)
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "revision {}", self.number())
    }
}

/// Notification extension of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettings {
    pub(crate) notify_upcoming_deep_sleep: bool,
    pub(crate) notify_deep_sleep: bool,
    pub(crate) silently_notify_project_startup: bool,
    pub(crate) silently_notify_doorbell_ringing: bool,
    pub(crate) silently_notify_upcoming_deep_sleep: bool,
    pub(crate) silently_notify_deep_sleep: bool,
    pub(crate) project_startup_message: Cow<'static, str>,
    pub(crate) doorbell_ringing_message: Cow<'static, str>,
    pub(crate) upcoming_deep_sleep_message: Cow<'static, str>,
    pub(crate) deep_sleep_message: Cow<'static, str>,
}

/// Used when a configuration carries no notification extension.
static DEFAULT_NOTIFICATIONS: NotificationSettings = NotificationSettings::defaults();

impl NotificationSettings {
    pub const fn defaults() -> Self {
        Self {
            notify_upcoming_deep_sleep: config::NOTIFY_UPCOMING_DEEP_SLEEP,
            notify_deep_sleep: config::NOTIFY_DEEP_SLEEP,
            silently_notify_project_startup: config::SILENTLY_NOTIFY_PROJECT_STARTUP,
            silently_notify_doorbell_ringing: config::SILENTLY_NOTIFY_DOORBELL_RINGING,
            silently_notify_upcoming_deep_sleep: config::SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP,
            silently_notify_deep_sleep: config::SILENTLY_NOTIFY_DEEP_SLEEP,
            project_startup_message: Cow::Borrowed(config::PROJECT_STARTUP_MESSAGE),
            doorbell_ringing_message: Cow::Borrowed(config::DOORBELL_RINGING_MESSAGE),
            upcoming_deep_sleep_message: Cow::Borrowed(config::UPCOMING_DEEP_SLEEP_MESSAGE),
            deep_sleep_message: Cow::Borrowed(config::DEEP_SLEEP_MESSAGE),
        }
    }

    fn value(&self, key: Key) -> Option<ParameterValue<'_>> {
        let value = match key {
            Key::NotifyUpcomingDeepSleep => ParameterValue::Bool(self.notify_upcoming_deep_sleep),
            Key::NotifyDeepSleep => ParameterValue::Bool(self.notify_deep_sleep),
            Key::SilentlyNotifyProjectStartup => {
                ParameterValue::Bool(self.silently_notify_project_startup)
            }
            Key::SilentlyNotifyDoorbellRinging => {
                ParameterValue::Bool(self.silently_notify_doorbell_ringing)
            }
            Key::SilentlyNotifyUpcomingDeepSleep => {
                ParameterValue::Bool(self.silently_notify_upcoming_deep_sleep)
            }
            Key::SilentlyNotifyDeepSleep => ParameterValue::Bool(self.silently_notify_deep_sleep),
            Key::ProjectStartupMessage => ParameterValue::Text(&self.project_startup_message),
            Key::DoorbellRingingMessage => ParameterValue::Text(&self.doorbell_ringing_message),
            Key::UpcomingDeepSleepMessage => {
                ParameterValue::Text(&self.upcoming_deep_sleep_message)
            }
            Key::DeepSleepMessage => ParameterValue::Text(&self.deep_sleep_message),
            _ => return None,
        };
        Some(value)
    }

    fn assign(&mut self, key: Key, value: ParameterValue<'_>) {
        match (key, value) {
            (Key::NotifyUpcomingDeepSleep, ParameterValue::Bool(v)) => {
                self.notify_upcoming_deep_sleep = v
            }
            (Key::NotifyDeepSleep, ParameterValue::Bool(v)) => self.notify_deep_sleep = v,
            (Key::SilentlyNotifyProjectStartup, ParameterValue::Bool(v)) => {
                self.silently_notify_project_startup = v
            }
            (Key::SilentlyNotifyDoorbellRinging, ParameterValue::Bool(v)) => {
                self.silently_notify_doorbell_ringing = v
            }
            (Key::SilentlyNotifyUpcomingDeepSleep, ParameterValue::Bool(v)) => {
                self.silently_notify_upcoming_deep_sleep = v
            }
            (Key::SilentlyNotifyDeepSleep, ParameterValue::Bool(v)) => {
                self.silently_notify_deep_sleep = v
            }
            (Key::ProjectStartupMessage, ParameterValue::Text(v)) => {
                self.project_startup_message = Cow::Owned(v.to_string())
            }
            (Key::DoorbellRingingMessage, ParameterValue::Text(v)) => {
                self.doorbell_ringing_message = Cow::Owned(v.to_string())
            }
            (Key::UpcomingDeepSleepMessage, ParameterValue::Text(v)) => {
                self.upcoming_deep_sleep_message = Cow::Owned(v.to_string())
            }
            (Key::DeepSleepMessage, ParameterValue::Text(v)) => {
                self.deep_sleep_message = Cow::Owned(v.to_string())
            }
            _ => {}
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Immutable set of device parameters.
///
/// A configuration is produced once by a
/// [`ConfigurationSource`](crate::ConfigurationSource) and only ever read
/// afterwards. There are no setters.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfiguration {
    schema_version: SchemaVersion,
    debug: bool,
    runtime_before_deep_sleep_announcement_ms: u32,
    runtime_before_deep_sleep_ms: u32,
    notification_lock_ms: u32,
    notification_retries: u32,
    sample_window_width_ms: u32,
    sound_threshold: f32,
    notifications: Option<NotificationSettings>,
}

impl DeviceConfiguration {
    /// Factory defaults of revision 1, notification extension included
    pub const fn revision_1() -> Self {
        Self::defaults(SchemaVersion::Revision1)
    }

    /// Factory defaults of revision 2
    pub const fn revision_2() -> Self {
        Self::defaults(SchemaVersion::Revision2)
    }

    pub const fn defaults(schema_version: SchemaVersion) -> Self {
        Self {
            schema_version,
            debug: config::DEBUG,
            runtime_before_deep_sleep_announcement_ms:
                config::RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS,
            runtime_before_deep_sleep_ms: config::RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS,
            notification_lock_ms: config::NOTIFICATION_LOCK_IN_MILLISECONDS,
            notification_retries: config::NOTIFICATION_RETRIES,
            sample_window_width_ms: config::SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS,
            sound_threshold: config::SOUND_THRESHOLD,
            notifications: if schema_version.has_notification_extension() {
                Some(NotificationSettings::defaults())
            } else {
                None
            },
        }
    }

    /// Assemble a configuration from raw values, used for compiled-in tables
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn from_parts(
        schema_version: SchemaVersion,
        debug: bool,
        runtime_before_deep_sleep_announcement_ms: u32,
        runtime_before_deep_sleep_ms: u32,
        notification_lock_ms: u32,
        notification_retries: u32,
        sample_window_width_ms: u32,
        sound_threshold: f32,
        notifications: Option<NotificationSettings>,
    ) -> Self {
        Self {
            schema_version,
            debug,
            runtime_before_deep_sleep_announcement_ms,
            runtime_before_deep_sleep_ms,
            notification_lock_ms,
            notification_retries,
            sample_window_width_ms,
            sound_threshold,
            notifications,
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Runtime after which the upcoming deep sleep is announced
    pub fn deep_sleep_announcement_after(&self) -> Duration {
        Duration::from_millis(self.runtime_before_deep_sleep_announcement_ms.into())
    }

    /// Runtime after which the device enters deep sleep
    pub fn deep_sleep_after(&self) -> Duration {
        Duration::from_millis(self.runtime_before_deep_sleep_ms.into())
    }

    /// Minimum spacing between two outbound notifications
    pub fn notification_lock(&self) -> Duration {
        Duration::from_millis(self.notification_lock_ms.into())
    }

    pub fn notification_retries(&self) -> u32 {
        self.notification_retries
    }

    pub fn sample_window_width(&self) -> Duration {
        Duration::from_millis(self.sample_window_width_ms.into())
    }

    pub fn sound_threshold(&self) -> f32 {
        self.sound_threshold
    }

    /// Notification extension as configured, `None` for revision 2
    pub fn notification_extension(&self) -> Option<&NotificationSettings> {
        self.notifications.as_ref()
    }

    /// Notification settings, falling back to the factory defaults when the
    /// schema carries no extension
    pub fn notifications(&self) -> &NotificationSettings {
        self.notifications.as_ref().unwrap_or(&DEFAULT_NOTIFICATIONS)
    }

    /// Look a parameter up by name.
    ///
    /// The deprecated revision 1 name of the announcement runtime resolves to
    /// the same value as the current name.
    pub fn get(&self, name: &str) -> Result<ParameterValue<'_>, Error> {
        let (key, _) =
            Key::resolve(name).ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        self.value(key).ok_or(Error::NotInSchema {
            name: key.name(),
            version: self.schema_version,
        })
    }

    /// Value of a parameter, `None` if it is not part of this schema revision
    pub fn value(&self, key: Key) -> Option<ParameterValue<'_>> {
        let value = match key {
            Key::Debug => ParameterValue::Bool(self.debug),
            Key::RuntimeBeforeDeepSleepAnnouncement => {
                ParameterValue::UnsignedInteger(self.runtime_before_deep_sleep_announcement_ms)
            }
            Key::RuntimeBeforeDeepSleep => {
                ParameterValue::UnsignedInteger(self.runtime_before_deep_sleep_ms)
            }
            Key::NotificationLock => ParameterValue::UnsignedInteger(self.notification_lock_ms),
            Key::NotificationRetries => ParameterValue::UnsignedInteger(self.notification_retries),
            Key::SampleWindowWidth => ParameterValue::UnsignedInteger(self.sample_window_width_ms),
            Key::SoundThreshold => ParameterValue::Float(self.sound_threshold),
            extension => return self.notifications.as_ref()?.value(extension),
        };
        Some(value)
    }

    /// All parameters of this schema revision, in declaration order
    pub fn parameters(&self) -> Vec<Parameter<'_>, PARAMETER_COUNT> {
        Key::iter()
            .filter_map(|key| self.value(key).map(|value| Parameter { key, value }))
            .collect()
    }

    /// Check the invariants every consumer relies on
    pub fn validate(&self) -> Result<(), Error> {
        if self.runtime_before_deep_sleep_announcement_ms >= self.runtime_before_deep_sleep_ms {
            return Err(Error::AnnouncementNotBeforeDeepSleep {
                announcement_ms: self.runtime_before_deep_sleep_announcement_ms,
                deep_sleep_ms: self.runtime_before_deep_sleep_ms,
            });
        }
        if self.notification_lock_ms < config::NOTIFICATION_LOCK_FLOOR_IN_MILLISECONDS {
            return Err(Error::NotificationLockBelowRateLimit {
                lock_ms: self.notification_lock_ms,
                floor_ms: config::NOTIFICATION_LOCK_FLOOR_IN_MILLISECONDS,
            });
        }
        if self.sample_window_width_ms == 0 {
            return Err(Error::ZeroSampleWindow);
        }
        if !self.sound_threshold.is_finite() || self.sound_threshold < 0.0 {
            return Err(Error::InvalidSoundThreshold(self.sound_threshold));
        }
        Ok(())
    }

    /// Overwrite a single parameter while a source assembles a configuration.
    pub(crate) fn assign(&mut self, key: Key, value: ParameterValue<'_>) -> Result<(), Error> {
        if value.ty() != key.ty() {
            return Err(Error::InvalidValue {
                name: key.name(),
                expected: key.ty(),
            });
        }

        match (key, value) {
            (Key::Debug, ParameterValue::Bool(v)) => self.debug = v,
            (Key::RuntimeBeforeDeepSleepAnnouncement, ParameterValue::UnsignedInteger(v)) => {
                self.runtime_before_deep_sleep_announcement_ms = v
            }
            (Key::RuntimeBeforeDeepSleep, ParameterValue::UnsignedInteger(v)) => {
                self.runtime_before_deep_sleep_ms = v
            }
            (Key::NotificationLock, ParameterValue::UnsignedInteger(v)) => {
                self.notification_lock_ms = v
            }
            (Key::NotificationRetries, ParameterValue::UnsignedInteger(v)) => {
                self.notification_retries = v
            }
            (Key::SampleWindowWidth, ParameterValue::UnsignedInteger(v)) => {
                self.sample_window_width_ms = v
            }
            (Key::SoundThreshold, ParameterValue::Float(v)) => self.sound_threshold = v,
            (extension, value) => match self.notifications.as_mut() {
                Some(notifications) => notifications.assign(extension, value),
                None => {
                    return Err(Error::NotInSchema {
                        name: extension.name(),
                        version: self.schema_version,
                    })
                }
            },
        }
        Ok(())
    }
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self::revision_2()
    }
}
