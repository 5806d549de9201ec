use core::fmt::{Display, Formatter, Result};

use strum::{EnumIter, EnumString, IntoStaticStr};

/// Name under which revision 1 of the schema stored the announcement runtime.
pub const ANNOUNCEMENT_ALIAS: &str =
    "RUNTIME_BEFORE_UPCOMING_DEEP_SLEEP_NOTIFICATION_IN_MILLISECONDS";

/// Every parameter known to any revision of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum Key {
    #[strum(serialize = "DEBUG")]
    Debug,
    #[strum(serialize = "NOTIFY_UPCOMING_DEEP_SLEEP")]
    NotifyUpcomingDeepSleep,
    #[strum(serialize = "NOTIFY_DEEP_SLEEP")]
    NotifyDeepSleep,
    #[strum(serialize = "SILENTLY_NOTIFY_PROJECT_STARTUP")]
    SilentlyNotifyProjectStartup,
    #[strum(serialize = "SILENTLY_NOTIFY_DOORBELL_RINGING")]
    SilentlyNotifyDoorbellRinging,
    #[strum(serialize = "SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP")]
    SilentlyNotifyUpcomingDeepSleep,
    #[strum(serialize = "SILENTLY_NOTIFY_DEEP_SLEEP")]
    SilentlyNotifyDeepSleep,
    #[strum(serialize = "RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS")]
    RuntimeBeforeDeepSleepAnnouncement,
    #[strum(serialize = "RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS")]
    RuntimeBeforeDeepSleep,
    #[strum(serialize = "NOTIFICATION_LOCK_IN_MILLISECONDS")]
    NotificationLock,
    #[strum(serialize = "NOTIFICATION_RETRIES")]
    NotificationRetries,
    #[strum(serialize = "SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS")]
    SampleWindowWidth,
    #[strum(serialize = "SOUND_THRESHOLD")]
    SoundThreshold,
    #[strum(serialize = "PROJECT_STARTUP_MESSAGE")]
    ProjectStartupMessage,
    #[strum(serialize = "DOORBELL_RINGING_MESSAGE")]
    DoorbellRingingMessage,
    #[strum(serialize = "UPCOMING_DEEP_SLEEP_MESSAGE")]
    UpcomingDeepSleepMessage,
    #[strum(serialize = "DEEP_SLEEP_MESSAGE")]
    DeepSleepMessage,
}

impl Key {
    /// Resolve a parameter name, accepting the deprecated announcement alias.
    ///
    /// The second element tells whether the alias was used.
    pub fn resolve(name: &str) -> Option<(Self, bool)> {
        if name == ANNOUNCEMENT_ALIAS {
            return Some((Self::RuntimeBeforeDeepSleepAnnouncement, true));
        }
        name.parse().ok().map(|key| (key, false))
    }

    /// Canonical name of the parameter
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn ty(self) -> ParameterType {
        match self {
            Self::Debug
            | Self::NotifyUpcomingDeepSleep
            | Self::NotifyDeepSleep
            | Self::SilentlyNotifyProjectStartup
            | Self::SilentlyNotifyDoorbellRinging
            | Self::SilentlyNotifyUpcomingDeepSleep
            | Self::SilentlyNotifyDeepSleep => ParameterType::Bool,
            Self::RuntimeBeforeDeepSleepAnnouncement
            | Self::RuntimeBeforeDeepSleep
            | Self::NotificationLock
            | Self::NotificationRetries
            | Self::SampleWindowWidth => ParameterType::UnsignedInteger,
            Self::SoundThreshold => ParameterType::Float,
            Self::ProjectStartupMessage
            | Self::DoorbellRingingMessage
            | Self::UpcomingDeepSleepMessage
            | Self::DeepSleepMessage => ParameterType::Text,
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            Self::RuntimeBeforeDeepSleepAnnouncement
            | Self::RuntimeBeforeDeepSleep
            | Self::NotificationLock
            | Self::SampleWindowWidth => Unit::Milliseconds,
            Self::NotificationRetries => Unit::Count,
            Self::SoundThreshold => Unit::Amplitude,
            _ => Unit::None,
        }
    }

    /// Whether the parameter belongs to the notification extension that only
    /// revision 1 of the schema carries.
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Self::NotifyUpcomingDeepSleep
                | Self::NotifyDeepSleep
                | Self::SilentlyNotifyProjectStartup
                | Self::SilentlyNotifyDoorbellRinging
                | Self::SilentlyNotifyUpcomingDeepSleep
                | Self::SilentlyNotifyDeepSleep
                | Self::ProjectStartupMessage
                | Self::DoorbellRingingMessage
                | Self::UpcomingDeepSleepMessage
                | Self::DeepSleepMessage
        )
    }

    pub fn documentation(self) -> Option<&'static str> {
        match self {
            Self::Debug => Some("Verbose logging"),
            Self::NotifyUpcomingDeepSleep => Some("Send a warning before going to deep sleep"),
            Self::NotifyDeepSleep => Some("Send a notification when entering deep sleep"),
            Self::SilentlyNotifyProjectStartup
            | Self::SilentlyNotifyDoorbellRinging
            | Self::SilentlyNotifyUpcomingDeepSleep
            | Self::SilentlyNotifyDeepSleep => {
                Some("Deliver without sound on the receiving client")
            }
            Self::RuntimeBeforeDeepSleepAnnouncement => Some("55 minutes"),
            Self::RuntimeBeforeDeepSleep => Some("1 hour"),
            Self::NotificationLock => {
                Some("Telegram allows 20 messages per minute per chat, 3 s is the failsafe floor")
            }
            Self::NotificationRetries => Some("Resends after a failed delivery"),
            Self::SampleWindowWidth => Some("50 ms = 20Hz"),
            Self::SoundThreshold => {
                Some("Peak-to-peak amplitude of a window that counts as a ring")
            }
            Self::ProjectStartupMessage => Some("`ear` emoji"),
            Self::UpcomingDeepSleepMessage => Some("`weary face` emoji"),
            Self::DeepSleepMessage => Some("`sleeping symbol` emoji"),
            Self::DoorbellRingingMessage => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Bool,
    UnsignedInteger,
    Float,
    Text,
}

impl Display for ParameterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Bool => write!(f, "boolean"),
            Self::UnsignedInteger => write!(f, "unsigned integer"),
            Self::Float => write!(f, "floating point"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Milliseconds,
    Count,
    Amplitude,
    None,
}

impl Unit {
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::Milliseconds => Some("ms"),
            Self::Amplitude => Some("amplitude"),
            Self::Count | Self::None => None,
        }
    }
}

/// A typed parameter value, text borrowed from the owning configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue<'a> {
    Bool(bool),
    UnsignedInteger(u32),
    Float(f32),
    Text(&'a str),
}

impl ParameterValue<'_> {
    pub fn ty(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::UnsignedInteger(_) => ParameterType::UnsignedInteger,
            Self::Float(_) => ParameterType::Float,
            Self::Text(_) => ParameterType::Text,
        }
    }
}

impl Display for ParameterValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::UnsignedInteger(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// One entry of the parameter table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter<'a> {
    pub key: Key,
    pub value: ParameterValue<'a>,
}

impl Parameter<'_> {
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn unit(&self) -> Unit {
        self.key.unit()
    }

    pub fn documentation(&self) -> Option<&'static str> {
        self.key.documentation()
    }
}

impl Display for Parameter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} = {}", self.name(), self.value)?;
        match self.unit().symbol() {
            Some(unit) => write!(f, " {unit}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip_through_resolve() {
        for key in Key::iter() {
            assert_eq!(Key::resolve(key.name()), Some((key, false)));
        }
    }

    #[test]
    fn test_alias_resolves_to_announcement() {
        assert_eq!(
            Key::resolve(ANNOUNCEMENT_ALIAS),
            Some((Key::RuntimeBeforeDeepSleepAnnouncement, true))
        );
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(Key::resolve("SOUND_THRESHOLD_DB"), None);
        assert_eq!(Key::resolve("sound_threshold"), None);
    }

    #[test]
    fn test_ten_extension_parameters() {
        assert_eq!(Key::iter().filter(|key| key.is_extension()).count(), 10);
        assert_eq!(Key::iter().filter(|key| !key.is_extension()).count(), 7);
    }

    #[test]
    fn test_units() {
        assert_eq!(Key::SampleWindowWidth.unit(), Unit::Milliseconds);
        assert_eq!(Key::NotificationRetries.unit(), Unit::Count);
        assert_eq!(Key::SoundThreshold.unit(), Unit::Amplitude);
        assert_eq!(Key::DeepSleepMessage.unit(), Unit::None);
    }
}
