//! Notification policy: which text goes out, whether it rings on the phone,
//! how often the chat may be messaged and how hard a failed send is retried.

use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

use embassy_time::{Duration, Instant};
use log::{info, warn};
use strum::EnumIter;

use crate::configuration::{DeviceConfiguration, NotificationSettings};

/// Events the device reports to the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Notification {
    ProjectStartup,
    DoorbellRinging,
    UpcomingDeepSleep,
    DeepSleep,
}

impl Notification {
    /// Lifecycle notifications happen once per boot and must not be dropped.
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Self::DoorbellRinging)
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ProjectStartup => write!(f, "Project startup"),
            Self::DoorbellRinging => write!(f, "Doorbell ringing"),
            Self::UpcomingDeepSleep => write!(f, "Upcoming deep sleep"),
            Self::DeepSleep => write!(f, "Deep sleep"),
        }
    }
}

impl NotificationSettings {
    pub fn message(&self, notification: Notification) -> &str {
        match notification {
            Notification::ProjectStartup => &self.project_startup_message,
            Notification::DoorbellRinging => &self.doorbell_ringing_message,
            Notification::UpcomingDeepSleep => &self.upcoming_deep_sleep_message,
            Notification::DeepSleep => &self.deep_sleep_message,
        }
    }

    /// Whether the notification is delivered without an alert on the
    /// receiving client
    pub fn is_silent(&self, notification: Notification) -> bool {
        match notification {
            Notification::ProjectStartup => self.silently_notify_project_startup,
            Notification::DoorbellRinging => self.silently_notify_doorbell_ringing,
            Notification::UpcomingDeepSleep => self.silently_notify_upcoming_deep_sleep,
            Notification::DeepSleep => self.silently_notify_deep_sleep,
        }
    }

    /// Whether the notification is sent at all
    pub fn is_enabled(&self, notification: Notification) -> bool {
        match notification {
            Notification::ProjectStartup | Notification::DoorbellRinging => true,
            Notification::UpcomingDeepSleep => self.notify_upcoming_deep_sleep,
            Notification::DeepSleep => self.notify_deep_sleep,
        }
    }
}

/// Enforces a minimum spacing between consecutive outbound notifications.
#[derive(Debug, Clone)]
pub struct NotificationLock {
    period: Duration,
    last_sent: Option<Instant>,
}

impl NotificationLock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_sent: None,
        }
    }

    /// Time left until the next notification may go out, `None` when the lock
    /// is free
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last_sent = self.last_sent?;
        let elapsed = now
            .checked_duration_since(last_sent)
            .unwrap_or(Duration::from_ticks(0));
        if elapsed >= self.period {
            None
        } else {
            Some(self.period - elapsed)
        }
    }

    /// Check whether a notification may go out at `now`.
    ///
    /// Fails with the remaining lock time while the lock is held. Succeeding
    /// does not start a new period, only [`engage`](Self::engage) does.
    pub fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        match self.remaining(now) {
            Some(remaining) => Err(remaining),
            None => Ok(()),
        }
    }

    /// Start a new lock period
    pub fn engage(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

/// Delivery backend of the notifications, e.g. a chat bot.
pub trait Notifier {
    type Error: Debug;

    fn send(&mut self, text: &str, silent: bool) -> Result<(), Self::Error>;
}

/// What happened to a dispatched notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered { attempts: u32 },
    Disabled,
    Locked { remaining: Duration },
    Failed { attempts: u32 },
}

/// Sends notifications according to the configured policy.
pub struct Dispatcher<'a, N> {
    settings: &'a NotificationSettings,
    lock: NotificationLock,
    retries: u32,
    notifier: N,
}

impl<'a, N: Notifier> Dispatcher<'a, N> {
    pub fn new(configuration: &'a DeviceConfiguration, notifier: N) -> Self {
        Self {
            settings: configuration.notifications(),
            lock: NotificationLock::new(configuration.notification_lock()),
            retries: configuration.notification_retries(),
            notifier,
        }
    }

    /// Send a notification, retrying a failed send up to the configured
    /// number of times.
    ///
    /// Only a successful delivery starts a new lock period.
    pub fn dispatch(&mut self, notification: Notification, now: Instant) -> Outcome {
        if !self.settings.is_enabled(notification) {
            info!("{} notification is disabled", notification);
            return Outcome::Disabled;
        }

        if let Err(remaining) = self.lock.try_acquire(now) {
            info!(
                "{} notification locked for another {}ms",
                notification,
                remaining.as_millis()
            );
            return Outcome::Locked { remaining };
        }

        let text = self.settings.message(notification);
        let silent = self.settings.is_silent(notification);
        let max_attempts = self.retries.saturating_add(1);

        let mut attempts = 0;
        while attempts < max_attempts {
            attempts += 1;
            match self.notifier.send(text, silent) {
                Ok(()) => {
                    self.lock.engage(now);
                    info!("{} notification delivered", notification);
                    return Outcome::Delivered { attempts };
                }
                Err(e) => warn!(
                    "Failed to send {} notification (attempt {}/{}): {:?}",
                    notification, attempts, max_attempts, e
                ),
            }
        }

        Outcome::Failed { attempts }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{
        string::{String, ToString},
        vec::Vec,
    };
    use strum::IntoEnumIterator;

    use crate::source::{ConfigurationSource, JsonSource};

    /// Records deliveries and fails the first `failures` sends
    #[derive(Default)]
    struct RecordingNotifier {
        failures: u32,
        sent: Vec<(String, bool)>,
        calls: u32,
    }

    impl Notifier for RecordingNotifier {
        type Error = &'static str;

        fn send(&mut self, text: &str, silent: bool) -> Result<(), Self::Error> {
            self.calls += 1;
            if self.calls <= self.failures {
                return Err("offline");
            }
            self.sent.push((text.to_string(), silent));
            Ok(())
        }
    }

    fn at(seconds: u64) -> Instant {
        Instant::from_secs(seconds)
    }

    #[test]
    fn test_default_messages() {
        let settings = NotificationSettings::defaults();

        assert_eq!(settings.message(Notification::ProjectStartup), "\u{1F442}");
        assert_eq!(settings.message(Notification::DoorbellRinging), "Knock Knock");
        assert_eq!(settings.message(Notification::UpcomingDeepSleep), "\u{1F629}");
        assert_eq!(settings.message(Notification::DeepSleep), "\u{1F4A4}");
    }

    #[test]
    fn test_default_silence_and_enablement() {
        let settings = NotificationSettings::defaults();

        assert!(settings.is_silent(Notification::ProjectStartup));
        assert!(!settings.is_silent(Notification::DoorbellRinging));
        assert!(Notification::iter().all(|n| settings.is_enabled(n)));
    }

    #[test]
    fn test_lock_spacing() {
        let mut lock = NotificationLock::new(Duration::from_secs(60));
        assert_eq!(lock.try_acquire(at(0)), Ok(()));
        // acquiring alone does not lock
        assert_eq!(lock.try_acquire(at(1)), Ok(()));

        lock.engage(at(10));
        assert_eq!(lock.remaining(at(10)), Some(Duration::from_secs(60)));
        assert_eq!(lock.try_acquire(at(40)), Err(Duration::from_secs(30)));
        assert_eq!(lock.try_acquire(at(69)), Err(Duration::from_secs(1)));
        assert_eq!(lock.try_acquire(at(70)), Ok(()));
        assert_eq!(lock.try_acquire(at(500)), Ok(()));
    }

    #[test]
    fn test_dispatch_delivers_and_locks() {
        let configuration = DeviceConfiguration::revision_1();
        let mut dispatcher = Dispatcher::new(&configuration, RecordingNotifier::default());

        assert_eq!(
            dispatcher.dispatch(Notification::ProjectStartup, at(0)),
            Outcome::Delivered { attempts: 1 }
        );
        assert_eq!(
            dispatcher.dispatch(Notification::DoorbellRinging, at(15)),
            Outcome::Locked {
                remaining: Duration::from_secs(45)
            }
        );
        assert_eq!(
            dispatcher.dispatch(Notification::DoorbellRinging, at(60)),
            Outcome::Delivered { attempts: 1 }
        );
        assert_eq!(
            dispatcher.notifier().sent,
            [
                ("\u{1F442}".to_string(), true),
                ("Knock Knock".to_string(), false)
            ]
        );
    }

    #[test]
    fn test_dispatch_retries() {
        let configuration = DeviceConfiguration::revision_2();
        let notifier = RecordingNotifier {
            failures: 3,
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(&configuration, notifier);

        assert_eq!(
            dispatcher.dispatch(Notification::DoorbellRinging, at(0)),
            Outcome::Delivered { attempts: 4 }
        );
    }

    #[test]
    fn test_dispatch_gives_up_without_locking() {
        let configuration = DeviceConfiguration::revision_2();
        let notifier = RecordingNotifier {
            failures: 4,
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(&configuration, notifier);

        assert_eq!(
            dispatcher.dispatch(Notification::DoorbellRinging, at(0)),
            Outcome::Failed { attempts: 4 }
        );
        assert_eq!(dispatcher.notifier().calls, 4);

        // the failed ring did not engage the lock
        assert_eq!(
            dispatcher.dispatch(Notification::DoorbellRinging, at(1)),
            Outcome::Delivered { attempts: 1 }
        );
    }

    #[test]
    fn test_dispatch_honours_disabled_and_silent_flags() {
        let configuration = JsonSource::new(
            r#"{
                "schema_version": 1,
                "NOTIFY_UPCOMING_DEEP_SLEEP": false,
                "SILENTLY_NOTIFY_DEEP_SLEEP": true
            }"#,
        )
        .load()
        .unwrap();
        let mut dispatcher = Dispatcher::new(&configuration, RecordingNotifier::default());

        assert_eq!(
            dispatcher.dispatch(Notification::UpcomingDeepSleep, at(0)),
            Outcome::Disabled
        );
        assert_eq!(
            dispatcher.dispatch(Notification::DeepSleep, at(0)),
            Outcome::Delivered { attempts: 1 }
        );
        assert_eq!(
            dispatcher.notifier().sent,
            [("\u{1F4A4}".to_string(), true)]
        );
    }

    #[test]
    fn test_only_doorbell_is_not_lifecycle() {
        let lifecycle: Vec<_> = Notification::iter().filter(|n| n.is_lifecycle()).collect();

        assert_eq!(
            lifecycle,
            [
                Notification::ProjectStartup,
                Notification::UpcomingDeepSleep,
                Notification::DeepSleep
            ]
        );
    }
}
