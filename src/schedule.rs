use embassy_time::Duration;

use crate::configuration::DeviceConfiguration;

/// Where the device stands on its way to deep sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepPhase {
    Awake,
    AnnouncementDue,
    DeepSleepDue,
}

/// Runtime deadlines leading up to deep sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepSchedule {
    announcement: Duration,
    deep_sleep: Duration,
}

impl SleepSchedule {
    pub fn new(configuration: &DeviceConfiguration) -> Self {
        Self {
            announcement: configuration.deep_sleep_announcement_after(),
            deep_sleep: configuration.deep_sleep_after(),
        }
    }

    pub fn phase(&self, uptime: Duration) -> SleepPhase {
        if uptime >= self.deep_sleep {
            SleepPhase::DeepSleepDue
        } else if uptime >= self.announcement {
            SleepPhase::AnnouncementDue
        } else {
            SleepPhase::Awake
        }
    }

    pub fn until_announcement(&self, uptime: Duration) -> Duration {
        saturating_sub(self.announcement, uptime)
    }

    pub fn until_deep_sleep(&self, uptime: Duration) -> Duration {
        saturating_sub(self.deep_sleep, uptime)
    }
}

fn saturating_sub(deadline: Duration, uptime: Duration) -> Duration {
    deadline.checked_sub(uptime).unwrap_or(Duration::from_ticks(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[test]
    fn test_phases() {
        let schedule = SleepSchedule::new(&DeviceConfiguration::revision_2());

        assert_eq!(schedule.phase(minutes(0)), SleepPhase::Awake);
        assert_eq!(schedule.phase(minutes(54)), SleepPhase::Awake);
        assert_eq!(schedule.phase(minutes(55)), SleepPhase::AnnouncementDue);
        assert_eq!(schedule.phase(minutes(59)), SleepPhase::AnnouncementDue);
        assert_eq!(schedule.phase(minutes(60)), SleepPhase::DeepSleepDue);
        assert_eq!(schedule.phase(minutes(90)), SleepPhase::DeepSleepDue);
    }

    #[test]
    fn test_remaining_time_saturates() {
        let schedule = SleepSchedule::new(&DeviceConfiguration::revision_2());

        assert_eq!(schedule.until_announcement(minutes(50)), minutes(5));
        assert_eq!(schedule.until_deep_sleep(minutes(50)), minutes(10));
        assert_eq!(schedule.until_announcement(minutes(56)), minutes(0));
        assert_eq!(schedule.until_deep_sleep(minutes(61)), minutes(0));
    }
}
