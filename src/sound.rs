use embassy_time::{Duration, Instant};

use crate::configuration::DeviceConfiguration;

/// Summary of one closed sample window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Lowest reading seen in the window
    pub min: u16,
    /// Highest reading seen in the window
    pub max: u16,
    pub samples: u32,
    /// Whether the peak-to-peak amplitude reached the sound threshold
    pub ring: bool,
}

impl Window {
    /// Peak-to-peak amplitude of the window
    pub fn amplitude(&self) -> u16 {
        self.max - self.min
    }
}

/// Classifies microphone readings into doorbell rings, one sample window at
/// a time.
///
/// The microphone amplifier is biased at mid-rail, so a window is judged by
/// the swing of its readings rather than by their level.
#[derive(Debug, Clone)]
pub struct SoundDetector {
    width: Duration,
    threshold: f32,
    opened_at: Option<Instant>,
    min: u16,
    max: u16,
    samples: u32,
}

impl SoundDetector {
    pub fn new(configuration: &DeviceConfiguration) -> Self {
        Self::with(
            configuration.sample_window_width(),
            configuration.sound_threshold(),
        )
    }

    pub fn with(width: Duration, threshold: f32) -> Self {
        Self {
            width,
            threshold,
            opened_at: None,
            min: u16::MAX,
            max: 0,
            samples: 0,
        }
    }

    /// Windows evaluated per second
    pub fn sampling_rate_hz(&self) -> u64 {
        1_000 / self.width.as_millis().max(1)
    }

    pub fn is_ring(&self, amplitude: u16) -> bool {
        f32::from(amplitude) >= self.threshold
    }

    /// Feed one reading taken at `now`.
    ///
    /// Returns the previous window once `now` lies past its end. The reading
    /// itself opens the next window. Readings older than the open window are
    /// dropped.
    pub fn record(&mut self, reading: u16, now: Instant) -> Option<Window> {
        let closed = match self.opened_at {
            Some(opened_at) if now.checked_duration_since(opened_at)? >= self.width => {
                Some(self.close())
            }
            _ => None,
        };

        if self.opened_at.is_none() {
            self.opened_at = Some(now);
        }
        self.min = self.min.min(reading);
        self.max = self.max.max(reading);
        self.samples += 1;

        closed
    }

    fn close(&mut self) -> Window {
        let mut window = Window {
            min: self.min,
            max: self.max,
            samples: self.samples,
            ring: false,
        };
        window.ring = self.is_ring(window.amplitude());

        self.opened_at = None;
        self.min = u16::MAX;
        self.max = 0;
        self.samples = 0;
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SoundDetector {
        SoundDetector::new(&DeviceConfiguration::revision_2())
    }

    #[test]
    fn test_default_cadence_is_20_hz() {
        assert_eq!(detector().sampling_rate_hz(), 20);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let detector = detector();

        assert!(!detector.is_ring(972));
        assert!(detector.is_ring(973));
        assert!(detector.is_ring(4095));
    }

    #[test]
    fn test_window_closes_after_width() {
        let mut detector = detector();

        assert_eq!(detector.record(1_000, Instant::from_millis(0)), None);
        assert_eq!(detector.record(2_990, Instant::from_millis(20)), None);
        assert_eq!(detector.record(1_500, Instant::from_millis(49)), None);

        let window = detector.record(2_048, Instant::from_millis(50)).unwrap();
        assert_eq!(
            window,
            Window {
                min: 1_000,
                max: 2_990,
                samples: 3,
                ring: true
            }
        );
        assert_eq!(window.amplitude(), 1_990);

        // the reading at 50ms opened the next, quiet window
        let window = detector.record(2_050, Instant::from_millis(100)).unwrap();
        assert_eq!(
            window,
            Window {
                min: 2_048,
                max: 2_048,
                samples: 1,
                ring: false
            }
        );
    }

    #[test]
    fn test_biased_silence_is_not_a_ring() {
        let mut detector = detector();

        let windows: Vec<Window> = (0..=50u64)
            .filter_map(|ms| {
                let reading = 2_048 + (ms % 5) as u16;
                detector.record(reading, Instant::from_millis(ms))
            })
            .collect();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].max, 2_052);
        assert_eq!(windows[0].amplitude(), 4);
        assert_eq!(windows[0].samples, 50);
        assert!(!windows[0].ring);
    }

    #[test]
    fn test_reading_from_the_past_is_ignored() {
        let mut detector = detector();

        detector.record(100, Instant::from_millis(100));
        assert_eq!(detector.record(999, Instant::from_millis(10)), None);
    }
}
