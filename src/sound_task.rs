use embassy_time::{Duration, Instant, Timer};
use esp_hal::{
    analog::adc::{Adc, AdcConfig, Attenuation},
    peripherals::{ADC1, GPIO4},
};
use knock_knock::{notification::Notification, sound::SoundDetector, DeviceConfiguration};
use log::{debug, error, info, warn};

use crate::notify_task::NOTIFICATIONS;

/// Pause between two microphone readings
const SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

pub struct SoundPeripherals {
    pub microphone_pin: GPIO4<'static>,
    pub adc1: ADC1<'static>,
}

#[embassy_executor::task]
pub async fn sound_task(configuration: &'static DeviceConfiguration, p: SoundPeripherals) {
    info!("Create");
    let mut adc1_config = AdcConfig::new();
    let mut microphone_pin = adc1_config.enable_pin(p.microphone_pin, Attenuation::_11dB);
    let mut adc1 = Adc::new(p.adc1, adc1_config);

    let mut detector = SoundDetector::new(configuration);
    info!(
        "Listening for the doorbell, {}Hz window rate, threshold {}",
        detector.sampling_rate_hz(),
        configuration.sound_threshold()
    );

    loop {
        match nb::block!(adc1.read_oneshot(&mut microphone_pin)) {
            Ok(reading) => {
                if let Some(window) = detector.record(reading, Instant::now()) {
                    if window.ring {
                        info!("Doorbell ringing, amplitude {}", window.amplitude());
                        if NOTIFICATIONS.try_send(Notification::DoorbellRinging).is_err() {
                            warn!("Notification queue full, dropping ring");
                        }
                    } else {
                        debug!(
                            "Quiet window, amplitude {} over {} samples",
                            window.amplitude(),
                            window.samples
                        );
                    }
                }
            }
            Err(_) => error!("Error reading microphone"),
        }
        Timer::after(SAMPLE_INTERVAL).await;
    }
}
