use esp_hal::peripherals::LPWR;
use esp_hal::rtc_cntl::Rtc;
use log::info;

/// Enter deep sleep mode for good.
///
/// No wakeup source is armed, only a reset or a power cycle brings the
/// device back.
pub fn enter_deep(rtc_cntl: LPWR<'static>) -> ! {
    let mut rtc = Rtc::new(rtc_cntl);

    info!("Entering deep sleep");
    rtc.sleep_deep(&[]);
}
