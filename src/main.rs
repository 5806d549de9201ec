#![no_std]
#![no_main]

use core::fmt::{Display, Formatter};

use embassy_executor::{SpawnError, Spawner};
use embassy_time::{Duration, Instant, Timer};
use esp_alloc::heap_allocator;
use esp_hal::{system::software_reset, timer::timg::TimerGroup};
use knock_knock::{
    notification::Notification,
    schedule::SleepSchedule,
    source::{compiled, BuildTimeSource},
    ConfigurationSource, DeviceConfiguration,
};
use log::{error, info, LevelFilter};
use notify_task::{notify_task, DELIVERED, NOTIFICATIONS};
use sleep::enter_deep;
use sound_task::{sound_task, SoundPeripherals};
use static_cell::StaticCell;
use {esp_backtrace as _, esp_println as _};

extern crate alloc;

mod notify_task;
mod sleep;
mod sound_task;

esp_bootloader_esp_idf::esp_app_desc!();

/// Configuration shared by all tasks, loaded once at boot
static CONFIGURATION: StaticCell<DeviceConfiguration> = StaticCell::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let level = if compiled::DEBUG {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    esp_println::logger::init_logger(level);

    if let Err(error) = main_fallible(spawner).await {
        error!("Error while running firmware: {}", error);
    }
    software_reset()
}

async fn main_fallible(spawner: Spawner) -> Result<(), Error> {
    let peripherals = esp_hal::init(esp_hal::Config::default());

    heap_allocator!(size: 32 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let configuration: &'static DeviceConfiguration =
        CONFIGURATION.init(BuildTimeSource.load()?);

    info!(
        "Loaded configuration, schema {}",
        configuration.schema_version()
    );
    for parameter in configuration.parameters() {
        info!("  {}", parameter);
    }

    spawner.spawn(notify_task(configuration)?);
    NOTIFICATIONS.send(Notification::ProjectStartup).await;

    // see https://github.com/Xinyuan-LilyGO/T-Display-S3/blob/main/image/T-DISPLAY-S3.jpg
    let sound_peripherals = SoundPeripherals {
        microphone_pin: peripherals.GPIO4,
        adc1: peripherals.ADC1,
    };
    spawner.spawn(sound_task(configuration, sound_peripherals)?);

    let schedule = SleepSchedule::new(configuration);

    let wait = schedule.until_announcement(uptime());
    info!("Stay awake for {}s", wait.as_secs());
    Timer::after(wait).await;
    info!("Sleep phase: {:?}", schedule.phase(uptime()));
    NOTIFICATIONS.send(Notification::UpcomingDeepSleep).await;

    Timer::after(schedule.until_deep_sleep(uptime())).await;
    info!("Sleep phase: {:?}", schedule.phase(uptime()));
    NOTIFICATIONS.send(Notification::DeepSleep).await;

    // the last notification has to go out before the device powers down
    while DELIVERED.wait().await != Notification::DeepSleep {}

    enter_deep(peripherals.LPWR);
}

fn uptime() -> Duration {
    Duration::from_ticks(Instant::now().as_ticks())
}

#[derive(Debug)]
enum Error {
    Configuration(knock_knock::Error),
    Spawn(SpawnError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "Invalid configuration: {e}"),
            Error::Spawn(e) => write!(f, "Cannot spawn task: {e:?}"),
        }
    }
}

impl From<knock_knock::Error> for Error {
    fn from(error: knock_knock::Error) -> Self {
        Self::Configuration(error)
    }
}

impl From<SpawnError> for Error {
    fn from(error: SpawnError) -> Self {
        Self::Spawn(error)
    }
}
