use core::convert::Infallible;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Instant, Timer};
use esp_println::println;
use knock_knock::{
    notification::{Dispatcher, Notification, Notifier, Outcome},
    DeviceConfiguration,
};
use log::{info, warn};

/// Notifications waiting to be dispatched
pub static NOTIFICATIONS: Channel<CriticalSectionRawMutex, Notification, 4> = Channel::new();

/// Raised once a lifecycle notification has been dealt with
pub static DELIVERED: Signal<CriticalSectionRawMutex, Notification> = Signal::new();

/// Writes notifications to the serial console.
///
/// The chat bot lives on the other end of the console line.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    type Error = Infallible;

    fn send(&mut self, text: &str, silent: bool) -> Result<(), Self::Error> {
        if silent {
            println!("NOTIFY silent {}", text);
        } else {
            println!("NOTIFY {}", text);
        }
        Ok(())
    }
}

#[embassy_executor::task]
pub async fn notify_task(configuration: &'static DeviceConfiguration) {
    info!("Created a notify task");
    let mut dispatcher = Dispatcher::new(configuration, ConsoleNotifier);

    loop {
        let notification = NOTIFICATIONS.receive().await;

        loop {
            match dispatcher.dispatch(notification, Instant::now()) {
                // lifecycle notifications wait for the lock, rings are dropped
                Outcome::Locked { remaining } if notification.is_lifecycle() => {
                    Timer::after(remaining).await;
                }
                Outcome::Failed { attempts } => {
                    warn!("Giving up on {} after {} attempts", notification, attempts);
                    break;
                }
                _ => break,
            }
        }

        if notification.is_lifecycle() {
            DELIVERED.signal(notification);
        }
    }
}
