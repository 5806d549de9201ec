// Factory defaults of every device parameter.
//
// This file is also pulled into `build.rs`, keep it to plain `const` items.

pub const DEBUG: bool = false;

pub const NOTIFY_UPCOMING_DEEP_SLEEP: bool = true;
pub const NOTIFY_DEEP_SLEEP: bool = true;

pub const SILENTLY_NOTIFY_PROJECT_STARTUP: bool = true;
pub const SILENTLY_NOTIFY_DOORBELL_RINGING: bool = false;
pub const SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP: bool = false;
pub const SILENTLY_NOTIFY_DEEP_SLEEP: bool = false;

// 55 minutes
pub const RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS: u32 = 3_300_000;
// 1 hour
pub const RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS: u32 = 3_600_000;

/// Telegram allows one message per second inside a chat and 20 messages per
/// minute to the same group, see
/// https://core.telegram.org/bots/faq#my-bot-is-hitting-limits-how-do-i-avoid-this
///
/// Doorbell rings are rare enough that one minute between messages is plenty.
pub const NOTIFICATION_LOCK_IN_MILLISECONDS: u32 = 60_000;
/// Lowest lock that still honours 20 messages per minute.
pub const NOTIFICATION_LOCK_FLOOR_IN_MILLISECONDS: u32 = 60_000 / 20;

pub const NOTIFICATION_RETRIES: u32 = 3;

// 50 ms = 20Hz
pub const SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS: u32 = 50;

// https://hester.mtholyoke.edu/idesign/SensorAmp.html
pub const SOUND_THRESHOLD: f32 = 973.0;

// ear
pub const PROJECT_STARTUP_MESSAGE: &str = "\u{1F442}";
pub const DOORBELL_RINGING_MESSAGE: &str = "Knock Knock";
// weary face
pub const UPCOMING_DEEP_SLEEP_MESSAGE: &str = "\u{1F629}";
// sleeping symbol
pub const DEEP_SLEEP_MESSAGE: &str = "\u{1F4A4}";
