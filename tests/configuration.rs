use embassy_time::{Duration, Instant};
use knock_knock::{
    config,
    notification::{Dispatcher, Notification, Notifier, Outcome},
    schedule::{SleepPhase, SleepSchedule},
    sound::SoundDetector,
    source::{compiled, BuildTimeSource, JsonSource, LookupSource},
    ConfigurationSource, DeviceConfiguration, Error, ParameterValue, SchemaVersion, Unit,
};

struct Console(Vec<String>);

impl Notifier for Console {
    type Error = ();

    fn send(&mut self, text: &str, _silent: bool) -> Result<(), ()> {
        self.0.push(text.to_owned());
        Ok(())
    }
}

#[test]
fn compiled_configuration_is_what_the_build_baked_in() {
    let configuration = BuildTimeSource.load().unwrap();

    assert_eq!(
        configuration.get("SOUND_THRESHOLD").unwrap(),
        ParameterValue::Float(compiled::SOUND_THRESHOLD)
    );
    assert_eq!(
        configuration.get("SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS").unwrap(),
        ParameterValue::UnsignedInteger(compiled::SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS)
    );
    assert_eq!(configuration.debug(), compiled::DEBUG);
}

#[test]
fn every_source_upholds_the_invariants() {
    let sources: [&dyn ConfigurationSource; 3] = [
        &BuildTimeSource,
        &JsonSource::new(r#"{ "schema_version": 1 }"#),
        &JsonSource::new(r#"{ "schema_version": 2 }"#),
    ];

    for source in sources {
        let configuration = source.load().unwrap();

        assert!(configuration.deep_sleep_announcement_after() < configuration.deep_sleep_after());
        assert!(
            configuration.notification_lock()
                >= Duration::from_millis(config::NOTIFICATION_LOCK_FLOOR_IN_MILLISECONDS.into())
        );
        assert!(configuration.sample_window_width() > Duration::from_ticks(0));
    }
}

#[test]
fn revision_2_defaults() {
    let configuration = JsonSource::new(r#"{ "schema_version": 2 }"#).load().unwrap();

    assert_eq!(configuration.schema_version(), SchemaVersion::Revision2);
    assert_eq!(
        configuration.get("SOUND_THRESHOLD").unwrap(),
        ParameterValue::Float(973.0)
    );
    assert_eq!(
        configuration.get("NOTIFICATION_RETRIES").unwrap(),
        ParameterValue::UnsignedInteger(3)
    );
    assert!(matches!(
        configuration.get("SILENTLY_NOTIFY_DEEP_SLEEP"),
        Err(Error::NotInSchema { .. })
    ));
}

#[test]
fn revision_1_defaults() {
    let configuration = DeviceConfiguration::revision_1();

    for name in [
        "SILENTLY_NOTIFY_PROJECT_STARTUP",
        "SILENTLY_NOTIFY_DOORBELL_RINGING",
        "SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP",
        "SILENTLY_NOTIFY_DEEP_SLEEP",
    ] {
        assert!(matches!(configuration.get(name), Ok(ParameterValue::Bool(_))));
    }
    assert_eq!(
        configuration.get("SILENTLY_NOTIFY_DOORBELL_RINGING").unwrap(),
        ParameterValue::Bool(false)
    );
    assert_eq!(
        configuration.get("SILENTLY_NOTIFY_PROJECT_STARTUP").unwrap(),
        ParameterValue::Bool(true)
    );
}

#[test]
fn parameter_table_carries_units_and_docs() {
    let configuration = DeviceConfiguration::revision_1();
    let parameters = configuration.parameters();

    let lock = parameters
        .iter()
        .find(|p| p.name() == "NOTIFICATION_LOCK_IN_MILLISECONDS")
        .unwrap();
    assert_eq!(lock.unit(), Unit::Milliseconds);
    assert_eq!(lock.value, ParameterValue::UnsignedInteger(60_000));
    assert!(lock.documentation().is_some());

    assert_eq!(
        lock.to_string(),
        "NOTIFICATION_LOCK_IN_MILLISECONDS = 60000 ms"
    );
}

#[test]
fn environment_style_overrides_feed_the_consumers() {
    let overrides = [
        ("SCHEMA_VERSION", "1"),
        ("RUNTIME_BEFORE_UPCOMING_DEEP_SLEEP_NOTIFICATION_IN_MILLISECONDS", "60000"),
        ("RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS", "120000"),
        ("SOUND_THRESHOLD", "500"),
        ("NOTIFICATION_LOCK_IN_MILLISECONDS", "3000"),
    ];
    let configuration = LookupSource::new(|name: &str| {
        overrides
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    })
    .load()
    .unwrap();

    let schedule = SleepSchedule::new(&configuration);
    assert_eq!(schedule.phase(Duration::from_secs(59)), SleepPhase::Awake);
    assert_eq!(
        schedule.phase(Duration::from_secs(60)),
        SleepPhase::AnnouncementDue
    );
    assert_eq!(
        schedule.phase(Duration::from_secs(120)),
        SleepPhase::DeepSleepDue
    );

    let mut detector = SoundDetector::new(&configuration);
    detector.record(1_800, Instant::from_millis(0));
    detector.record(2_400, Instant::from_millis(25));
    let window = detector.record(2_048, Instant::from_millis(50)).unwrap();
    assert_eq!(window.amplitude(), 600);
    assert!(window.ring);

    let mut dispatcher = Dispatcher::new(&configuration, Console(Vec::new()));
    assert_eq!(
        dispatcher.dispatch(Notification::DoorbellRinging, Instant::from_secs(0)),
        Outcome::Delivered { attempts: 1 }
    );
    assert!(matches!(
        dispatcher.dispatch(Notification::DoorbellRinging, Instant::from_secs(1)),
        Outcome::Locked { .. }
    ));
    assert_eq!(
        dispatcher.dispatch(Notification::DoorbellRinging, Instant::from_secs(3)),
        Outcome::Delivered { attempts: 1 }
    );
    assert_eq!(dispatcher.notifier().0, ["Knock Knock", "Knock Knock"]);
}
