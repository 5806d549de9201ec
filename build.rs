use std::{env, fmt::Write as _, fs, path::Path};

#[allow(dead_code)]
mod defaults {
    include!("src/config.rs");
}

const PREFIX: &str = "KNOCK_KNOCK_";
const ANNOUNCEMENT: &str = "RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS";
const ANNOUNCEMENT_ALIAS: &str = "RUNTIME_BEFORE_UPCOMING_DEEP_SLEEP_NOTIFICATION_IN_MILLISECONDS";

enum Kind {
    Bool(bool),
    U32(u32),
    F32(f32),
    Text(&'static str),
}

struct Entry {
    name: &'static str,
    default: Kind,
    extension: bool,
}

const fn base(name: &'static str, default: Kind) -> Entry {
    Entry {
        name,
        default,
        extension: false,
    }
}

const fn extension(name: &'static str, default: Kind) -> Entry {
    Entry {
        name,
        default,
        extension: true,
    }
}

fn entries() -> Vec<Entry> {
    use defaults::*;
    vec![
        base("DEBUG", Kind::Bool(DEBUG)),
        extension("NOTIFY_UPCOMING_DEEP_SLEEP", Kind::Bool(NOTIFY_UPCOMING_DEEP_SLEEP)),
        extension("NOTIFY_DEEP_SLEEP", Kind::Bool(NOTIFY_DEEP_SLEEP)),
        extension(
            "SILENTLY_NOTIFY_PROJECT_STARTUP",
            Kind::Bool(SILENTLY_NOTIFY_PROJECT_STARTUP),
        ),
        extension(
            "SILENTLY_NOTIFY_DOORBELL_RINGING",
            Kind::Bool(SILENTLY_NOTIFY_DOORBELL_RINGING),
        ),
        extension(
            "SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP",
            Kind::Bool(SILENTLY_NOTIFY_UPCOMING_DEEP_SLEEP),
        ),
        extension(
            "SILENTLY_NOTIFY_DEEP_SLEEP",
            Kind::Bool(SILENTLY_NOTIFY_DEEP_SLEEP),
        ),
        base(
            ANNOUNCEMENT,
            Kind::U32(RUNTIME_BEFORE_DEEP_SLEEP_ANNOUNCEMENT_IN_MILLISECONDS),
        ),
        base(
            "RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS",
            Kind::U32(RUNTIME_BEFORE_DEEP_SLEEP_IN_MILLISECONDS),
        ),
        base(
            "NOTIFICATION_LOCK_IN_MILLISECONDS",
            Kind::U32(NOTIFICATION_LOCK_IN_MILLISECONDS),
        ),
        base("NOTIFICATION_RETRIES", Kind::U32(NOTIFICATION_RETRIES)),
        base(
            "SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS",
            Kind::U32(SAMPLE_WINDOW_WIDTH_IN_MILLISECONDS),
        ),
        base("SOUND_THRESHOLD", Kind::F32(SOUND_THRESHOLD)),
        extension("PROJECT_STARTUP_MESSAGE", Kind::Text(PROJECT_STARTUP_MESSAGE)),
        extension(
            "DOORBELL_RINGING_MESSAGE",
            Kind::Text(DOORBELL_RINGING_MESSAGE),
        ),
        extension(
            "UPCOMING_DEEP_SLEEP_MESSAGE",
            Kind::Text(UPCOMING_DEEP_SLEEP_MESSAGE),
        ),
        extension("DEEP_SLEEP_MESSAGE", Kind::Text(DEEP_SLEEP_MESSAGE)),
    ]
}

fn read(name: &str) -> Option<String> {
    let key = format!("{PREFIX}{name}");
    println!("cargo:rerun-if-env-changed={key}");
    env::var(&key).ok()
}

/// Render a parameter as the right-hand side of a `const` item.
///
/// Panics on malformed input, which aborts the build.
fn render(name: &str, default: &Kind, raw: Option<&str>) -> (&'static str, String) {
    match (default, raw) {
        (Kind::Bool(v), None) => ("bool", v.to_string()),
        (Kind::Bool(_), Some(raw)) => {
            let value = match raw {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => panic!("{PREFIX}{name} must be a boolean, got {raw:?}"),
            };
            ("bool", value.to_string())
        }
        (Kind::U32(v), None) => ("u32", v.to_string()),
        (Kind::U32(_), Some(raw)) => {
            let value: u32 = raw.parse().unwrap_or_else(|_| {
                panic!("{PREFIX}{name} must be an unsigned integer, got {raw:?}")
            });
            ("u32", value.to_string())
        }
        (Kind::F32(v), None) => ("f32", format!("{v:?}")),
        (Kind::F32(_), Some(raw)) => {
            let value: f32 = raw
                .parse()
                .unwrap_or_else(|_| panic!("{PREFIX}{name} must be a number, got {raw:?}"));
            assert!(
                value.is_finite() && value >= 0.0,
                "{PREFIX}{name} must be finite and not negative"
            );
            ("f32", format!("{value:?}"))
        }
        (Kind::Text(v), None) => ("&str", format!("{v:?}")),
        (Kind::Text(_), Some(raw)) => ("&str", format!("{raw:?}")),
    }
}

fn generate_settings(out_dir: &Path) {
    let revision = read("SCHEMA_VERSION").unwrap_or_else(|| "1".into());
    let (schema, with_extension) = match revision.as_str() {
        "1" => ("Revision1", true),
        "2" => ("Revision2", false),
        other => panic!("{PREFIX}SCHEMA_VERSION must be 1 or 2, got {other:?}"),
    };

    let mut code = String::new();
    writeln!(code, "// @generated by build.rs").unwrap();
    writeln!(code, "pub const SCHEMA_VERSION: SchemaVersion = SchemaVersion::{schema};").unwrap();
    writeln!(code, "pub const HAS_NOTIFICATION_EXTENSION: bool = {with_extension};").unwrap();

    for entry in entries() {
        let mut raw = read(entry.name);

        if entry.name == ANNOUNCEMENT {
            if let Some(alias) = read(ANNOUNCEMENT_ALIAS) {
                println!("cargo:warning={PREFIX}{ANNOUNCEMENT_ALIAS} is deprecated");
                println!("cargo:warning=use {PREFIX}{ANNOUNCEMENT} instead");
                if let Some(current) = raw.as_deref() {
                    assert_eq!(
                        current, alias,
                        "{PREFIX}{ANNOUNCEMENT} and {PREFIX}{ANNOUNCEMENT_ALIAS} disagree"
                    );
                }
                raw = Some(alias);
            }
        }

        if entry.extension && !with_extension && raw.is_some() {
            panic!("{PREFIX}{} is not part of schema revision 2", entry.name);
        }

        let (ty, value) = render(entry.name, &entry.default, raw.as_deref());
        writeln!(code, "pub const {}: {ty} = {value};", entry.name).unwrap();
    }

    fs::write(out_dir.join("settings.rs"), code).unwrap();
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/config.rs");

    let out_dir = env::var("OUT_DIR").unwrap();
    generate_settings(Path::new(&out_dir));

    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    }
}
