//! Configuration contract and notification policies of a sound-triggered
//! doorbell notifier.
//!
//! The device listens for the doorbell, sends a chat notification when it
//! rings and powers down into deep sleep after a fixed runtime. Every knob of
//! that behaviour is a [`Parameter`] of the immutable [`DeviceConfiguration`],
//! obtained from a [`ConfigurationSource`] once at startup.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
mod configuration;
mod error;
pub mod notification;
mod parameter;
pub mod schedule;
pub mod sound;
pub mod source;

pub use configuration::{DeviceConfiguration, NotificationSettings, SchemaVersion};
pub use error::Error;
pub use parameter::{Key, Parameter, ParameterType, ParameterValue, Unit, ANNOUNCEMENT_ALIAS};
pub use source::ConfigurationSource;
