//! Controller subsystem for hand-controller input
//!
//! Maps a physical gamepad onto the named standard hand-controller channels
//! and publishes one [`channels::ControllerSnapshot`] per poll:
//!
//! ```text
//! Gamepad ──► Collector ──► ControllerSnapshot (watch channel)
//!             (gilrs)       (latest frame wins)
//! ```
//!
//! The adapter never talks to gilrs directly; it only ever sees snapshots,
//! which keeps the input backend swappable and the per-frame transform
//! testable without hardware.

pub mod channels;
pub mod event_collector;

pub use channels::{AxisChannel, ControllerSnapshot, DigitalChannel, Hand, Pose};
pub use event_collector::{CollectorError, CollectorHandle, CollectorSettings};
