//! Adapter between controller input and the avatar's hand animation graph.
//!
//! Each frame the engine reads the latest controller snapshot, advances the
//! smoothed/ramped [`hand_state::HandState`], and publishes the 12 named
//! animation parameters the external blend tree consumes:
//!
//! ```text
//! ControllerSnapshot ──► HandState ──► HandAnimState (12 parameters)
//!                           ▲
//!              "Hifi-Point-Index" broadcast
//! ```
//!
//! `hand_state` holds the pure per-frame math, `parameters` the output
//! contract, and `engine` the lifecycle and frame loop around both.

pub mod engine;
pub mod hand_state;
pub mod parameters;

pub use engine::{AdapterEngine, AdapterEngineHandle, AdapterError, EngineSettings};
pub use hand_state::{HandState, HandStateSettings, OVERLAY_RAMP_RATE, TRIGGER_SMOOTH_TIMESCALE};
pub use parameters::{AnimVar, HandAnimState, HandGesture, PARAMETER_NAMES};
