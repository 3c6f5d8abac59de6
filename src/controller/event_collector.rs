//! gilrs-backed controller polling.
//!
//! The collector owns the gilrs context, drains its event queue to keep the
//! cached gamepad state fresh, and publishes a [`ControllerSnapshot`] of the
//! named channels on a watch channel after every poll. Downstream consumers
//! always see the latest complete frame; there is no event queue to drain on
//! their side.

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::channels::{ControllerSnapshot, Pose};

/// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Deadzone applied to the analog trigger axes (fraction, 0.0-1.0).
    ///
    /// Values inside the deadzone read as 0.0; values outside are rescaled
    /// to still cover the full [0, 1] range.
    pub trigger_deadzone: f32,

    /// Interval between device polls in microseconds.
    pub poll_interval_us: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            trigger_deadzone: 0.05,
            poll_interval_us: 500,
        }
    }
}

/// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to publish snapshot: {0}")]
    SnapshotSendError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad, if any is connected
    active_gamepad: Option<GamepadId>,

    // Collector settings
    settings: CollectorSettings,

    // Latest-frame publication channel
    snapshot_sender: watch::Sender<ControllerSnapshot>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn update_settings(&mut self, settings: CollectorSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        snapshot_sender: watch::Sender<ControllerSnapshot>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, settings, snapshot_sender))
    }

    /// Selects an active gamepad and transitions to the Collecting state.
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        info!(
            "Initializing Event Collector with trigger deadzone: {}",
            self.settings.trigger_deadzone
        );

        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, hand poses will read invalid until one appears");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, UUID: {:?}",
                    idx,
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
            let (id, gamepad) = &gamepads[0];
            self.active_gamepad = Some(*id);
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

impl EventCollector<Collecting> {
    /// Drains pending gilrs events so the cached gamepad state is current.
    ///
    /// Connect/disconnect events retarget `active_gamepad`; everything else
    /// only matters through the state cache read at snapshot time.
    fn drain_events(&mut self) {
        while let Some(Event { id, event, time, .. }) = self.gilrs.next_event() {
            debug!("Processing gilrs event: {:?} at time: {:?}", event, time);

            match event {
                EventType::Connected => {
                    if self.active_gamepad.is_none() {
                        info!("Controller connected, selecting gamepad {}", id);
                        self.active_gamepad = Some(id);
                    } else {
                        debug!("Additional controller connected: {}", id);
                    }
                }
                EventType::Disconnected => {
                    if self.active_gamepad == Some(id) {
                        warn!("Active controller disconnected: {}", id);
                        self.active_gamepad = None;
                    }
                }
                _ => {}
            }
        }
    }

    /// Builds a snapshot of the named channels from the active gamepad.
    ///
    /// With no connected gamepad the snapshot keeps every channel at its
    /// neutral default, which downstream reads as invalid poses and zero
    /// axes.
    fn build_snapshot(&self) -> ControllerSnapshot {
        let mut snapshot = ControllerSnapshot {
            timestamp: SystemTime::now(),
            ..Default::default()
        };

        let Some(id) = self.active_gamepad else {
            return snapshot;
        };
        let Some(gamepad) = self.gilrs.connected_gamepad(id) else {
            return snapshot;
        };

        let deadzone = self.settings.trigger_deadzone;
        snapshot.lt = apply_deadzone(gamepad.value(Axis::LeftZ), deadzone);
        snapshot.rt = apply_deadzone(gamepad.value(Axis::RightZ), deadzone);
        snapshot.left_grip = digital_value(&gamepad, Button::LeftTrigger);
        snapshot.right_grip = digital_value(&gamepad, Button::RightTrigger);

        // A connected, tracked gamepad stands in for both hand poses.
        snapshot.left_hand = Pose::valid();
        snapshot.right_hand = Pose::valid();

        snapshot.left_index_point = digital_value(&gamepad, Button::West);
        snapshot.right_index_point = digital_value(&gamepad, Button::East);
        snapshot.left_thumb_up = digital_value(&gamepad, Button::LeftThumb);
        snapshot.right_thumb_up = digital_value(&gamepad, Button::RightThumb);

        snapshot
    }

    /// Runs the poll loop until every snapshot receiver is gone.
    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        loop {
            self.drain_events();

            let snapshot = self.build_snapshot();
            if self.snapshot_sender.send(snapshot).is_err() {
                info!("All snapshot receivers dropped, stopping Event Collector");
                return Ok(());
            }

            // Small sleep to prevent 100% CPU usage
            std::thread::sleep(std::time::Duration::from_micros(
                self.settings.poll_interval_us,
            ));
        }
    }
}

/// Public interface for spawning and running the collector
pub struct CollectorHandle {}

impl CollectorHandle {
    /// Creates a collector and spawns its poll loop as a tokio task.
    ///
    /// The task ends on its own once all snapshot receivers are dropped, so
    /// no explicit shutdown signal is needed.
    pub fn spawn(
        settings: Option<CollectorSettings>,
        snapshot_sender: watch::Sender<ControllerSnapshot>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let collector = EventCollector::create(settings, snapshot_sender)?;
        info!("Successfully created EventCollector instance");

        tokio::spawn(async move {
            match collector.initialize() {
                Ok(mut collecting) => {
                    info!("Event Collector initialization successful, starting collection loop");
                    if let Err(e) = collecting.run_collection_loop() {
                        error!("Collector task terminated with error: {}", e);
                    } else {
                        info!("Event Collector task finished");
                    }
                }
                Err(e) => {
                    error!("Failed to initialize Event Collector: {}", e);
                }
            }
        });

        info!("Event Collector successfully started");
        Ok(Self {})
    }
}

fn digital_value(gamepad: &Gamepad<'_>, button: Button) -> f32 {
    if gamepad.is_pressed(button) {
        1.0
    } else {
        0.0
    }
}

/// Applies a deadzone and rescales the remaining range back to [0, 1].
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value.signum() * ((value.abs() - deadzone) / (1.0 - deadzone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_zeroes_small_values() {
        assert_eq!(apply_deadzone(0.03, 0.05), 0.0);
        assert_eq!(apply_deadzone(-0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(0.0, 0.05), 0.0);
    }

    #[test]
    fn deadzone_rescales_to_full_range() {
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        let mid = apply_deadzone(0.525, 0.05);
        assert!((mid - 0.5).abs() < 1e-6);
    }
}
