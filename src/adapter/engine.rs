//! Adapter engine with statum state machine for the frame loop
//!
//! Implements a 5-state lifecycle around the per-frame hand-state transform.
//! The engine runs in its own tokio task, ticking at the configured frame
//! interval and reacting to point-index broadcasts between ticks.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Configured ──► Active ──► Deactivating ──► Deactivated
//!                     │              │           ▲
//!                     └──────────────┘           │
//!                       (activate)           (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! ControllerSnapshot ──► [HandState::update] ──► HandAnimState
//!    (watch, latest)            ▲                 (watch, latest)
//!                               │
//!                     "Hifi-Point-Index" subscription
//! ```

use statum::{machine, state};
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::controller::ControllerSnapshot;
use crate::messages::{decode_point_index, ChannelMessage, SessionId, Subscription};

use super::hand_state::{HandState, HandStateSettings};
use super::parameters::HandAnimState;

/// Engine settings
#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Frame tick interval in milliseconds. dt is still measured from the
    /// wall clock, so a delayed tick produces a proportionally larger step.
    pub frame_interval_ms: u64,

    /// Tuning for the per-frame transform.
    pub hand_state: HandStateSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            hand_state: HandStateSettings::default(),
        }
    }
}

/// Errors from engine lifecycle and frame processing
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Thread error: {0}")]
    ThreadError(String),
}

/// States for the adapter engine lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum AdapterEngineState {
    Initializing, // Setting up engine structure
    Configured,   // Subscription attached and validated
    Active,       // Ticking in the frame loop
    Deactivating, // Shutting down gracefully
    Deactivated,  // Fully stopped, subscriptions released
}

/// Frame-loop engine with compile-time state safety via statum
///
/// Owns the [`HandState`] exclusively; the broadcast override is consumed
/// inside the same select loop as the frame tick, so no field needs a lock.
#[machine]
pub struct AdapterEngine<S: AdapterEngineState> {
    snapshot_receiver: watch::Receiver<ControllerSnapshot>,
    anim_sender: watch::Sender<HandAnimState>,
    subscription: Option<Subscription>,
    session: SessionId,
    settings: EngineSettings,
    state: HandState,
    name: String,
}

impl<S: AdapterEngineState> AdapterEngine<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl AdapterEngine<Initializing> {
    pub fn create(
        snapshot_receiver: watch::Receiver<ControllerSnapshot>,
        anim_sender: watch::Sender<HandAnimState>,
        session: SessionId,
        settings: EngineSettings,
        name: String,
    ) -> Self {
        info!("Initializing new adapter engine: {}", name);

        let state = HandState::new(settings.hand_state.clone());
        Self::new(
            snapshot_receiver,
            anim_sender,
            None, // subscription
            session,
            settings,
            state,
            name,
        )
    }

    /// Attaches the point-index subscription and transitions to Configured.
    ///
    /// The subscription must be on [`crate::messages::POINT_INDEX_CHANNEL`];
    /// anything else indicates miswiring and is rejected.
    pub fn configure(
        mut self,
        subscription: Subscription,
    ) -> Result<AdapterEngine<Configured>, AdapterError> {
        info!("Configuring adapter engine: {}", self.name);

        if subscription.channel() != crate::messages::POINT_INDEX_CHANNEL {
            error!(
                "Engine {} got subscription for wrong channel: {}",
                self.name,
                subscription.channel()
            );
            return Err(AdapterError::SubscriptionError(format!(
                "expected channel {}, got {}",
                crate::messages::POINT_INDEX_CHANNEL,
                subscription.channel()
            )));
        }

        self.subscription = Some(subscription);
        info!("Engine configured successfully: {}", self.name);
        Ok(self.transition())
    }
}

impl AdapterEngine<Configured> {
    pub fn activate(self) -> AdapterEngine<Active> {
        info!("Activating adapter engine: {}", self.name);
        self.transition()
    }
}

impl AdapterEngine<Active> {
    /// Advances one frame: read the latest snapshot, update the filter
    /// state, publish the new animation parameters.
    fn tick(&mut self, dt: f32) {
        let snapshot = self.snapshot_receiver.borrow().clone();
        self.state.update(dt, &snapshot);

        if self.anim_sender.send(self.state.anim_state()).is_err() {
            debug!("No animation consumers attached to engine {}", self.name);
        }
    }

    /// Applies a broadcast message if it passes the channel/sender filter.
    ///
    /// Only messages from the local session count; other avatars' point
    /// signals must not move this rig. Malformed payloads are logged and
    /// dropped so a bad publisher cannot stall the frame loop.
    fn handle_message(&mut self, message: ChannelMessage) {
        if message.sender != self.session {
            debug!(
                "Ignoring point-index message from foreign sender: {}",
                message.sender
            );
            return;
        }

        match decode_point_index(&message.body) {
            Ok(Some(point_index)) => {
                info!("pointIndex: {}", point_index);
                self.state.set_both_indexes_pointing(point_index);
            }
            Ok(None) => {
                debug!("Point-index message without pointIndex field, ignoring");
            }
            Err(e) => {
                warn!("Ignoring malformed point-index payload: {}", e);
            }
        }
    }

    /// Main frame loop with graceful shutdown support
    ///
    /// Runs until the shutdown signal fires. dt is measured between ticks
    /// with a monotonic clock rather than assumed from the interval.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<AdapterEngine<Deactivating>, AdapterError> {
        info!("Starting frame loop for: {}", self.name);

        let mut subscription = self.subscription.take().ok_or_else(|| {
            AdapterError::SubscriptionError(format!(
                "engine {} entered frame loop without a subscription",
                self.name
            ))
        })?;

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.settings.frame_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();
        let mut bus_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for: {}", self.name);
                    break;
                }

                _ = ticker.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;
                    self.tick(dt);
                }

                maybe = subscription.recv(), if bus_open => {
                    match maybe {
                        Some(message) => self.handle_message(message),
                        None => {
                            warn!(
                                "Message bus closed, point-index overrides disabled for: {}",
                                self.name
                            );
                            bus_open = false;
                        }
                    }
                }
            }
        }

        // Hand the subscription back so Deactivating can release it.
        self.subscription = Some(subscription);

        info!("Transitioning to Deactivating state: {}", self.name);
        Ok(self.transition())
    }
}

impl AdapterEngine<Deactivating> {
    /// Releases the subscription and transitions to Deactivated.
    pub fn shutdown(mut self) -> AdapterEngine<Deactivated> {
        info!("Shutting down adapter engine: {}", self.name);

        if self.subscription.take().is_some() {
            debug!("Released point-index subscription for: {}", self.name);
        }

        info!("Engine shut down successfully: {}", self.name);
        self.transition()
    }
}

impl AdapterEngine<Deactivated> {}

/// Handle for managing the adapter engine in a tokio task
///
/// Provides lifecycle management for the engine running in a background
/// task: spawning, graceful shutdown, and symmetric release of everything
/// registered at start.
#[derive(Debug)]
pub struct AdapterEngineHandle {
    pub name: String,

    task_handle: Option<JoinHandle<Result<(), AdapterError>>>,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AdapterEngineHandle {
    pub fn new(name: String) -> Self {
        Self {
            name,
            task_handle: None,
            shutdown_tx: None,
        }
    }

    /// Starts the engine in a tokio task.
    ///
    /// Creates the engine, attaches the subscription, activates it, and
    /// spawns the frame loop.
    ///
    /// # Returns
    ///
    /// Watch receiver carrying the latest [`HandAnimState`]; this is the
    /// seam the animation graph reads from.
    pub fn start(
        &mut self,
        snapshot_receiver: watch::Receiver<ControllerSnapshot>,
        subscription: Subscription,
        session: SessionId,
        settings: EngineSettings,
    ) -> Result<watch::Receiver<HandAnimState>, AdapterError> {
        let (anim_sender, anim_receiver) = watch::channel(HandAnimState::default());
        let engine_name = self.name.clone();

        let engine = AdapterEngine::create(
            snapshot_receiver,
            anim_sender,
            session,
            settings,
            engine_name.clone(),
        )
        .configure(subscription)?;

        let active_engine = engine.activate();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        let task_handle = tokio::spawn(async move {
            info!("Spawning running engine: {}", engine_name);
            match active_engine.run_until_shutdown(shutdown_rx).await {
                Ok(deactivating_engine) => {
                    info!("Engine entering deactivating state: {}", engine_name);
                    let _ = deactivating_engine.shutdown();
                    Ok(())
                }
                Err(e) => {
                    error!("Error running engine: {} - {}", engine_name, e);
                    Err(e)
                }
            }
        });

        self.task_handle = Some(task_handle);

        info!("Adapter engine activated: {}", self.name);
        Ok(anim_receiver)
    }

    /// Gracefully shuts down the engine and waits for task completion.
    ///
    /// Safe to call after the task has already terminated.
    pub async fn shutdown(&mut self) -> Result<(), AdapterError> {
        debug!("Sending shutdown signal to engine: {}", self.name);

        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Engine task already terminated: {}", self.name);
            }
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => {
                    debug!("Engine task completed: {}", self.name);
                    result
                }
                Err(e) => {
                    error!("Engine task panicked: {} - {}", self.name, e);
                    Err(AdapterError::ThreadError(format!(
                        "Engine task panicked: {}",
                        e
                    )))
                }
            }
        } else {
            debug!("Engine already shut down: {}", self.name);
            Ok(())
        }
    }
}
