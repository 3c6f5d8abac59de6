//! Per-frame transform from raw controller reads to hand animation state.
//!
//! This is the heart of the adapter: a continuous-time filter (trigger
//! smoothing, overlay ramping) plus a combinatorial flag derivation,
//! re-evaluated every tick. It is deliberately free of channels, tasks and
//! clocks so it can be driven directly in tests.

use tracing::trace;

use crate::controller::{AxisChannel, ControllerSnapshot, DigitalChannel, Hand};

use super::parameters::HandAnimState;

/// Timescale for exponential trigger smoothing, in seconds.
pub const TRIGGER_SMOOTH_TIMESCALE: f32 = 0.1;

/// Rate at which the hand overlay blends in/out, per second.
pub const OVERLAY_RAMP_RATE: f32 = 8.0;

/// Tuning values for the per-frame transform.
#[derive(Clone, Debug)]
pub struct HandStateSettings {
    /// Trigger smoothing timescale in seconds.
    pub trigger_smooth_timescale: f32,

    /// Overlay alpha ramp rate per second.
    pub overlay_ramp_rate: f32,
}

impl Default for HandStateSettings {
    fn default() -> Self {
        Self {
            trigger_smooth_timescale: TRIGGER_SMOOTH_TIMESCALE,
            overlay_ramp_rate: OVERLAY_RAMP_RATE,
        }
    }
}

/// Smoothed and derived hand state, updated once per frame.
///
/// Every scalar stays clamped to [0, 1] across updates, whatever dt and raw
/// reads arrive.
#[derive(Clone, Debug)]
pub struct HandState {
    settings: HandStateSettings,

    smoothed_left_trigger: f32,
    smoothed_right_trigger: f32,

    left_overlay_alpha: f32,
    right_overlay_alpha: f32,

    left_index_pointing: bool,
    right_index_pointing: bool,
    left_thumb_raised: bool,
    right_thumb_raised: bool,

    // Only field written from outside the frame tick (broadcast override).
    both_indexes_pointing: bool,
}

impl Default for HandState {
    fn default() -> Self {
        Self::new(HandStateSettings::default())
    }
}

impl HandState {
    pub fn new(settings: HandStateSettings) -> Self {
        Self {
            settings,
            smoothed_left_trigger: 0.0,
            smoothed_right_trigger: 0.0,
            left_overlay_alpha: 0.0,
            right_overlay_alpha: 0.0,
            left_index_pointing: false,
            right_index_pointing: false,
            left_thumb_raised: false,
            right_thumb_raised: false,
            both_indexes_pointing: false,
        }
    }

    /// Advances the filter state by one frame of `dt` seconds.
    ///
    /// Step order matters: the gesture flags at the end reuse the pose
    /// validity read for the overlay ramp in the same tick.
    pub fn update(&mut self, dt: f32, snapshot: &ControllerSnapshot) {
        // Trigger plus grip, clamped, is the raw grasp amount per hand.
        let left_raw = (snapshot.axis(AxisChannel::Lt) + snapshot.axis(AxisChannel::LeftGrip))
            .clamp(0.0, 1.0);
        let right_raw = (snapshot.axis(AxisChannel::Rt) + snapshot.axis(AxisChannel::RightGrip))
            .clamp(0.0, 1.0);

        // Average the last few trigger values together for a bit of
        // smoothing. Note the weights: raw is scaled by (1 - tau), so a
        // larger dt leans *more* on the previous sample. The hand rig is
        // tuned against this exact response; keep the formula as is.
        let tau = (dt / self.settings.trigger_smooth_timescale).clamp(0.0, 1.0);
        self.smoothed_left_trigger = lerp(left_raw, self.smoothed_left_trigger, tau);
        self.smoothed_right_trigger = lerp(right_raw, self.smoothed_right_trigger, tau);

        // Ramp the hand overlays toward 1 while tracked, toward 0 otherwise.
        let left_valid = snapshot.pose(Hand::Left).valid;
        let right_valid = snapshot.pose(Hand::Right).valid;
        let step = self.settings.overlay_ramp_rate * dt;
        self.left_overlay_alpha = ramp(self.left_overlay_alpha, left_valid, step);
        self.right_overlay_alpha = ramp(self.right_overlay_alpha, right_valid, step);

        // Pointing index fingers and raising thumbs. A digital channel
        // counts only when it reads exactly 1 on a validly-tracked hand.
        self.left_index_pointing =
            left_valid && snapshot.digital(DigitalChannel::LeftIndexPoint) == 1.0;
        self.right_index_pointing =
            right_valid && snapshot.digital(DigitalChannel::RightIndexPoint) == 1.0;
        self.left_thumb_raised = left_valid && snapshot.digital(DigitalChannel::LeftThumbUp) == 1.0;
        self.right_thumb_raised =
            right_valid && snapshot.digital(DigitalChannel::RightThumbUp) == 1.0;

        trace!(
            left_trigger = self.smoothed_left_trigger,
            right_trigger = self.smoothed_right_trigger,
            left_alpha = self.left_overlay_alpha,
            right_alpha = self.right_overlay_alpha,
            "hand state updated"
        );
    }

    /// Applies the broadcast override for "both index fingers pointing".
    ///
    /// Persists until the next override; the frame tick never writes it.
    pub fn set_both_indexes_pointing(&mut self, pointing: bool) {
        self.both_indexes_pointing = pointing;
    }

    pub fn both_indexes_pointing(&self) -> bool {
        self.both_indexes_pointing
    }

    /// Snapshot of the current animation parameters.
    pub fn anim_state(&self) -> HandAnimState {
        HandAnimState::derive(
            self.left_overlay_alpha,
            self.smoothed_left_trigger,
            self.right_overlay_alpha,
            self.smoothed_right_trigger,
            self.left_index_pointing,
            self.right_index_pointing,
            self.left_thumb_raised,
            self.right_thumb_raised,
            self.both_indexes_pointing,
        )
    }
}

fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a * (1.0 - alpha) + b * alpha
}

fn ramp(alpha: f32, upward: bool, step: f32) -> f32 {
    if upward {
        (alpha + step).clamp(0.0, 1.0)
    } else {
        (alpha - step).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Pose;

    fn snapshot() -> ControllerSnapshot {
        ControllerSnapshot::default()
    }

    fn tracked_snapshot() -> ControllerSnapshot {
        let mut s = snapshot();
        s.set_pose(Hand::Left, Pose::valid());
        s.set_pose(Hand::Right, Pose::valid());
        s
    }

    #[test]
    fn smoothing_blend_weights_previous_sample_by_tau() {
        // dt equal to the timescale gives tau = 1: the new sample is fully
        // discounted and the previous value carries through unchanged.
        let mut state = HandState::default();
        let mut s = tracked_snapshot();
        s.set_axis(AxisChannel::Lt, 1.0);

        state.update(0.1, &s);
        assert_eq!(state.anim_state().left_hand_grasp_alpha, 0.0);
    }

    #[test]
    fn smoothing_converges_with_small_steps() {
        let mut state = HandState::default();
        let mut s = tracked_snapshot();
        s.set_axis(AxisChannel::Lt, 1.0);

        // tau = 0.16 per tick; the smoothed value climbs monotonically.
        let mut previous = 0.0;
        for _ in 0..200 {
            state.update(0.016, &s);
            let current = state.anim_state().left_hand_grasp_alpha;
            assert!(current >= previous);
            previous = current;
        }
        assert!(previous > 0.99);
    }

    #[test]
    fn trigger_and_grip_sum_is_clamped() {
        let mut state = HandState::default();
        let mut s = tracked_snapshot();
        s.set_axis(AxisChannel::Rt, 0.9);
        s.set_axis(AxisChannel::RightGrip, 0.9);

        // tau = 0 takes the raw value directly; the 1.8 sum must clamp.
        state.update(0.0, &s);
        assert_eq!(state.anim_state().right_hand_grasp_alpha, 1.0);
    }

    #[test]
    fn smoothed_trigger_stays_in_unit_range() {
        let mut state = HandState::default();
        let dts = [0.0, 0.004, 0.016, 0.05, 0.1, 0.3, 2.0];
        let raws = [0.0, 0.2, 1.0, 0.7, 1.0, 0.0];
        for (i, dt) in dts.iter().cycle().take(100).enumerate() {
            let mut s = tracked_snapshot();
            s.set_axis(AxisChannel::Lt, raws[i % raws.len()]);
            state.update(*dt, &s);
            let grasp = state.anim_state().left_hand_grasp_alpha;
            assert!((0.0..=1.0).contains(&grasp), "grasp out of range: {grasp}");
        }
    }

    #[test]
    fn overlay_ramps_up_by_exactly_rate_dt() {
        let mut state = HandState::default();
        let s = tracked_snapshot();

        state.update(0.016, &s);
        let alpha = state.anim_state().left_hand_overlay_alpha;
        assert!((alpha - 8.0 * 0.016).abs() < 1e-6);

        state.update(0.016, &s);
        let alpha = state.anim_state().left_hand_overlay_alpha;
        assert!((alpha - 2.0 * 8.0 * 0.016).abs() < 1e-6);
    }

    #[test]
    fn overlay_ramps_down_and_clamps_at_zero() {
        let mut state = HandState::default();
        let tracked = tracked_snapshot();
        let untracked = snapshot();

        // Saturate the alpha at 1.0 first.
        for _ in 0..20 {
            state.update(0.016, &tracked);
        }
        assert_eq!(state.anim_state().left_hand_overlay_alpha, 1.0);

        // Pose invalid at rate 8.0/s: alpha reaches 0 after 0.125s and
        // stays there for the rest of the second.
        let mut elapsed = 0.0_f32;
        while elapsed < 1.0 {
            state.update(0.005, &untracked);
            elapsed += 0.005;
            let alpha = state.anim_state().left_hand_overlay_alpha;
            assert!((0.0..=1.0).contains(&alpha));
            if elapsed >= 0.125 + 1e-4 {
                assert_eq!(alpha, 0.0, "alpha not clamped at t={elapsed}");
            }
        }
    }

    #[test]
    fn gesture_flags_require_valid_pose() {
        let mut state = HandState::default();
        let mut s = snapshot();
        s.set_digital(DigitalChannel::LeftIndexPoint, 1.0);
        s.set_digital(DigitalChannel::LeftThumbUp, 1.0);

        state.update(0.016, &s);
        let anim = state.anim_state();
        assert!(anim.is_left_hand_grasp);
        assert!(!anim.is_left_index_point);
        assert!(!anim.is_left_thumb_raise);
        assert!(!anim.is_left_index_point_and_thumb_raise);
    }

    #[test]
    fn gesture_flags_require_exact_one() {
        let mut state = HandState::default();
        let mut s = tracked_snapshot();
        // A partially-registered digital read does not count.
        s.set_digital(DigitalChannel::LeftIndexPoint, 0.5);

        state.update(0.016, &s);
        assert!(!state.anim_state().is_left_index_point);
    }

    #[test]
    fn index_point_sets_only_that_left_flag() {
        let mut state = HandState::default();
        let mut s = tracked_snapshot();
        s.set_digital(DigitalChannel::LeftIndexPoint, 1.0);

        state.update(0.016, &s);
        let anim = state.anim_state();
        assert!(anim.is_left_index_point);
        assert!(!anim.is_left_hand_grasp);
        assert!(!anim.is_left_thumb_raise);
        assert!(!anim.is_left_index_point_and_thumb_raise);
        // Right hand is untouched by left-hand reads.
        assert!(anim.is_right_hand_grasp);
    }

    #[test]
    fn both_indexes_override_survives_frames() {
        let mut state = HandState::default();
        let s = tracked_snapshot();

        state.set_both_indexes_pointing(true);
        for _ in 0..5 {
            state.update(0.016, &s);
        }
        let anim = state.anim_state();
        assert!(anim.is_left_index_point);
        assert!(anim.is_right_index_point);

        state.set_both_indexes_pointing(false);
        state.update(0.016, &s);
        assert!(state.anim_state().is_left_hand_grasp);
    }
}
