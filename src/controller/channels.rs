//! Named standard controller channels and the per-frame snapshot they feed.
//!
//! The channel names mirror the standard hand-controller layout: two analog
//! triggers, two analog grips, two tracked hand poses, and four digital
//! finger signals. Consumers address reads through the channel enums instead
//! of raw device fields, so the collector backend can be swapped without
//! touching the adapter.

use std::time::SystemTime;

/// Continuous axis channels, range [0, 1] after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisChannel {
    Lt,
    Rt,
    LeftGrip,
    RightGrip,
}

/// Digital (button-like) channels. Reads report 1.0 when active, 0.0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalChannel {
    LeftIndexPoint,
    RightIndexPoint,
    LeftThumbUp,
    RightThumbUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

/// A tracked hand pose: transform plus a validity flag.
///
/// Only `valid` is consumed by the adapter; the transform is carried for
/// completeness of the controller contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub valid: bool,
    pub position: [f32; 3],
    /// Orientation quaternion (x, y, z, w).
    pub orientation: [f32; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            valid: false,
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Pose {
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }
}

/// One frame's worth of raw controller reads.
///
/// Every channel defaults to its neutral value (0.0 axes, 0.0 digitals,
/// invalid poses), so a missing or disconnected device degrades to safe
/// reads instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub lt: f32,
    pub rt: f32,
    pub left_grip: f32,
    pub right_grip: f32,

    pub left_hand: Pose,
    pub right_hand: Pose,

    pub left_index_point: f32,
    pub right_index_point: f32,
    pub left_thumb_up: f32,
    pub right_thumb_up: f32,

    pub timestamp: SystemTime,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            lt: 0.0,
            rt: 0.0,
            left_grip: 0.0,
            right_grip: 0.0,
            left_hand: Pose::default(),
            right_hand: Pose::default(),
            left_index_point: 0.0,
            right_index_point: 0.0,
            left_thumb_up: 0.0,
            right_thumb_up: 0.0,
            timestamp: SystemTime::now(),
        }
    }
}

impl ControllerSnapshot {
    pub fn axis(&self, channel: AxisChannel) -> f32 {
        match channel {
            AxisChannel::Lt => self.lt,
            AxisChannel::Rt => self.rt,
            AxisChannel::LeftGrip => self.left_grip,
            AxisChannel::RightGrip => self.right_grip,
        }
    }

    pub fn set_axis(&mut self, channel: AxisChannel, value: f32) {
        let slot = match channel {
            AxisChannel::Lt => &mut self.lt,
            AxisChannel::Rt => &mut self.rt,
            AxisChannel::LeftGrip => &mut self.left_grip,
            AxisChannel::RightGrip => &mut self.right_grip,
        };
        *slot = value;
    }

    pub fn digital(&self, channel: DigitalChannel) -> f32 {
        match channel {
            DigitalChannel::LeftIndexPoint => self.left_index_point,
            DigitalChannel::RightIndexPoint => self.right_index_point,
            DigitalChannel::LeftThumbUp => self.left_thumb_up,
            DigitalChannel::RightThumbUp => self.right_thumb_up,
        }
    }

    pub fn set_digital(&mut self, channel: DigitalChannel, value: f32) {
        let slot = match channel {
            DigitalChannel::LeftIndexPoint => &mut self.left_index_point,
            DigitalChannel::RightIndexPoint => &mut self.right_index_point,
            DigitalChannel::LeftThumbUp => &mut self.left_thumb_up,
            DigitalChannel::RightThumbUp => &mut self.right_thumb_up,
        };
        *slot = value;
    }

    pub fn pose(&self, hand: Hand) -> Pose {
        match hand {
            Hand::Left => self.left_hand,
            Hand::Right => self.right_hand,
        }
    }

    pub fn set_pose(&mut self, hand: Hand, pose: Pose) {
        match hand {
            Hand::Left => self.left_hand = pose,
            Hand::Right => self.right_hand = pose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_reads_neutral() {
        let snapshot = ControllerSnapshot::default();
        for channel in [
            AxisChannel::Lt,
            AxisChannel::Rt,
            AxisChannel::LeftGrip,
            AxisChannel::RightGrip,
        ] {
            assert_eq!(snapshot.axis(channel), 0.0);
        }
        for channel in [
            DigitalChannel::LeftIndexPoint,
            DigitalChannel::RightIndexPoint,
            DigitalChannel::LeftThumbUp,
            DigitalChannel::RightThumbUp,
        ] {
            assert_eq!(snapshot.digital(channel), 0.0);
        }
        assert!(!snapshot.pose(Hand::Left).valid);
        assert!(!snapshot.pose(Hand::Right).valid);
    }

    #[test]
    fn channel_accessors_address_distinct_slots() {
        let mut snapshot = ControllerSnapshot::default();
        snapshot.set_axis(AxisChannel::Lt, 0.25);
        snapshot.set_axis(AxisChannel::LeftGrip, 0.5);
        snapshot.set_digital(DigitalChannel::RightThumbUp, 1.0);
        snapshot.set_pose(Hand::Right, Pose::valid());

        assert_eq!(snapshot.axis(AxisChannel::Lt), 0.25);
        assert_eq!(snapshot.axis(AxisChannel::LeftGrip), 0.5);
        assert_eq!(snapshot.axis(AxisChannel::Rt), 0.0);
        assert_eq!(snapshot.digital(DigitalChannel::RightThumbUp), 1.0);
        assert_eq!(snapshot.digital(DigitalChannel::LeftThumbUp), 0.0);
        assert!(snapshot.pose(Hand::Right).valid);
        assert!(!snapshot.pose(Hand::Left).valid);
    }
}
