//! The animation-parameter contract with the skeletal animation graph.
//!
//! The graph addresses inputs by constant string names. The 12 names below
//! are shared with the external blend tree; renaming any of them breaks the
//! avatar's hand rig.

use std::collections::HashMap;

/// Names of every parameter the adapter supplies, used when registering
/// with the animation graph.
pub const PARAMETER_NAMES: [&str; 12] = [
    "leftHandOverlayAlpha",
    "leftHandGraspAlpha",
    "rightHandOverlayAlpha",
    "rightHandGraspAlpha",
    "isLeftHandGrasp",
    "isLeftIndexPoint",
    "isLeftThumbRaise",
    "isLeftIndexPointAndThumbRaise",
    "isRightHandGrasp",
    "isRightIndexPoint",
    "isRightThumbRaise",
    "isRightIndexPointAndThumbRaise",
];

/// A single animation-graph variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimVar {
    Float(f32),
    Bool(bool),
}

/// Discrete hand gesture driving the rig, one per hand per frame.
///
/// Derivation is exhaustive by construction, so exactly one gesture holds
/// at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandGesture {
    Grasp,
    IndexPoint,
    ThumbRaise,
    IndexPointAndThumbRaise,
}

impl HandGesture {
    /// `pointing` is this hand's own index-point flag OR the process-wide
    /// "both indexes pointing" override.
    pub fn derive(pointing: bool, thumb_raised: bool) -> Self {
        match (pointing, thumb_raised) {
            (false, false) => HandGesture::Grasp,
            (true, false) => HandGesture::IndexPoint,
            (false, true) => HandGesture::ThumbRaise,
            (true, true) => HandGesture::IndexPointAndThumbRaise,
        }
    }
}

/// One frame of animation parameters, the full 12-key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandAnimState {
    pub left_hand_overlay_alpha: f32,
    pub left_hand_grasp_alpha: f32,
    pub right_hand_overlay_alpha: f32,
    pub right_hand_grasp_alpha: f32,

    pub is_left_hand_grasp: bool,
    pub is_left_index_point: bool,
    pub is_left_thumb_raise: bool,
    pub is_left_index_point_and_thumb_raise: bool,

    pub is_right_hand_grasp: bool,
    pub is_right_index_point: bool,
    pub is_right_thumb_raise: bool,
    pub is_right_index_point_and_thumb_raise: bool,
}

impl HandAnimState {
    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        left_overlay_alpha: f32,
        left_grasp_alpha: f32,
        right_overlay_alpha: f32,
        right_grasp_alpha: f32,
        left_index_pointing: bool,
        right_index_pointing: bool,
        left_thumb_raised: bool,
        right_thumb_raised: bool,
        both_indexes_pointing: bool,
    ) -> Self {
        let left = HandGesture::derive(
            both_indexes_pointing || left_index_pointing,
            left_thumb_raised,
        );
        let right = HandGesture::derive(
            both_indexes_pointing || right_index_pointing,
            right_thumb_raised,
        );

        Self {
            left_hand_overlay_alpha: left_overlay_alpha,
            left_hand_grasp_alpha: left_grasp_alpha,
            right_hand_overlay_alpha: right_overlay_alpha,
            right_hand_grasp_alpha: right_grasp_alpha,
            is_left_hand_grasp: left == HandGesture::Grasp,
            is_left_index_point: left == HandGesture::IndexPoint,
            is_left_thumb_raise: left == HandGesture::ThumbRaise,
            is_left_index_point_and_thumb_raise: left == HandGesture::IndexPointAndThumbRaise,
            is_right_hand_grasp: right == HandGesture::Grasp,
            is_right_index_point: right == HandGesture::IndexPoint,
            is_right_thumb_raise: right == HandGesture::ThumbRaise,
            is_right_index_point_and_thumb_raise: right == HandGesture::IndexPointAndThumbRaise,
        }
    }

    /// The mapping handed to the animation graph, keyed by contract names.
    pub fn parameters(&self) -> HashMap<&'static str, AnimVar> {
        HashMap::from([
            ("leftHandOverlayAlpha", AnimVar::Float(self.left_hand_overlay_alpha)),
            ("leftHandGraspAlpha", AnimVar::Float(self.left_hand_grasp_alpha)),
            ("rightHandOverlayAlpha", AnimVar::Float(self.right_hand_overlay_alpha)),
            ("rightHandGraspAlpha", AnimVar::Float(self.right_hand_grasp_alpha)),
            ("isLeftHandGrasp", AnimVar::Bool(self.is_left_hand_grasp)),
            ("isLeftIndexPoint", AnimVar::Bool(self.is_left_index_point)),
            ("isLeftThumbRaise", AnimVar::Bool(self.is_left_thumb_raise)),
            (
                "isLeftIndexPointAndThumbRaise",
                AnimVar::Bool(self.is_left_index_point_and_thumb_raise),
            ),
            ("isRightHandGrasp", AnimVar::Bool(self.is_right_hand_grasp)),
            ("isRightIndexPoint", AnimVar::Bool(self.is_right_index_point)),
            ("isRightThumbRaise", AnimVar::Bool(self.is_right_thumb_raise)),
            (
                "isRightIndexPointAndThumbRaise",
                AnimVar::Bool(self.is_right_index_point_and_thumb_raise),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_flags(state: &HandAnimState) -> [bool; 4] {
        [
            state.is_left_hand_grasp,
            state.is_left_index_point,
            state.is_left_thumb_raise,
            state.is_left_index_point_and_thumb_raise,
        ]
    }

    fn right_flags(state: &HandAnimState) -> [bool; 4] {
        [
            state.is_right_hand_grasp,
            state.is_right_index_point,
            state.is_right_thumb_raise,
            state.is_right_index_point_and_thumb_raise,
        ]
    }

    #[test]
    fn exactly_one_gesture_per_hand_for_every_combination() {
        for bits in 0..32_u8 {
            let left_index = bits & 1 != 0;
            let right_index = bits & 2 != 0;
            let left_thumb = bits & 4 != 0;
            let right_thumb = bits & 8 != 0;
            let both = bits & 16 != 0;

            let state = HandAnimState::derive(
                0.0, 0.0, 0.0, 0.0, left_index, right_index, left_thumb, right_thumb, both,
            );

            let left_count = left_flags(&state).iter().filter(|f| **f).count();
            let right_count = right_flags(&state).iter().filter(|f| **f).count();
            assert_eq!(left_count, 1, "combination {bits:05b}");
            assert_eq!(right_count, 1, "combination {bits:05b}");
        }
    }

    #[test]
    fn both_override_points_both_hands() {
        let state =
            HandAnimState::derive(0.0, 0.0, 0.0, 0.0, false, false, false, false, true);
        assert!(state.is_left_index_point);
        assert!(state.is_right_index_point);
    }

    #[test]
    fn thumb_beside_pointing_selects_combined_gesture() {
        let state = HandAnimState::derive(0.0, 0.0, 0.0, 0.0, true, false, true, false, false);
        assert!(state.is_left_index_point_and_thumb_raise);
        assert!(!state.is_left_index_point);
        assert!(!state.is_left_thumb_raise);
        // Right hand saw neither signal.
        assert!(state.is_right_hand_grasp);
    }

    #[test]
    fn parameter_map_covers_the_full_contract() {
        let state = HandAnimState::derive(0.25, 0.5, 0.75, 1.0, true, false, false, true, false);
        let parameters = state.parameters();

        assert_eq!(parameters.len(), PARAMETER_NAMES.len());
        for name in PARAMETER_NAMES {
            assert!(parameters.contains_key(name), "missing {name}");
        }
        assert_eq!(
            parameters["leftHandOverlayAlpha"],
            AnimVar::Float(0.25)
        );
        assert_eq!(parameters["rightHandGraspAlpha"], AnimVar::Float(1.0));
        assert_eq!(parameters["isLeftIndexPoint"], AnimVar::Bool(true));
        assert_eq!(
            parameters["isRightThumbRaise"],
            AnimVar::Bool(true)
        );
    }
}
