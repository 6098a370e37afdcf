//! Kinematic mixing for the four-wheel X-layout robot.
//!
//! Two models turn an operator intent into four signed wheel commands,
//! ordered front-right, front-left, rear-left, rear-right:
//!
//! - **Discrete**: each active [`Motion`] token contributes a unit vector over
//!   the four wheels. Tokens are summed and the result normalized so that the
//!   most loaded wheel runs at exactly the current speed setting.
//! - **Joystick**: two axes in `[-255, 255]` are combined with a linear formula
//!   chosen by the [`DriveMode`], and every wheel is clamped on its own.
//!
//! # Example
//! ```rust
//! use omni_core::utils::math::kinematics::{mix_discrete, Motion, MotionSet};
//! let set = MotionSet::from(Motion::Forward).with(Motion::StrafeRight);
//! let wheels = mix_discrete(set, 200);
//! assert_eq!(wheels.as_array(), [200, 0, 0, 200]);
//! ```

use crate::utils::controllers::mapper::DriveMode;

/// Largest magnitude a wheel command may carry.
pub const MAX_WHEEL_COMMAND: i16 = 255;

/// A single motion token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Motion {
    Forward = 0,
    Backward = 1,
    StrafeLeft = 2,
    StrafeRight = 3,
    RotateLeft = 4,
    RotateRight = 5,
}

impl Motion {
    pub const ALL: [Motion; 6] = [
        Motion::Forward,
        Motion::Backward,
        Motion::StrafeLeft,
        Motion::StrafeRight,
        Motion::RotateLeft,
        Motion::RotateRight,
    ];

    /// Unit contribution of this token to each wheel (FR, FL, RL, RR).
    pub const fn vector(self) -> [i16; 4] {
        match self {
            Motion::Forward => [1, 1, 1, 1],
            Motion::Backward => [-1, -1, -1, -1],
            Motion::StrafeLeft => [-1, 1, 1, -1],
            Motion::StrafeRight => [1, -1, -1, 1],
            Motion::RotateLeft => [-1, 1, -1, 1],
            Motion::RotateRight => [1, -1, 1, -1],
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// The set of motion tokens active at the same time.
///
/// An empty set is an explicit stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionSet(u8);

impl MotionSet {
    pub const STOP: MotionSet = MotionSet(0);

    /// Forward and strafe left: front-left and rear-left wheels only.
    pub const DIAGONAL_FORWARD_LEFT: MotionSet =
        MotionSet(Motion::Forward.bit() | Motion::StrafeLeft.bit());
    /// Forward and strafe right: front-right and rear-right wheels only.
    pub const DIAGONAL_FORWARD_RIGHT: MotionSet =
        MotionSet(Motion::Forward.bit() | Motion::StrafeRight.bit());
    /// Backward and strafe left: front-right and rear-right wheels only.
    pub const DIAGONAL_BACKWARD_LEFT: MotionSet =
        MotionSet(Motion::Backward.bit() | Motion::StrafeLeft.bit());
    /// Backward and strafe right: front-left and rear-left wheels only.
    pub const DIAGONAL_BACKWARD_RIGHT: MotionSet =
        MotionSet(Motion::Backward.bit() | Motion::StrafeRight.bit());

    pub const fn empty() -> Self {
        MotionSet(0)
    }

    pub fn insert(
        &mut self,
        motion: Motion,
    ) {
        self.0 |= motion.bit();
    }

    #[must_use]
    pub fn with(
        mut self,
        motion: Motion,
    ) -> Self {
        self.insert(motion);
        self
    }

    pub fn contains(
        &self,
        motion: Motion,
    ) -> bool {
        self.0 & motion.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Motion> {
        let set = *self;
        Motion::ALL.into_iter().filter(move |m| set.contains(*m))
    }

    /// Vector sum of every active token, before normalization.
    pub fn sum(&self) -> [i16; 4] {
        self.iter().fold([0; 4], |mut acc, motion| {
            for (a, v) in acc.iter_mut().zip(motion.vector()) {
                *a += v;
            }
            acc
        })
    }
}

impl From<Motion> for MotionSet {
    fn from(motion: Motion) -> Self {
        MotionSet(motion.bit())
    }
}

/// Signed per-wheel commands in logical order (FR, FL, RL, RR).
///
/// Every component is kept within `[-255, 255]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelSpeeds([i16; 4]);

impl WheelSpeeds {
    pub const fn zero() -> Self {
        WheelSpeeds([0; 4])
    }

    /// Build from raw values, clamping each wheel to the command range.
    pub fn clamped(raw: [i32; 4]) -> Self {
        WheelSpeeds(raw.map(|w| {
            w.clamp(-(MAX_WHEEL_COMMAND as i32), MAX_WHEEL_COMMAND as i32) as i16
        }))
    }

    pub fn as_array(&self) -> [i16; 4] {
        self.0
    }

    pub fn get(
        &self,
        index: usize,
    ) -> i16 {
        self.0[index]
    }

    pub fn is_stopped(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }
}

/// Mix a set of motion tokens at the given speed setting.
///
/// The summed vector is divided by its largest absolute component, so the
/// most loaded wheel lands on `speed` exactly and the others keep their ratio
/// (truncated toward zero). No active token yields all-zero output.
pub fn mix_discrete(
    set: MotionSet,
    speed: u8,
) -> WheelSpeeds {
    let sum = set.sum();
    let peak = sum.iter().map(|w| w.abs()).max().unwrap_or(0) as i32;
    if peak == 0 {
        return WheelSpeeds::zero();
    }
    let speed = speed as i32;
    WheelSpeeds::clamped(sum.map(|w| w as i32 * speed / peak))
}

/// Mix joystick axes under the selected drive model.
///
/// Each wheel is clamped independently; when both axes saturate the clamp
/// reduces turning authority instead of rescaling the set.
pub fn mix_joystick(
    x: i16,
    y: i16,
    mode: DriveMode,
) -> WheelSpeeds {
    let (x, y) = (x as i32, y as i32);
    let raw = match mode {
        DriveMode::Omni => [y + x, y - x, y + x, y - x],
        DriveMode::Tank => [y - x, y + x, y - x, y + x],
    };
    WheelSpeeds::clamped(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_alone_runs_all_wheels_at_speed() {
        let wheels = mix_discrete(Motion::Forward.into(), 200);
        assert_eq!(wheels.as_array(), [200; 4]);
    }

    #[test]
    fn test_every_single_token_reaches_speed_exactly() {
        for motion in Motion::ALL {
            let wheels = mix_discrete(motion.into(), 137);
            let expected = motion.vector().map(|v| v * 137);
            assert_eq!(wheels.as_array(), expected, "{:?}", motion);
        }
    }

    #[test]
    fn test_empty_set_is_stop() {
        assert!(mix_discrete(MotionSet::STOP, 255).is_stopped());
        // opposing tokens cancel out to a stop as well
        let set = MotionSet::from(Motion::Forward).with(Motion::Backward);
        assert!(mix_discrete(set, 255).is_stopped());
    }

    #[test]
    fn test_forward_strafe_right_normalizes_to_speed() {
        let set = MotionSet::from(Motion::Forward).with(Motion::StrafeRight);
        assert_eq!(set.sum(), [2, 0, 0, 2]);
        let wheels = mix_discrete(set, 180);
        assert_eq!(wheels.as_array(), [180, 0, 0, 180]);
    }

    #[test]
    fn test_three_token_chord_keeps_exact_peak() {
        // (1,1,1,1) + (1,-1,-1,1) + (1,-1,1,-1) = (3,-1,1,1)
        let set = MotionSet::from(Motion::Forward)
            .with(Motion::StrafeRight)
            .with(Motion::RotateRight);
        let wheels = mix_discrete(set, 200);
        assert_eq!(wheels.get(0), 200);
        assert_eq!(wheels.as_array(), [200, -66, 66, 66]);
    }

    #[test]
    fn test_diagonals_drive_two_wheels() {
        let cases = [
            (MotionSet::DIAGONAL_FORWARD_LEFT, [0, 150, 150, 0]),
            (MotionSet::DIAGONAL_FORWARD_RIGHT, [150, 0, 0, 150]),
            (MotionSet::DIAGONAL_BACKWARD_LEFT, [-150, 0, 0, -150]),
            (MotionSet::DIAGONAL_BACKWARD_RIGHT, [0, -150, -150, 0]),
        ];
        for (set, expected) in cases {
            assert_eq!(mix_discrete(set, 150).as_array(), expected);
        }
    }

    #[test]
    fn test_joystick_omni() {
        assert_eq!(
            mix_joystick(255, 0, DriveMode::Omni).as_array(),
            [255, -255, 255, -255]
        );
        assert_eq!(mix_joystick(0, 255, DriveMode::Omni).as_array(), [255; 4]);
        assert_eq!(
            mix_joystick(255, 255, DriveMode::Omni).as_array(),
            [255, 0, 255, 0]
        );
    }

    #[test]
    fn test_joystick_tank_mirrors_turn() {
        assert_eq!(
            mix_joystick(100, 50, DriveMode::Tank).as_array(),
            [-50, 150, -50, 150]
        );
        assert_eq!(
            mix_joystick(-255, -255, DriveMode::Tank).as_array(),
            [0, -255, 0, -255]
        );
    }
}
