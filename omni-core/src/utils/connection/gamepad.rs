//! Wii remote adapter.
//!
//! Translates the 16-bit core-button report into drive commands, with the
//! remote held sideways (D-pad on the left). Several buttons may be held at
//! once; motion buttons combine by vector addition in the mixer.
//!
//! | button      | effect           |
//! |-------------|------------------|
//! | D-pad left  | forward          |
//! | D-pad right | backward         |
//! | D-pad up    | strafe left      |
//! | D-pad down  | strafe right     |
//! | A / 2       | rotate right     |
//! | B / 1       | rotate left      |
//! | + / -       | speed step       |
//! | HOME        | emergency stop   |

use crate::utils::{
    connection::command::DriveCommand,
    math::kinematics::{Motion, MotionSet},
};

// Core-button report, first byte in the high half.
pub const BUTTON_LEFT: u16 = 0x0100;
pub const BUTTON_RIGHT: u16 = 0x0200;
pub const BUTTON_DOWN: u16 = 0x0400;
pub const BUTTON_UP: u16 = 0x0800;
pub const BUTTON_PLUS: u16 = 0x1000;
pub const BUTTON_TWO: u16 = 0x0001;
pub const BUTTON_ONE: u16 = 0x0002;
pub const BUTTON_B: u16 = 0x0004;
pub const BUTTON_A: u16 = 0x0008;
pub const BUTTON_MINUS: u16 = 0x0010;
pub const BUTTON_HOME: u16 = 0x0080;

const MOTION_BUTTONS: [(u16, Motion); 8] = [
    (BUTTON_LEFT, Motion::Forward),
    (BUTTON_RIGHT, Motion::Backward),
    (BUTTON_UP, Motion::StrafeLeft),
    (BUTTON_DOWN, Motion::StrafeRight),
    (BUTTON_A, Motion::RotateRight),
    (BUTTON_TWO, Motion::RotateRight),
    (BUTTON_B, Motion::RotateLeft),
    (BUTTON_ONE, Motion::RotateLeft),
];

/// Motion tokens held in a button report.
pub fn motion_set(buttons: u16) -> MotionSet {
    MOTION_BUTTONS
        .iter()
        .filter(|(mask, _)| buttons & mask != 0)
        .fold(MotionSet::empty(), |set, &(_, motion)| set.with(motion))
}

/// Commands for one button report, in the order they must be applied.
///
/// HOME short-circuits everything else. Otherwise an optional speed step
/// (`+` wins over `-`) is followed by the motion, which is a stop when no
/// motion button is held.
pub fn commands(buttons: u16) -> impl Iterator<Item = DriveCommand> {
    let batch = if buttons & BUTTON_HOME != 0 {
        [Some(DriveCommand::EmergencyStop), None]
    } else {
        let step = if buttons & BUTTON_PLUS != 0 {
            Some(DriveCommand::SpeedUp)
        } else if buttons & BUTTON_MINUS != 0 {
            Some(DriveCommand::SpeedDown)
        } else {
            None
        };
        [step, Some(DriveCommand::Motion(motion_set(buttons)))]
    };
    batch.into_iter().flatten()
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn test_no_buttons_is_stop() {
        let out: Vec<_> = commands(0).collect();
        assert_eq!(out, [DriveCommand::STOP]);
    }

    #[test]
    fn test_home_overrides_everything() {
        let out: Vec<_> = commands(BUTTON_HOME | BUTTON_LEFT | BUTTON_PLUS).collect();
        assert_eq!(out, [DriveCommand::EmergencyStop]);
    }

    #[test]
    fn test_chord_combines_tokens() {
        let set = motion_set(BUTTON_LEFT | BUTTON_A);
        assert!(set.contains(Motion::Forward));
        assert!(set.contains(Motion::RotateRight));
        assert!(!set.contains(Motion::RotateLeft));
        // duplicated rotate buttons collapse to one token
        assert_eq!(motion_set(BUTTON_A | BUTTON_TWO), MotionSet::from(Motion::RotateRight));
    }

    #[test]
    fn test_plus_wins_over_minus() {
        let out: Vec<_> = commands(BUTTON_PLUS | BUTTON_MINUS | BUTTON_UP).collect();
        assert_eq!(out, [DriveCommand::SpeedUp, DriveCommand::from(Motion::StrafeLeft)]);
    }
}
