//! Transport-agnostic drive command vocabulary.
//!
//! Every transport decodes its native messages into a [`DriveCommand`]; the
//! text form below is what the WebSocket and BLE command characteristic carry.
//!
//! | token                                    | command                          |
//! |------------------------------------------|----------------------------------|
//! | `forward` `backward` `left` `right`      | single motion token              |
//! | `rotate_left` `rotate_right`             | single motion token              |
//! | `diag_fl` `diag_fr` `diag_bl` `diag_br`  | two-wheel diagonal               |
//! | `stop`                                   | empty motion set                 |
//! | `mode_omni` `mode_tank`                  | drive model                      |
//! | `speed:<0-255>`                          | absolute speed                   |
//! | `joy:<x>:<y>`                            | joystick, axes in `[-255, 255]`  |
//! | `set_map:<pos 0-3>:<motor 1-4>`          | rewire a wheel                   |
//! | `set_inv:<pos 0-3>:<0\|1\|true\|false>`  | flip a wheel                     |
//! | `test_<pos 0-3>_<fwd\|bwd\|stop>`        | drive one wheel alone            |
//! | `get_config` `save_config` `reset_config`| configuration                    |

use core::str::FromStr;

use crate::utils::{
    controllers::mapper::{DriveMode, LogicalMotor, PhysicalMotor},
    math::kinematics::{Motion, MotionSet},
};

/// Direction for a single-wheel calibration test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestAction {
    Forward,
    Backward,
    Stop,
}

/// A decoded command, independent of the transport that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// Discrete motion; an empty set stops the robot.
    Motion(MotionSet),
    /// Joystick axes, each in `[-255, 255]`.
    Joystick { x: i16, y: i16 },
    SetSpeed(u8),
    /// Rate-limited step up (gamepad `+`).
    SpeedUp,
    /// Rate-limited step down (gamepad `-`).
    SpeedDown,
    SetMode(DriveMode),
    SetMapping {
        position: LogicalMotor,
        motor: PhysicalMotor,
    },
    SetInvert {
        position: LogicalMotor,
        invert: bool,
    },
    Test {
        position: LogicalMotor,
        action: TestAction,
    },
    GetConfig,
    SaveConfig,
    ResetConfig,
    /// Link lost or operator panic: all wheels to the stop state.
    EmergencyStop,
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand::Motion(MotionSet::STOP);

    /// Parse a text token, returning `None` for anything malformed.
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl From<Motion> for DriveCommand {
    fn from(motion: Motion) -> Self {
        DriveCommand::Motion(motion.into())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCommandError;

impl FromStr for DriveCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let command: DriveCommand = match s {
            "forward" => Motion::Forward.into(),
            "backward" => Motion::Backward.into(),
            "left" => Motion::StrafeLeft.into(),
            "right" => Motion::StrafeRight.into(),
            "rotate_left" => Motion::RotateLeft.into(),
            "rotate_right" => Motion::RotateRight.into(),
            "diag_fl" => DriveCommand::Motion(MotionSet::DIAGONAL_FORWARD_LEFT),
            "diag_fr" => DriveCommand::Motion(MotionSet::DIAGONAL_FORWARD_RIGHT),
            "diag_bl" => DriveCommand::Motion(MotionSet::DIAGONAL_BACKWARD_LEFT),
            "diag_br" => DriveCommand::Motion(MotionSet::DIAGONAL_BACKWARD_RIGHT),
            "stop" => DriveCommand::STOP,
            "mode_omni" => DriveCommand::SetMode(DriveMode::Omni),
            "mode_tank" => DriveCommand::SetMode(DriveMode::Tank),
            "get_config" => DriveCommand::GetConfig,
            "save_config" => DriveCommand::SaveConfig,
            "reset_config" => DriveCommand::ResetConfig,
            _ => return parse_parameterized(s).ok_or(ParseCommandError),
        };
        Ok(command)
    }
}

fn parse_parameterized(s: &str) -> Option<DriveCommand> {
    if let Some(rest) = s.strip_prefix("test_") {
        let (position, action) = rest.split_once('_')?;
        let action = match action {
            "fwd" => TestAction::Forward,
            "bwd" => TestAction::Backward,
            "stop" => TestAction::Stop,
            _ => return None,
        };
        return Some(DriveCommand::Test {
            position: parse_position(position)?,
            action,
        });
    }

    let mut parts = s.split(':');
    let command = match parts.next()? {
        "speed" => DriveCommand::SetSpeed(parts.next()?.parse().ok()?),
        "joy" => DriveCommand::Joystick {
            x: parse_axis(parts.next()?)?,
            y: parse_axis(parts.next()?)?,
        },
        "set_map" => DriveCommand::SetMapping {
            position: parse_position(parts.next()?)?,
            motor: PhysicalMotor::new(parts.next()?.parse().ok()?)?,
        },
        "set_inv" => DriveCommand::SetInvert {
            position: parse_position(parts.next()?)?,
            invert: match parts.next()? {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return None,
            },
        },
        _ => return None,
    };
    // trailing fields mean a corrupted packet
    if parts.next().is_some() {
        return None;
    }
    Some(command)
}

fn parse_position(field: &str) -> Option<LogicalMotor> {
    LogicalMotor::from_position(field.parse().ok()?)
}

fn parse_axis(field: &str) -> Option<i16> {
    let value: i16 = field.parse().ok()?;
    (-255..=255).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_tokens() {
        assert_eq!(DriveCommand::parse("forward"), Some(DriveCommand::from(Motion::Forward)));
        assert_eq!(DriveCommand::parse("left"), Some(DriveCommand::from(Motion::StrafeLeft)));
        assert_eq!(
            DriveCommand::parse(" rotate_right\n"),
            Some(DriveCommand::from(Motion::RotateRight))
        );
        assert_eq!(DriveCommand::parse("stop"), Some(DriveCommand::STOP));
        assert_eq!(
            DriveCommand::parse("diag_br"),
            Some(DriveCommand::Motion(MotionSet::DIAGONAL_BACKWARD_RIGHT))
        );
    }

    #[test]
    fn test_speed_bounds() {
        assert_eq!(DriveCommand::parse("speed:0"), Some(DriveCommand::SetSpeed(0)));
        assert_eq!(DriveCommand::parse("speed:255"), Some(DriveCommand::SetSpeed(255)));
        assert_eq!(DriveCommand::parse("speed:256"), None);
        assert_eq!(DriveCommand::parse("speed:-1"), None);
        assert_eq!(DriveCommand::parse("speed:"), None);
    }

    #[test]
    fn test_joystick() {
        assert_eq!(
            DriveCommand::parse("joy:-255:120"),
            Some(DriveCommand::Joystick { x: -255, y: 120 })
        );
        assert_eq!(DriveCommand::parse("joy:256:0"), None);
        assert_eq!(DriveCommand::parse("joy:10"), None);
        assert_eq!(DriveCommand::parse("joy:1:2:3"), None);
    }

    #[test]
    fn test_config_commands() {
        assert_eq!(
            DriveCommand::parse("set_map:0:3"),
            Some(DriveCommand::SetMapping {
                position: LogicalMotor::FrontRight,
                motor: PhysicalMotor::new(3).unwrap(),
            })
        );
        assert_eq!(DriveCommand::parse("set_map:4:1"), None);
        assert_eq!(DriveCommand::parse("set_map:1:0"), None);
        assert_eq!(DriveCommand::parse("set_map:1:5"), None);
        assert_eq!(
            DriveCommand::parse("set_inv:3:true"),
            Some(DriveCommand::SetInvert {
                position: LogicalMotor::RearRight,
                invert: true,
            })
        );
        assert_eq!(
            DriveCommand::parse("set_inv:2:0"),
            Some(DriveCommand::SetInvert {
                position: LogicalMotor::RearLeft,
                invert: false,
            })
        );
        assert_eq!(DriveCommand::parse("set_inv:2:yes"), None);
        assert_eq!(DriveCommand::parse("reset_config"), Some(DriveCommand::ResetConfig));
    }

    #[test]
    fn test_wheel_tests() {
        assert_eq!(
            DriveCommand::parse("test_1_bwd"),
            Some(DriveCommand::Test {
                position: LogicalMotor::FrontLeft,
                action: TestAction::Backward,
            })
        );
        assert_eq!(DriveCommand::parse("test_4_fwd"), None);
        assert_eq!(DriveCommand::parse("test_0_sideways"), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        for junk in ["", "FORWARD", "mode_hover", "set_map", "\u{fffd}\u{fffd}", "joy:a:b"] {
            assert_eq!(junk.parse::<DriveCommand>(), Err(ParseCommandError), "{:?}", junk);
        }
    }
}
