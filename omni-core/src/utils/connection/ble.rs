//! BLE GATT adapter.
//!
//! Decodes writes to the robot's GATT characteristics into [`DriveCommand`]s
//! and encodes the config characteristic value. The GATT server itself lives
//! in the board crate; this module only knows the payload formats.

use alloc::vec::Vec;

use crate::utils::{
    connection::command::DriveCommand, controllers::mapper::Configuration,
    math::kinematics::MAX_WHEEL_COMMAND,
};

/// Advertised device name.
pub const DEVICE_NAME: &str = "Omni Robot";
/// Primary service UUID.
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Characteristics exposed by the robot service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    /// UTF-8 vocabulary tokens (motion, mode, mapping, save).
    Command,
    /// Two signed bytes `[x, y]`, each in `-128..=127`.
    Joystick,
    /// One unsigned byte, the absolute speed.
    Speed,
    /// Read/notify JSON configuration.
    Config,
    /// UTF-8 `test_<pos>_<action>` tokens.
    Test,
}

impl Characteristic {
    pub const ALL: [Characteristic; 5] = [
        Characteristic::Command,
        Characteristic::Joystick,
        Characteristic::Speed,
        Characteristic::Config,
        Characteristic::Test,
    ];

    pub const fn uuid(self) -> &'static str {
        match self {
            Characteristic::Command => "beb5483e-36e1-4688-b7f5-ea07361b26a8",
            Characteristic::Joystick => "ca73b3ba-39f6-4ab3-91ae-186dc9577d99",
            Characteristic::Speed => "1c95d5e3-d8f7-413a-bf3d-7a2e5d7be87e",
            Characteristic::Config => "d4e1f1a2-8b5c-4d3e-9f7a-6c8b5a4d3e2f",
            Characteristic::Test => "a3b2c1d4-5e6f-7a8b-9c0d-1e2f3a4b5c6d",
        }
    }

    pub fn from_uuid(uuid: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.uuid().eq_ignore_ascii_case(uuid))
    }
}

/// Decode a characteristic write. Malformed payloads yield `None`.
pub fn decode_write(
    characteristic: Characteristic,
    payload: &[u8],
) -> Option<DriveCommand> {
    let command = match characteristic {
        Characteristic::Command => DriveCommand::parse(core::str::from_utf8(payload).ok()?),
        Characteristic::Test => match DriveCommand::parse(core::str::from_utf8(payload).ok()?) {
            test @ Some(DriveCommand::Test { .. }) => test,
            _ => None,
        },
        Characteristic::Joystick => match payload {
            &[x, y] => Some(DriveCommand::Joystick {
                x: scale_axis(x as i8),
                y: scale_axis(y as i8),
            }),
            _ => None,
        },
        Characteristic::Speed => match payload {
            &[speed] => Some(DriveCommand::SetSpeed(speed)),
            _ => None,
        },
        Characteristic::Config => None,
    };
    if command.is_none() {
        tracing::debug!(?characteristic, len = payload.len(), "ignored BLE write");
    }
    command
}

/// Widen a signed byte axis to the joystick range, rounding to nearest.
pub fn scale_axis(raw: i8) -> i16 {
    let scaled = libm::roundf(raw as f32 * MAX_WHEEL_COMMAND as f32 / 127.0) as i16;
    scaled.clamp(-MAX_WHEEL_COMMAND, MAX_WHEEL_COMMAND)
}

/// Value of the config characteristic.
pub fn config_payload(config: &Configuration) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::controllers::mapper::LogicalMotor;
    use crate::utils::math::kinematics::Motion;

    #[test]
    fn test_uuid_lookup() {
        for c in Characteristic::ALL {
            assert_eq!(Characteristic::from_uuid(c.uuid()), Some(c));
        }
        assert_eq!(
            Characteristic::from_uuid("CA73B3BA-39F6-4AB3-91AE-186DC9577D99"),
            Some(Characteristic::Joystick)
        );
        assert_eq!(Characteristic::from_uuid(SERVICE_UUID), None);
    }

    #[test]
    fn test_joystick_bytes_scale_to_full_range() {
        assert_eq!(scale_axis(127), 255);
        assert_eq!(scale_axis(-127), -255);
        assert_eq!(scale_axis(-128), -255);
        assert_eq!(scale_axis(0), 0);
        assert_eq!(scale_axis(64), 129);
        assert_eq!(
            decode_write(Characteristic::Joystick, &[0x7f, 0x81]),
            Some(DriveCommand::Joystick { x: 255, y: -255 })
        );
        assert_eq!(decode_write(Characteristic::Joystick, &[1]), None);
    }

    #[test]
    fn test_text_characteristics() {
        assert_eq!(
            decode_write(Characteristic::Command, b"backward"),
            Some(DriveCommand::from(Motion::Backward))
        );
        assert_eq!(
            decode_write(Characteristic::Test, b"test_2_fwd"),
            Some(DriveCommand::Test {
                position: LogicalMotor::RearLeft,
                action: crate::utils::connection::command::TestAction::Forward,
            })
        );
        // only test tokens are accepted on the test characteristic
        assert_eq!(decode_write(Characteristic::Test, b"forward"), None);
        assert_eq!(decode_write(Characteristic::Command, &[0xff, 0xfe]), None);
    }

    #[test]
    fn test_speed_and_config() {
        assert_eq!(
            decode_write(Characteristic::Speed, &[42]),
            Some(DriveCommand::SetSpeed(42))
        );
        assert_eq!(decode_write(Characteristic::Speed, &[]), None);
        assert_eq!(decode_write(Characteristic::Config, b"{}"), None);
        assert_eq!(
            config_payload(&Configuration::default()).unwrap(),
            br#"{"mapping":[1,2,3,4],"invert":[false,false,false,false],"mode":"omni"}"#
        );
    }
}
