//! Logical to physical wheel indirection.
//!
//! Wheels are addressed by their position on the chassis ([`LogicalMotor`]);
//! the [`MotorMapper`] resolves each position to the driver channel it is wired
//! to ([`PhysicalMotor`]) and flips the sign for wheels mounted the other way.

use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Positional wheel identity in the X layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogicalMotor {
    FrontRight = 1,
    FrontLeft = 2,
    RearLeft = 3,
    RearRight = 4,
}

impl LogicalMotor {
    pub const ALL: [LogicalMotor; 4] = [
        LogicalMotor::FrontRight,
        LogicalMotor::FrontLeft,
        LogicalMotor::RearLeft,
        LogicalMotor::RearRight,
    ];

    /// Look up a wheel by its 1-based id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get((id as usize).checked_sub(1)?).copied()
    }

    /// Look up a wheel by its 0-based position, as used on the wire.
    pub fn from_position(position: u8) -> Option<Self> {
        Self::ALL.get(position as usize).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// 0-based index into per-wheel arrays.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

/// A driver channel (direction line plus PWM line), numbered 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PhysicalMotor(u8);

impl PhysicalMotor {
    pub const ALL: [PhysicalMotor; 4] = [
        PhysicalMotor(1),
        PhysicalMotor(2),
        PhysicalMotor(3),
        PhysicalMotor(4),
    ];

    pub fn new(id: u8) -> Option<Self> {
        (1..=4).contains(&id).then_some(PhysicalMotor(id))
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for PhysicalMotor {
    type Error = &'static str;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        PhysicalMotor::new(id).ok_or("motor id out of range 1..=4")
    }
}

impl From<PhysicalMotor> for u8 {
    fn from(motor: PhysicalMotor) -> u8 {
        motor.0
    }
}

/// Kinematic model used by the joystick mixer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// X-configured wheels with lateral strafing.
    #[default]
    Omni,
    /// Differential rotation, no strafing.
    Tank,
}

/// Wiring and drive model, persisted as one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub mapping: [PhysicalMotor; 4],
    pub invert: [bool; 4],
    pub mode: DriveMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            mapping: PhysicalMotor::ALL,
            invert: [false; 4],
            mode: DriveMode::Omni,
        }
    }
}

impl Configuration {
    /// Status readback, e.g. `{"mapping":[1,2,3,4],"invert":[false,false,false,false],"mode":"omni"}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Holds the live [`Configuration`] and answers wheel lookups against it.
#[derive(Debug, Default)]
pub struct MotorMapper {
    config: Configuration,
}

impl MotorMapper {
    pub fn new(config: Configuration) -> Self {
        MotorMapper { config }
    }

    pub fn resolve_physical(
        &self,
        logical: LogicalMotor,
    ) -> PhysicalMotor {
        self.config.mapping[logical.index()]
    }

    /// Negate `speed` if the wheel is flagged as inverted.
    pub fn apply_inversion(
        &self,
        logical: LogicalMotor,
        speed: i16,
    ) -> i16 {
        if self.config.invert[logical.index()] {
            -speed
        } else {
            speed
        }
    }

    pub fn map(
        &mut self,
        logical: LogicalMotor,
        physical: PhysicalMotor,
    ) {
        self.config.mapping[logical.index()] = physical;
    }

    pub fn invert(
        &mut self,
        logical: LogicalMotor,
        invert: bool,
    ) {
        self.config.invert[logical.index()] = invert;
    }

    /// Bind a 1-based logical id to a 1-based physical id.
    ///
    /// Ids outside `1..=4` leave the mapping untouched and return `false`.
    pub fn set_mapping(
        &mut self,
        logical: u8,
        physical: u8,
    ) -> bool {
        match (LogicalMotor::from_id(logical), PhysicalMotor::new(physical)) {
            (Some(l), Some(p)) => {
                self.map(l, p);
                true
            }
            _ => false,
        }
    }

    /// Set the inversion flag of a 1-based logical id; out-of-range ids are ignored.
    pub fn set_invert(
        &mut self,
        logical: u8,
        invert: bool,
    ) -> bool {
        match LogicalMotor::from_id(logical) {
            Some(l) => {
                self.invert(l, invert);
                true
            }
            None => false,
        }
    }

    pub fn mode(&self) -> DriveMode {
        self.config.mode
    }

    pub fn set_mode(
        &mut self,
        mode: DriveMode,
    ) {
        self.config.mode = mode;
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Restore identity mapping, no inversion and omni mode.
    pub fn reset(&mut self) {
        self.config = Configuration::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_mapping_resolves_every_pair() {
        let mut mapper = MotorMapper::default();
        for l in 1..=4u8 {
            for p in 1..=4u8 {
                assert!(mapper.set_mapping(l, p));
                let logical = LogicalMotor::from_id(l).unwrap();
                assert_eq!(mapper.resolve_physical(logical).id(), p);
            }
        }
    }

    #[test]
    fn test_out_of_range_mapping_is_noop() {
        let mut mapper = MotorMapper::default();
        mapper.set_mapping(2, 4);
        let before = *mapper.config();
        assert!(!mapper.set_mapping(2, 0));
        assert!(!mapper.set_mapping(2, 5));
        assert!(!mapper.set_mapping(0, 1));
        assert!(!mapper.set_mapping(5, 1));
        assert!(!mapper.set_invert(9, true));
        assert_eq!(*mapper.config(), before);
    }

    #[test]
    fn test_inversion_is_involutive() {
        let mut mapper = MotorMapper::default();
        let wheel = LogicalMotor::RearLeft;
        for s in [-255i16, -120, 0, 1, 200, 255] {
            mapper.invert(wheel, true);
            let inverted = mapper.apply_inversion(wheel, s);
            mapper.invert(wheel, false);
            assert_eq!(inverted, mapper.apply_inversion(wheel, -s));
        }
    }

    #[test]
    fn test_reset_restores_default() {
        let mut mapper = MotorMapper::default();
        mapper.set_mapping(1, 3);
        mapper.set_invert(4, true);
        mapper.set_mode(DriveMode::Tank);
        mapper.reset();
        assert_eq!(*mapper.config(), Configuration::default());
    }

    #[test]
    fn test_config_json_shape() {
        let mut config = Configuration::default();
        config.invert[1] = true;
        config.mode = DriveMode::Tank;
        assert_eq!(
            config.to_json().unwrap(),
            r#"{"mapping":[1,2,3,4],"invert":[false,true,false,false],"mode":"tank"}"#
        );
    }

    #[test]
    fn test_config_rejects_bad_motor_id() {
        let raw = r#"{"mapping":[1,2,3,9],"invert":[false,false,false,false],"mode":"omni"}"#;
        assert!(serde_json::from_str::<Configuration>(raw).is_err());
    }
}
