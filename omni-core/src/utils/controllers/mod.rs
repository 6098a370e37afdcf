//! Module Exports
//!
//! This file exports the motor command layer and the controller that owns it.
//!
//! - `mapper`: logical to physical wheel mapping and inversion flags.
//! - `hbridge`: signed command to `(direction, duty)` encoding and the motor
//!   output back-ends.
//! - `governor`: the global speed setting.
//! - `store`: configuration persistence seam.

pub mod governor;
pub mod hbridge;
pub mod mapper;
pub mod store;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use embassy_time::Instant;

use crate::utils::{
    connection::command::{DriveCommand, TestAction},
    math::kinematics::{mix_discrete, mix_joystick, WheelSpeeds},
};
use governor::SpeedGovernor;
use hbridge::{encode, DirectionLevel, MotorOutput};
use mapper::{Configuration, LogicalMotor, MotorMapper, PhysicalMotor};
use store::{ConfigStore, StoreError};

/// Single dispatch queue between the transports and the drive controller.
pub static DRIVE_CHANNEL: Channel<CriticalSectionRawMutex, DriveCommand, 16> = Channel::new();

/// Configuration readback published after `get_config`, `save_config` and
/// `reset_config`.
pub static CONFIG_SIGNAL: Signal<CriticalSectionRawMutex, Configuration> = Signal::new();

/// Request an all-stop from any context.
///
/// Queued commands are discarded first so nothing issued before the link
/// dropped runs after the stop.
pub fn request_emergency_stop() {
    while DRIVE_CHANNEL.try_receive().is_ok() {}
    if DRIVE_CHANNEL.try_send(DriveCommand::EmergencyStop).is_err() {
        tracing::error!("drive queue refilled before emergency stop could be queued");
    }
}

/// Errors surfaced by the drive controller.
#[derive(Debug)]
pub enum DriveError<E: core::fmt::Debug> {
    /// One or more wheels failed to take their command and were parked.
    /// `faulted` is indexed by logical wheel; `error` is the first failure.
    WheelFault { faulted: [bool; 4], error: E },
    Store(StoreError),
}

/// Owns the wheel configuration, the speed setting and the motor output.
///
/// All mutation goes through [`DriveController::execute`]; callers serialize
/// access, normally by feeding [`DRIVE_CHANNEL`] into [`DriveController::drive_ch`].
pub struct DriveController<M, S> {
    output: M,
    store: S,
    mapper: MotorMapper,
    governor: SpeedGovernor,
    wheels: WheelSpeeds,
}

impl<M, S> DriveController<M, S>
where
    M: MotorOutput,
    S: ConfigStore,
{
    /// Load the stored configuration and park every channel.
    pub fn new(
        output: M,
        mut store: S,
    ) -> Self {
        let config = store.load();
        let mut controller = DriveController {
            output,
            store,
            mapper: MotorMapper::new(config),
            governor: SpeedGovernor::default(),
            wheels: WheelSpeeds::zero(),
        };
        controller.emergency_stop();
        controller
    }

    pub fn config(&self) -> &Configuration {
        self.mapper.config()
    }

    pub fn speed(&self) -> u8 {
        self.governor.speed()
    }

    /// Last logical wheel commands, before inversion. Faulted wheels read 0.
    pub fn wheels(&self) -> WheelSpeeds {
        self.wheels
    }

    pub fn output(&self) -> &M {
        &self.output
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one command. `now` feeds the speed step rate limit.
    ///
    /// Returns the configuration for the readback commands.
    pub fn execute(
        &mut self,
        command: DriveCommand,
        now: Instant,
    ) -> Result<Option<Configuration>, DriveError<M::Error>> {
        match command {
            DriveCommand::Motion(set) => {
                tracing::debug!(?set, speed = self.speed(), "discrete motion");
                self.drive(mix_discrete(set, self.speed()))?;
            }
            DriveCommand::Joystick { x, y } => {
                self.drive(mix_joystick(x, y, self.mapper.mode()))?;
            }
            DriveCommand::SetSpeed(speed) => {
                self.governor.set_absolute(speed);
                tracing::info!(speed, "speed set");
            }
            DriveCommand::SpeedUp => match self.governor.increment(now) {
                Some(speed) => tracing::info!(speed, "speed increased"),
                None => tracing::debug!("speed step dropped"),
            },
            DriveCommand::SpeedDown => match self.governor.decrement(now) {
                Some(speed) => tracing::info!(speed, "speed decreased"),
                None => tracing::debug!("speed step dropped"),
            },
            DriveCommand::SetMode(mode) => {
                self.mapper.set_mode(mode);
                tracing::info!(?mode, "drive mode set");
            }
            DriveCommand::SetMapping { position, motor } => {
                self.mapper.map(position, motor);
                tracing::info!(?position, motor = motor.id(), "wheel remapped");
                // the old channel may no longer be reachable through the mapping
                self.emergency_stop();
            }
            DriveCommand::SetInvert { position, invert } => {
                self.mapper.invert(position, invert);
                tracing::info!(?position, invert, "wheel inversion set");
                self.emergency_stop();
            }
            DriveCommand::Test { position, action } => {
                let speed = self.speed() as i32;
                let mut raw = [0; 4];
                raw[position.index()] = match action {
                    TestAction::Forward => speed,
                    TestAction::Backward => -speed,
                    TestAction::Stop => 0,
                };
                tracing::info!(?position, ?action, "wheel test");
                self.drive(WheelSpeeds::clamped(raw))?;
            }
            DriveCommand::GetConfig => return Ok(Some(*self.config())),
            DriveCommand::SaveConfig => {
                self.store.save(self.mapper.config()).map_err(DriveError::Store)?;
                return Ok(Some(*self.config()));
            }
            DriveCommand::ResetConfig => {
                self.mapper.reset();
                self.emergency_stop();
                tracing::info!("configuration reset to defaults");
                self.store.reset().map_err(DriveError::Store)?;
                return Ok(Some(*self.config()));
            }
            DriveCommand::EmergencyStop => {
                tracing::warn!("emergency stop");
                self.emergency_stop();
            }
        }
        Ok(None)
    }

    /// Route four logical wheel commands through mapping, inversion and the
    /// H-bridge encoding to the motor output.
    ///
    /// A wheel whose output fails is parked once and reported; the remaining
    /// wheels still receive their commands.
    pub fn drive(
        &mut self,
        wheels: WheelSpeeds,
    ) -> Result<(), DriveError<M::Error>> {
        let mut faulted = [false; 4];
        let mut first_error = None;
        let mut applied = wheels.as_array();

        for logical in LogicalMotor::ALL {
            let speed = self.mapper.apply_inversion(logical, wheels.get(logical.index()));
            let motor = self.mapper.resolve_physical(logical);
            let (direction, duty) = encode(speed);
            if let Err(error) = self.output.apply(motor, direction, duty) {
                tracing::error!(?logical, motor = motor.id(), ?error, "motor output failed, parking wheel");
                if let Err(error) = self.output.apply(motor, DirectionLevel::Forward, 0) {
                    tracing::error!(motor = motor.id(), ?error, "failed to park wheel");
                }
                faulted[logical.index()] = true;
                applied[logical.index()] = 0;
                first_error.get_or_insert(error);
            }
        }

        self.wheels = WheelSpeeds::clamped(applied.map(i32::from));
        match first_error {
            Some(error) => Err(DriveError::WheelFault { faulted, error }),
            None => Ok(()),
        }
    }

    /// Put every physical channel in the stop state.
    ///
    /// Addresses channels directly rather than through the mapping so a channel
    /// left out of the mapping is stopped too. Failures are logged and skipped.
    pub fn emergency_stop(&mut self) {
        for motor in PhysicalMotor::ALL {
            if let Err(error) = self.output.apply(motor, DirectionLevel::Forward, 0) {
                tracing::error!(motor = motor.id(), ?error, "failed to stop motor");
            }
        }
        self.wheels = WheelSpeeds::zero();
    }

    /// Drain [`DRIVE_CHANNEL`] forever, publishing readbacks on [`CONFIG_SIGNAL`].
    pub async fn drive_ch(&mut self) -> ! {
        loop {
            let command = DRIVE_CHANNEL.receiver().receive().await;
            tracing::debug!(?command, "drive command received");
            match self.execute(command, Instant::now()) {
                Ok(Some(config)) => CONFIG_SIGNAL.signal(config),
                Ok(None) => {}
                Err(error) => tracing::error!(?error, "drive command failed"),
            }
        }
    }
}
