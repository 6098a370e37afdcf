//! H-bridge channel encoding and motor output back-ends.
//!
//! The TA6586-style driver takes one direction line and one PWM line per
//! channel. Forward holds the direction line low and drives the PWM line with
//! the commanded magnitude. Reverse holds the direction line high, and the
//! driver then treats the *inverted* duty as reverse power: a larger reverse
//! magnitude means a smaller duty. Full reverse is duty 0 with the line high.
//!
//! The direction line has to be stable before the duty changes, otherwise
//! the driver briefly sees a brake/short pattern. Both back-ends write the
//! direction, wait the settle delay ([`SETTLE_DELAY_US`] by default), then
//! write the duty. Going to the stop state runs the other way round: the duty
//! is cleared first, so the old duty never meets the new direction level.

use core::cell::RefCell;

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c, pwm::SetDutyCycle};
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::controllers::mapper::PhysicalMotor;

/// Largest duty on the 8-bit scale.
pub const MAX_DUTY: u8 = 255;
/// Direction line settle time before a duty write.
pub const SETTLE_DELAY_US: u32 = 10;

/// Level of a channel's direction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionLevel {
    /// Line low.
    Forward,
    /// Line high.
    Reverse,
}

/// Encode a signed wheel command into `(direction, duty)` for one channel.
///
/// | speed | direction | duty                  |
/// |-------|-----------|-----------------------|
/// | 0     | Forward   | 0                     |
/// | > 0   | Forward   | min(255, s)           |
/// | < 0   | Reverse   | 255 - min(255, \|s\|) |
pub fn encode(speed: i16) -> (DirectionLevel, u8) {
    let magnitude = speed.unsigned_abs().min(MAX_DUTY as u16) as u8;
    if speed < 0 {
        (DirectionLevel::Reverse, MAX_DUTY - magnitude)
    } else {
        (DirectionLevel::Forward, magnitude)
    }
}

/// The stop state: direction line low, no PWM.
pub const fn is_idle(
    direction: DirectionLevel,
    duty: u8,
) -> bool {
    matches!(direction, DirectionLevel::Forward) && duty == 0
}

/// Applies an encoded command to one physical channel.
///
/// Implementations must write the direction before the duty, except when
/// going to the stop state, where the duty is cleared first.
pub trait MotorOutput {
    type Error: core::fmt::Debug;

    fn apply(
        &mut self,
        motor: PhysicalMotor,
        direction: DirectionLevel,
        duty: u8,
    ) -> Result<(), Self::Error>;
}

/// Errors from a GPIO + PWM H-bridge channel.
#[derive(Debug)]
pub enum HBridgeError<PE, WE> {
    Direction(PE),
    Duty(WE),
}

/// Direction pin and PWM output of one driver channel.
pub struct HBridgeChannel<P, W> {
    pub direction: P,
    pub pwm: W,
}

/// Four H-bridge channels driven straight from GPIO and PWM peripherals.
pub struct HBridgeBank<P, W, D> {
    channels: [HBridgeChannel<P, W>; 4],
    delay: D,
    settle_us: u32,
}

impl<P, W, D> HBridgeBank<P, W, D>
where
    P: OutputPin,
    W: SetDutyCycle,
    D: DelayNs,
{
    /// Channels are given in physical order, motor 1 first.
    pub fn new(
        channels: [HBridgeChannel<P, W>; 4],
        delay: D,
    ) -> Self {
        HBridgeBank {
            channels,
            delay,
            settle_us: SETTLE_DELAY_US,
        }
    }

    pub fn with_settle_delay(
        mut self,
        settle_us: u32,
    ) -> Self {
        self.settle_us = settle_us;
        self
    }

    pub fn release(self) -> ([HBridgeChannel<P, W>; 4], D) {
        (self.channels, self.delay)
    }
}

impl<P, W, D> MotorOutput for HBridgeBank<P, W, D>
where
    P: OutputPin,
    W: SetDutyCycle,
    D: DelayNs,
{
    type Error = HBridgeError<P::Error, W::Error>;

    fn apply(
        &mut self,
        motor: PhysicalMotor,
        direction: DirectionLevel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        let channel = &mut self.channels[motor.index()];
        if is_idle(direction, duty) {
            channel.pwm.set_duty_cycle_fully_off().map_err(HBridgeError::Duty)?;
            return channel.direction.set_low().map_err(HBridgeError::Direction);
        }

        let level = match direction {
            DirectionLevel::Forward => channel.direction.set_low(),
            DirectionLevel::Reverse => channel.direction.set_high(),
        };
        level.map_err(HBridgeError::Direction)?;
        self.delay.delay_us(self.settle_us);

        channel
            .pwm
            .set_duty_cycle_fraction(duty as u16, MAX_DUTY as u16)
            .map_err(HBridgeError::Duty)
    }
}

/// PCA9685 full-scale count.
const PCA_FULL_SCALE: u16 = 4095;
/// Prescale for the fastest PCA9685 PWM frequency (~1.5 kHz).
pub const PCA_PRESCALE: u8 = 3;

/// Four H-bridge channels driven through a PCA9685 on a shared I2C bus.
///
/// Each motor uses a pair of expander outputs: the first as the direction
/// line (fully off or fully on), the second as the PWM line.
pub struct Pca9685Bank<'a, I2C: 'static, D> {
    pub pwm: Pca9685<RefCellDevice<'a, I2C>>,
    channels: [(Channel, Channel); 4],
    delay: D,
    settle_us: u32,
}

impl<'a, I2C, E, D> Pca9685Bank<'a, I2C, D>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
    D: DelayNs,
{
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
        delay: D,
    ) -> Result<Self, PwmError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address))?;
        Ok(Pca9685Bank {
            pwm,
            channels: [
                (Channel::C0, Channel::C1),
                (Channel::C2, Channel::C3),
                (Channel::C4, Channel::C5),
                (Channel::C6, Channel::C7),
            ],
            delay,
            settle_us: SETTLE_DELAY_US,
        })
    }

    pub fn with_settle_delay(
        mut self,
        settle_us: u32,
    ) -> Self {
        self.settle_us = settle_us;
        self
    }

    /// Enable the expander and set its PWM frequency.
    pub fn configure(&mut self) -> Result<(), PwmError<E>> {
        self.pwm.enable()?;
        self.pwm.set_prescale(PCA_PRESCALE)?;
        tracing::info!(prescale = PCA_PRESCALE, "PCA9685 motor bank enabled");
        Ok(())
    }
}

impl<'a, I2C, E, D> MotorOutput for Pca9685Bank<'a, I2C, D>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
    D: DelayNs,
{
    type Error = PwmError<E>;

    fn apply(
        &mut self,
        motor: PhysicalMotor,
        direction: DirectionLevel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        let (direction_channel, duty_channel) = self.channels[motor.index()];
        if is_idle(direction, duty) {
            self.pwm.set_channel_on_off(duty_channel, 0, 0)?;
            return self.pwm.set_channel_on_off(direction_channel, 0, 0);
        }

        let level = match direction {
            DirectionLevel::Forward => 0,
            DirectionLevel::Reverse => PCA_FULL_SCALE,
        };
        self.pwm.set_channel_on_off(direction_channel, 0, level)?;
        self.delay.delay_us(self.settle_us);

        let off = (duty as u32 * PCA_FULL_SCALE as u32 / MAX_DUTY as u32) as u16;
        self.pwm.set_channel_on_off(duty_channel, 0, off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_truth_table() {
        assert_eq!(encode(0), (DirectionLevel::Forward, 0));
        assert_eq!(encode(200), (DirectionLevel::Forward, 200));
        assert_eq!(encode(255), (DirectionLevel::Forward, 255));
        assert_eq!(encode(-200), (DirectionLevel::Reverse, 55));
        assert_eq!(encode(-1), (DirectionLevel::Reverse, 254));
    }

    #[test]
    fn test_encode_full_reverse_is_zero_duty() {
        assert_eq!(encode(-255), (DirectionLevel::Reverse, 0));
    }

    #[test]
    fn test_encode_clamps_magnitude() {
        assert_eq!(encode(900), (DirectionLevel::Forward, 255));
        assert_eq!(encode(i16::MIN), (DirectionLevel::Reverse, 0));
    }

    #[test]
    fn test_idle_only_for_forward_zero() {
        assert!(is_idle(DirectionLevel::Forward, 0));
        assert!(!is_idle(DirectionLevel::Reverse, 0));
        assert!(!is_idle(DirectionLevel::Forward, 1));
    }
}
