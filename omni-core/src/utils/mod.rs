//! Utility re-exports and helper macros for the omni robot core.
//!
//! - `connection`: command vocabulary and the transport adapters (WebSocket,
//!   BLE payloads, Wii remote buttons)
//! - `controllers`: wheel mapping, H-bridge output, speed governor, config
//!   store and the drive controller that ties them together
//! - `math`: discrete and joystick kinematic mixing
//! - `frontend`: the control page served by the WebSocket adapter
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod connection;
pub mod controllers;
pub(crate) mod frontend;
pub mod math;

pub use connection::command::DriveCommand;
pub use connection::server::run as wss;
pub use controllers::{request_emergency_stop, DriveController, CONFIG_SIGNAL, DRIVE_CHANNEL};
pub use embassy_time::*;
pub use math::kinematics::{Motion, MotionSet, WheelSpeeds};

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
