//! Kinematic mixing and motor command core for a four-wheel omni/tank robot
//! on no-std embedded platforms.
//!
//! Transports decode their native messages into a [`utils::DriveCommand`] and
//! hand it to the [`utils::DriveController`]; see `omni-app/mock-mcu` for a
//! host-side harness.
#![no_std]

extern crate alloc;

pub mod utils;
