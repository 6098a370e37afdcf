//! Math utilities for the omni robot.
//!
//! This module provides the discrete and joystick kinematic mixers for the
//! four-wheel X layout.

pub mod kinematics;
