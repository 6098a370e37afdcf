//! Module Exports
//!
//! This file exports the command vocabulary and the transport adapters that
//! feed it.
//!
//! # Modules
//! - `command`: the transport-agnostic [`command::DriveCommand`] and its text form.
//! - `server`: WebSocket server, routes and message handling.
//! - `ble`: GATT characteristic payload decoding.
//! - `gamepad`: Wii remote button report decoding.

pub mod ble;
pub mod command;
pub mod gamepad;
/// Module for managing the WebSocket server, including routes and connection
/// handling.
pub mod server;
