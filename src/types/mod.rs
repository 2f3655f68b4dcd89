//! Shared type definitions
//!
//! Value types exchanged between the host-facing bridge surface and the
//! inference backend.

pub mod events;
pub mod model;
pub mod params;
