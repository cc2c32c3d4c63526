//! Rigid-body simulation for the cubekart demo, backed by rapier3d.
//!
//! The frame loop steps the world once per fixed tick and copies body
//! poses back into scene entities. Vehicle control is a force model on
//! the chassis body driven by the original demo's eight drive modes.

mod vehicle;
mod world;

pub use vehicle::{DriveInput, DriveMode, DriveSequencer, Vehicle};
pub use world::{BodyHandle, PhysicsWorld};
