//! Vehicle drive model: drive modes, control inputs, and the autopilot
//! sequencer that cycles through the demo maneuvers.

use rapier3d::prelude::*;

use crate::world::{BodyHandle, PhysicsWorld};

/// Seconds each autopilot maneuver runs before the sequencer advances.
const MODE_LIFETIME: f32 = 4.0;

const ENGINE_FORCE: f32 = 900.0;
const STEER_TORQUE: f32 = 350.0;
const BRAKE_FORCE: f32 = 60.0;
const HANDBRAKE_DAMPING: f32 = 6.0;

/// The demo's eight drive maneuvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    AccelForwards,
    AccelReverse,
    HardTurnLeft,
    HandbrakeTurnLeft,
    HardTurnRight,
    HandbrakeTurnRight,
    Brake,
    None,
}

impl DriveMode {
    /// Autopilot order, matching the demo's maneuver sequence.
    pub const ORDER: [DriveMode; 8] = [
        DriveMode::AccelForwards,
        DriveMode::AccelReverse,
        DriveMode::HardTurnLeft,
        DriveMode::HandbrakeTurnLeft,
        DriveMode::HardTurnRight,
        DriveMode::HandbrakeTurnRight,
        DriveMode::Brake,
        DriveMode::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DriveMode::AccelForwards => "accelerate forwards",
            DriveMode::AccelReverse => "accelerate reverse",
            DriveMode::HardTurnLeft => "hard turn left",
            DriveMode::HandbrakeTurnLeft => "handbrake turn left",
            DriveMode::HardTurnRight => "hard turn right",
            DriveMode::HandbrakeTurnRight => "handbrake turn right",
            DriveMode::Brake => "brake",
            DriveMode::None => "coast",
        }
    }
}

/// Normalized control inputs derived from a drive mode (or from keys).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveInput {
    /// Engine drive, -1 (reverse) to 1 (forward).
    pub engine: f32,
    /// Steering, -1 (right) to 1 (left).
    pub steer: f32,
    /// Brake strength, 0 to 1.
    pub brake: f32,
    pub handbrake: bool,
}

impl From<DriveMode> for DriveInput {
    fn from(mode: DriveMode) -> Self {
        match mode {
            DriveMode::AccelForwards => Self {
                engine: 1.0,
                ..Default::default()
            },
            DriveMode::AccelReverse => Self {
                engine: -1.0,
                ..Default::default()
            },
            DriveMode::HardTurnLeft => Self {
                engine: 1.0,
                steer: 1.0,
                ..Default::default()
            },
            DriveMode::HandbrakeTurnLeft => Self {
                steer: 1.0,
                handbrake: true,
                ..Default::default()
            },
            DriveMode::HardTurnRight => Self {
                engine: 1.0,
                steer: -1.0,
                ..Default::default()
            },
            DriveMode::HandbrakeTurnRight => Self {
                steer: -1.0,
                handbrake: true,
                ..Default::default()
            },
            DriveMode::Brake => Self {
                brake: 1.0,
                ..Default::default()
            },
            DriveMode::None => Self::default(),
        }
    }
}

/// The vehicle: a chassis body plus the current control inputs.
///
/// Inputs are translated into a forward drive force, a yaw steering
/// torque, and braking forces once per tick, before the world steps.
pub struct Vehicle {
    pub chassis: BodyHandle,
    pub input: DriveInput,
}

impl Vehicle {
    pub fn new(chassis: BodyHandle) -> Self {
        Self {
            chassis,
            input: DriveInput::default(),
        }
    }

    pub fn apply_drive_mode(&mut self, mode: DriveMode) {
        self.input = mode.into();
    }

    /// Convert the current inputs into forces on the chassis. Call once
    /// per tick before `PhysicsWorld::step`.
    pub fn apply_forces(&self, world: &mut PhysicsWorld) {
        let Some(rb) = world.body_mut(self.chassis) else {
            return;
        };
        rb.reset_forces(true);
        rb.reset_torques(true);

        let forward = rb.rotation() * vector![0.0, 0.0, -1.0];
        rb.add_force(forward * self.input.engine * ENGINE_FORCE, true);
        rb.add_torque(vector![0.0, self.input.steer * STEER_TORQUE, 0.0], true);

        if self.input.brake > 0.0 {
            let linvel = *rb.linvel();
            rb.add_force(-linvel * self.input.brake * BRAKE_FORCE, true);
        }
        if self.input.handbrake {
            // A crude handbrake: bleed linear velocity while the yaw
            // torque keeps rotating the chassis.
            let linvel = *rb.linvel();
            rb.add_force(-linvel * HANDBRAKE_DAMPING, true);
        }
    }

    /// Current speed in m/s.
    pub fn speed(&self, world: &PhysicsWorld) -> f32 {
        world.body_velocity(self.chassis).length()
    }
}

/// Autopilot: cycles through [`DriveMode::ORDER`], holding each mode for
/// a fixed lifetime, looping forever.
#[derive(Default)]
pub struct DriveSequencer {
    index: usize,
    timer: f32,
}

impl DriveSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DriveMode {
        DriveMode::ORDER[self.index]
    }

    /// Advance the timer; returns the mode to drive with this tick.
    pub fn advance(&mut self, dt: f32) -> DriveMode {
        self.timer += dt;
        while self.timer >= MODE_LIFETIME {
            self.timer -= MODE_LIFETIME;
            self.index = (self.index + 1) % DriveMode::ORDER.len();
            tracing::debug!(mode = self.current().label(), "drive mode advanced");
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn vehicle_on_ground() -> (PhysicsWorld, Vehicle) {
        let mut world = PhysicsWorld::new();
        world.add_ground_plane();
        let chassis = world.spawn_chassis(Vec3::new(0.0, 0.6, 0.0), Vec3::new(1.0, 0.5, 2.0));
        (world, Vehicle::new(chassis))
    }

    fn run(world: &mut PhysicsWorld, vehicle: &Vehicle, ticks: usize) {
        for _ in 0..ticks {
            vehicle.apply_forces(world);
            world.step(DT);
        }
    }

    #[test]
    fn accel_forwards_moves_along_negative_z() {
        let (mut world, mut vehicle) = vehicle_on_ground();
        vehicle.apply_drive_mode(DriveMode::AccelForwards);
        run(&mut world, &vehicle, 120);
        let (pos, _) = world.body_pose(vehicle.chassis);
        assert!(pos.z < -0.5, "vehicle did not drive forward: z = {}", pos.z);
    }

    #[test]
    fn accel_reverse_moves_along_positive_z() {
        let (mut world, mut vehicle) = vehicle_on_ground();
        vehicle.apply_drive_mode(DriveMode::AccelReverse);
        run(&mut world, &vehicle, 120);
        let (pos, _) = world.body_pose(vehicle.chassis);
        assert!(pos.z > 0.5, "vehicle did not reverse: z = {}", pos.z);
    }

    #[test]
    fn brake_slows_the_vehicle() {
        let (mut world, mut vehicle) = vehicle_on_ground();
        vehicle.apply_drive_mode(DriveMode::AccelForwards);
        run(&mut world, &vehicle, 180);
        let cruising = vehicle.speed(&world);
        assert!(cruising > 1.0);

        vehicle.apply_drive_mode(DriveMode::Brake);
        run(&mut world, &vehicle, 180);
        let braked = vehicle.speed(&world);
        assert!(
            braked < cruising * 0.5,
            "brake ineffective: {braked} vs {cruising}"
        );
    }

    #[test]
    fn hard_turn_changes_heading() {
        let (mut world, mut vehicle) = vehicle_on_ground();
        vehicle.apply_drive_mode(DriveMode::HardTurnLeft);
        run(&mut world, &vehicle, 240);
        let (_, rot) = world.body_pose(vehicle.chassis);
        let (yaw, _, _) = rot.to_euler(glam::EulerRot::YXZ);
        assert!(yaw.abs() > 0.05, "vehicle did not turn: yaw = {yaw}");
    }

    #[test]
    fn mode_inputs_match_maneuvers() {
        let accel: DriveInput = DriveMode::AccelForwards.into();
        assert_eq!(accel.engine, 1.0);
        assert_eq!(accel.brake, 0.0);

        let handbrake: DriveInput = DriveMode::HandbrakeTurnRight.into();
        assert!(handbrake.handbrake);
        assert_eq!(handbrake.steer, -1.0);
        assert_eq!(handbrake.engine, 0.0);

        let coast: DriveInput = DriveMode::None.into();
        assert_eq!(coast, DriveInput::default());
    }

    #[test]
    fn sequencer_advances_after_lifetime() {
        let mut seq = DriveSequencer::new();
        assert_eq!(seq.current(), DriveMode::AccelForwards);
        assert_eq!(seq.advance(MODE_LIFETIME - 0.1), DriveMode::AccelForwards);
        assert_eq!(seq.advance(0.2), DriveMode::AccelReverse);
    }

    #[test]
    fn sequencer_wraps_around() {
        let mut seq = DriveSequencer::new();
        for _ in 0..DriveMode::ORDER.len() {
            seq.advance(MODE_LIFETIME);
        }
        assert_eq!(seq.current(), DriveMode::AccelForwards);
    }
}
