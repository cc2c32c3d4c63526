//! rapier3d world wrapper: body/collider sets, stepping, pose queries.

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

/// Opaque handle to a rigid body in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyHandle(RigidBodyHandle);

/// The simulation: rapier sets and pipeline plus gravity.
///
/// Single-threaded and synchronous; `step` blocks for the duration of
/// one fixed timestep.
pub struct PhysicsWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Static ground plane at y = 0.
    pub fn add_ground_plane(&mut self) {
        let collider = ColliderBuilder::cuboid(200.0, 0.1, 200.0)
            .translation(vector![0.0, -0.1, 0.0])
            .friction(0.9)
            .build();
        self.colliders.insert(collider);
    }

    /// Dynamic ball with an initial velocity; the projectile path.
    pub fn spawn_ball(&mut self, position: Vec3, radius: f32, velocity: Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::new(RigidBodyType::Dynamic)
            .translation(vector![position.x, position.y, position.z])
            .linvel(vector![velocity.x, velocity.y, velocity.z])
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .density(3.0)
            .restitution(0.6)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        tracing::debug!(?position, radius, "spawned ball");
        BodyHandle(handle)
    }

    /// Dynamic box used as the vehicle chassis. Damping keeps the drive
    /// force model from spinning out.
    pub fn spawn_chassis(&mut self, position: Vec3, half_extents: Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::new(RigidBodyType::Dynamic)
            .translation(vector![position.x, position.y, position.z])
            .linear_damping(0.8)
            .angular_damping(2.0)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .density(1.5)
            .friction(0.8)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        tracing::debug!(?position, "spawned chassis");
        BodyHandle(handle)
    }

    /// Position and orientation of a body, identity if the handle is
    /// stale.
    pub fn body_pose(&self, handle: BodyHandle) -> (Vec3, Quat) {
        if let Some(rb) = self.bodies.get(handle.0) {
            let t = rb.translation();
            let r = rb.rotation();
            (
                Vec3::new(t.x, t.y, t.z),
                Quat::from_xyzw(r.i, r.j, r.k, r.w),
            )
        } else {
            (Vec3::ZERO, Quat::IDENTITY)
        }
    }

    /// Linear velocity of a body, zero if the handle is stale.
    pub fn body_velocity(&self, handle: BodyHandle) -> Vec3 {
        if let Some(rb) = self.bodies.get(handle.0) {
            let v = rb.linvel();
            Vec3::new(v.x, v.y, v.z)
        } else {
            Vec3::ZERO
        }
    }

    pub(crate) fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn ball_falls_under_gravity() {
        let mut world = PhysicsWorld::new();
        let ball = world.spawn_ball(Vec3::new(0.0, 5.0, 0.0), 0.5, Vec3::ZERO);
        for _ in 0..60 {
            world.step(DT);
        }
        let (pos, _) = world.body_pose(ball);
        assert!(pos.y < 5.0, "ball did not fall: y = {}", pos.y);
    }

    #[test]
    fn ground_plane_stops_the_fall() {
        let mut world = PhysicsWorld::new();
        world.add_ground_plane();
        let ball = world.spawn_ball(Vec3::new(0.0, 3.0, 0.0), 0.5, Vec3::ZERO);
        for _ in 0..600 {
            world.step(DT);
        }
        let (pos, _) = world.body_pose(ball);
        assert!(pos.y > 0.0, "ball fell through the ground: y = {}", pos.y);
        assert!(pos.y < 3.0);
    }

    #[test]
    fn ball_keeps_initial_direction() {
        let mut world = PhysicsWorld::new();
        let ball = world.spawn_ball(Vec3::ZERO, 0.2, Vec3::new(10.0, 0.0, 0.0));
        for _ in 0..30 {
            world.step(DT);
        }
        let (pos, _) = world.body_pose(ball);
        assert!(pos.x > 1.0, "ball did not travel: x = {}", pos.x);
    }

    #[test]
    fn stale_handle_reports_identity() {
        let world = PhysicsWorld::new();
        let other = {
            let mut w = PhysicsWorld::new();
            w.spawn_ball(Vec3::ONE, 0.5, Vec3::ZERO)
        };
        let (pos, rot) = world.body_pose(other);
        assert_eq!(pos, Vec3::ZERO);
        assert_eq!(rot, Quat::IDENTITY);
    }
}
