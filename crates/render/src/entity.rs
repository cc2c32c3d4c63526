//! A posed scene object owning one renderable.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::binding::PassOps;
use crate::camera::Camera;
use crate::light::Light;
use crate::renderable::Renderable;

/// Projection parameters shared by every entity draw. The aspect ratio
/// comes from the current surface configuration each frame.
const FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
const Z_NEAR: f32 = 0.5;
const Z_FAR: f32 = 100.0;

/// The scene projection for a given surface aspect ratio. Entities use
/// it internally; the sky pass composes it with a rotation-only view.
pub fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_Y, aspect, Z_NEAR, Z_FAR)
}

/// Vertex-stage constant block: full transform into view space, the
/// projection, and the rotation-only matrix used for normals.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

/// Pixel-stage constant block: the light position as four components.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    pub position: [f32; 4],
}

/// A positioned, oriented scene object. Owns at most one [`Renderable`]
/// and projects its pose into per-frame constant blocks.
///
/// Pose fields are plain data: input and physics overwrite them every
/// tick, `render` reads them. `distance` only participates in the
/// preview path.
#[derive(Default)]
pub struct Entity {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub distance: f32,
    renderable: Option<Renderable>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfer ownership of a renderable into the entity.
    ///
    /// Single assignment only; a second call panics.
    pub fn attach_renderable(&mut self, renderable: Renderable) {
        assert!(
            self.renderable.is_none(),
            "entity already owns a renderable"
        );
        self.renderable = Some(renderable);
    }

    pub fn has_renderable(&self) -> bool {
        self.renderable.is_some()
    }

    /// Replace the position unconditionally.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    /// Replace the orientation unconditionally.
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.pitch = pitch;
        self.yaw = yaw;
        self.roll = roll;
    }

    /// Rotation-only matrix: yaw, then pitch, then roll applied to the
    /// model, composed as Y * X * Z.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.yaw)
            * Mat4::from_rotation_x(self.pitch)
            * Mat4::from_rotation_z(self.roll)
    }

    /// Full-scene vertex constants: rotation, then translation, then the
    /// camera view, with the projection derived from the surface aspect.
    pub fn object_constants(&self, view: Mat4, aspect: f32) -> ObjectConstants {
        let rotation = self.rotation();
        let world_view = view * Mat4::from_translation(self.position) * rotation;
        ObjectConstants {
            world_view: world_view.to_cols_array_2d(),
            proj: projection(aspect).to_cols_array_2d(),
            model: rotation.to_cols_array_2d(),
        }
    }

    /// Preview vertex constants: rotation, then translation along the view
    /// axis by `distance`. No camera, no light.
    pub fn preview_constants(&self, aspect: f32) -> ObjectConstants {
        let rotation = self.rotation();
        let world_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance)) * rotation;
        ObjectConstants {
            world_view: world_view.to_cols_array_2d(),
            proj: projection(aspect).to_cols_array_2d(),
            model: rotation.to_cols_array_2d(),
        }
    }

    /// Pixel constants: the light position expanded to four components.
    pub fn light_constants(light: &Light) -> LightConstants {
        LightConstants {
            position: light.position.extend(1.0).to_array(),
        }
    }

    /// Light block for the preview path, which has no scene light. The
    /// scene shader normalizes the light direction, so this must never
    /// be the zero vector.
    pub fn preview_light_constants() -> LightConstants {
        Self::light_constants(&Light::default())
    }

    /// Full-scene render path: push both constant blocks, then draw.
    ///
    /// Panics if no renderable is attached.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        pass: &mut dyn PassOps,
        camera: &Camera,
        aspect: f32,
        light: &Light,
    ) {
        let renderable = self.renderable.as_ref().expect("entity has no renderable");
        let vc = self.object_constants(camera.view_matrix(), aspect);
        let pc = Self::light_constants(light);
        renderable.update_vertex(queue, bytemuck::bytes_of(&vc));
        renderable.update_pixel(queue, bytemuck::bytes_of(&pc));
        renderable.render(pass);
    }

    /// Standalone-preview render path: slider-driven pose with a fixed
    /// default light.
    ///
    /// Panics if no renderable is attached.
    pub fn render_preview(&self, queue: &wgpu::Queue, pass: &mut dyn PassOps, aspect: f32) {
        let renderable = self.renderable.as_ref().expect("entity has no renderable");
        let vc = self.preview_constants(aspect);
        let pc = Self::preview_light_constants();
        renderable.update_vertex(queue, bytemuck::bytes_of(&vc));
        renderable.update_pixel(queue, bytemuck::bytes_of(&pc));
        renderable.render(pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_position_replaces() {
        let mut e = Entity::new();
        e.set_position(1.0, 2.0, 3.0);
        e.set_position(4.0, 5.0, 6.0);
        assert_eq!(e.position, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    #[should_panic(expected = "already owns a renderable")]
    fn second_attach_panics() {
        let mut e = Entity::new();
        e.attach_renderable(Renderable::new());
        e.attach_renderable(Renderable::new());
    }

    #[test]
    fn object_constants_compose_rotation_translation_camera() {
        let mut e = Entity::new();
        e.set_position(1.0, -2.0, 4.0);
        e.set_rotation(0.3, 1.1, -0.5);

        let view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, Vec3::Y);
        let vc = e.object_constants(view, 16.0 / 9.0);

        let rotation = Mat4::from_rotation_y(1.1)
            * Mat4::from_rotation_x(0.3)
            * Mat4::from_rotation_z(-0.5);
        let expected = view * Mat4::from_translation(Vec3::new(1.0, -2.0, 4.0)) * rotation;
        assert_eq!(vc.world_view, expected.to_cols_array_2d());
        assert_eq!(vc.model, rotation.to_cols_array_2d());
    }

    #[test]
    fn object_constants_are_deterministic() {
        let mut e = Entity::new();
        e.set_position(0.5, 0.0, -3.0);
        e.set_rotation(0.1, 0.2, 0.3);
        let view = Mat4::IDENTITY;
        assert_eq!(e.object_constants(view, 1.5), e.object_constants(view, 1.5));
    }

    #[test]
    fn light_constants_expand_position() {
        let light = Light {
            position: Vec3::new(7.0, 8.0, 9.0),
        };
        let pc = Entity::light_constants(&light);
        assert_eq!(pc.position, [7.0, 8.0, 9.0, 1.0]);
    }

    #[test]
    fn preview_light_has_a_usable_direction() {
        let pc = Entity::preview_light_constants();
        let dir = Vec3::new(pc.position[0], pc.position[1], pc.position[2]);
        // The shader normalizes this; a zero vector would shade as NaN.
        assert!(dir.length() > 1e-3);
    }

    #[test]
    fn preview_constants_translate_by_distance() {
        let mut e = Entity::new();
        e.distance = 6.0;
        let vc = e.preview_constants(1.0);
        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0)) * Mat4::IDENTITY;
        assert_eq!(vc.world_view, expected.to_cols_array_2d());
    }
}
