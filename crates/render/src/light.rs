use glam::Vec3;

/// Point light position consumed by the entity render path. A pure value
/// object; it owns nothing and is adjusted from the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(8.0, 12.0, 6.0),
        }
    }
}
