use glam::Vec3;

/// A surface material.
///
/// Only the parameters the animation system can target live here; shading
/// itself is the renderer's concern.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Base color (RGB, linear)
    pub color: Vec3,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
}

impl Material {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Vec3::ONE,
            opacity: 1.0,
        }
    }
}
