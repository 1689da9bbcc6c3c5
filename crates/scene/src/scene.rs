use crate::color::Color;
use glam::Vec3;

/// Spatial transform for a scene mesh: position plus per-axis scale.
/// Cubes in this viewer never rotate, so there is no rotation component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A handle into the scene's geometry table.
///
/// Geometry is shared: several cubes may reference the same entry, so a cube
/// never owns vertex data directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Box dimensions for a cube mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxGeometry {
    /// The 1 x 1 x 1 box every demo cube shares.
    pub const UNIT: Self = Self {
        width: 1.0,
        height: 1.0,
        depth: 1.0,
    };
}

/// Surface material for a cube. Exclusively owned by its cube, so editing
/// one cube's color never affects another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
}

/// A single cube mesh: shared geometry reference, owned material, transform.
#[derive(Debug, Clone)]
pub struct Cube {
    pub label: String,
    pub geometry: GeometryHandle,
    pub material: Material,
    pub transform: Transform,
}

/// The scene's single directional light.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the origin toward the light. Shaders use
    /// this as the incident light direction.
    pub fn direction(&self) -> Vec3 {
        self.position.normalize()
    }
}

/// A fixed, unordered collection of cubes plus one directional light.
///
/// Once constructed, the cube count, geometry table, and light never change
/// for the lifetime of the process. The only mutation path is `cube_mut`,
/// which the property panel uses to apply color and scale edits.
#[derive(Debug, Clone)]
pub struct Scene {
    geometries: Vec<BoxGeometry>,
    cubes: Vec<Cube>,
    light: DirectionalLight,
}

impl Scene {
    pub fn new(geometries: Vec<BoxGeometry>, cubes: Vec<Cube>, light: DirectionalLight) -> Self {
        Self {
            geometries,
            cubes,
            light,
        }
    }

    /// The fixed startup configuration: three unit cubes spaced along X,
    /// each with its own material, all sharing one geometry entry, lit by a
    /// single white directional light.
    pub fn demo() -> Self {
        let geometry = GeometryHandle(0);
        let cube = |label: &str, x: f32, color: u32| Cube {
            label: label.to_owned(),
            geometry,
            material: Material {
                color: Color::from_hex_rgb(color),
            },
            transform: Transform {
                position: Vec3::new(x, 0.0, 0.0),
                ..Transform::default()
            },
        };

        Self::new(
            vec![BoxGeometry::UNIT],
            vec![
                cube("Center Cube", 0.0, 0x44aa88),
                cube("Left Cube", -2.0, 0x8844aa),
                cube("Right Cube", 2.0, 0xaa8844),
            ],
            DirectionalLight {
                color: Color::WHITE,
                intensity: 1.0,
                position: Vec3::new(-1.0, 2.0, 4.0),
            },
        )
    }

    pub fn geometries(&self) -> &[BoxGeometry] {
        &self.geometries
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&BoxGeometry> {
        self.geometries.get(handle.0 as usize)
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn cube(&self, index: usize) -> Option<&Cube> {
        self.cubes.get(index)
    }

    /// Mutable access to one cube for field edits. Returns `None` for an
    /// out-of-range index rather than panicking.
    pub fn cube_mut(&mut self, index: usize) -> Option<&mut Cube> {
        self.cubes.get_mut(index)
    }

    pub fn cube_count(&self) -> usize {
        self.cubes.len()
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn demo_scene_layout() {
        let scene = Scene::demo();
        assert_eq!(scene.cube_count(), 3);
        assert_eq!(scene.geometries().len(), 1);

        let positions: Vec<f32> = scene
            .cubes()
            .iter()
            .map(|c| c.transform.position.x)
            .collect();
        assert_eq!(positions, vec![0.0, -2.0, 2.0]);

        // All cubes share the one geometry entry.
        for cube in scene.cubes() {
            assert_eq!(cube.geometry, GeometryHandle(0));
            assert!(scene.geometry(cube.geometry).is_some());
        }
    }

    #[test]
    fn demo_scene_colors() {
        let scene = Scene::demo();
        let colors: Vec<[u8; 3]> = scene
            .cubes()
            .iter()
            .map(|c| c.material.color.to_srgb_u8())
            .collect();
        assert_eq!(
            colors,
            vec![[0x44, 0xaa, 0x88], [0x88, 0x44, 0xaa], [0xaa, 0x88, 0x44]]
        );
    }

    #[test]
    fn cube_mut_applies_edits() {
        let mut scene = Scene::demo();
        scene.cube_mut(1).unwrap().transform.scale.x = 1.5;
        assert_eq!(scene.cube(1).unwrap().transform.scale.x, 1.5);
        // The neighbors are untouched.
        assert_eq!(scene.cube(0).unwrap().transform.scale.x, 1.0);
        assert_eq!(scene.cube(2).unwrap().transform.scale.x, 1.0);
    }

    #[test]
    fn cube_mut_out_of_range() {
        let mut scene = Scene::demo();
        assert!(scene.cube_mut(3).is_none());
    }

    #[test]
    fn light_direction_is_normalized() {
        let scene = Scene::demo();
        let dir = scene.light().direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        // Light sits up, behind, and to the left of the scene.
        assert!(dir.x < 0.0 && dir.y > 0.0 && dir.z > 0.0);
    }
}
