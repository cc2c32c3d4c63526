//! Procedural demo meshes: cube, uv-sphere, inward-facing sky cube.

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// CPU-side geometry; uploaded once into vertex/index buffer bindings.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Axis-aligned cube with per-face normals.
pub fn cube_mesh(half_extents: [f32; 3], color: [f32; 4]) -> Mesh {
    let [hx, hy, hz] = half_extents;
    let v = |x: f32, y: f32, z: f32, n: [f32; 3]| Vertex {
        position: [x, y, z],
        normal: n,
        color,
    };
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        v(-hx, -hy,  hz, [0.0, 0.0, 1.0]),
        v( hx, -hy,  hz, [0.0, 0.0, 1.0]),
        v( hx,  hy,  hz, [0.0, 0.0, 1.0]),
        v(-hx,  hy,  hz, [0.0, 0.0, 1.0]),
        // -Z face
        v( hx, -hy, -hz, [0.0, 0.0, -1.0]),
        v(-hx, -hy, -hz, [0.0, 0.0, -1.0]),
        v(-hx,  hy, -hz, [0.0, 0.0, -1.0]),
        v( hx,  hy, -hz, [0.0, 0.0, -1.0]),
        // +X face
        v( hx, -hy,  hz, [1.0, 0.0, 0.0]),
        v( hx, -hy, -hz, [1.0, 0.0, 0.0]),
        v( hx,  hy, -hz, [1.0, 0.0, 0.0]),
        v( hx,  hy,  hz, [1.0, 0.0, 0.0]),
        // -X face
        v(-hx, -hy, -hz, [-1.0, 0.0, 0.0]),
        v(-hx, -hy,  hz, [-1.0, 0.0, 0.0]),
        v(-hx,  hy,  hz, [-1.0, 0.0, 0.0]),
        v(-hx,  hy, -hz, [-1.0, 0.0, 0.0]),
        // +Y face
        v(-hx,  hy,  hz, [0.0, 1.0, 0.0]),
        v( hx,  hy,  hz, [0.0, 1.0, 0.0]),
        v( hx,  hy, -hz, [0.0, 1.0, 0.0]),
        v(-hx,  hy, -hz, [0.0, 1.0, 0.0]),
        // -Y face
        v(-hx, -hy, -hz, [0.0, -1.0, 0.0]),
        v( hx, -hy, -hz, [0.0, -1.0, 0.0]),
        v( hx, -hy,  hz, [0.0, -1.0, 0.0]),
        v(-hx, -hy,  hz, [0.0, -1.0, 0.0]),
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    Mesh { vertices, indices }
}

/// UV sphere used for projectiles.
pub fn sphere_mesh(radius: f32, stacks: u16, sectors: u16, color: [f32; 4]) -> Mesh {
    assert!(stacks >= 2 && sectors >= 3, "degenerate sphere resolution");
    let rows = u32::from(stacks) + 1;
    let cols = u32::from(sectors) + 1;
    assert!(
        rows * cols <= u32::from(u16::MAX) + 1,
        "sphere resolution exceeds 16-bit indices"
    );
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=stacks {
        let phi = std::f32::consts::PI * i as f32 / stacks as f32;
        let y = phi.cos();
        let ring = phi.sin();
        for j in 0..=sectors {
            let theta = std::f32::consts::TAU * j as f32 / sectors as f32;
            let n = [ring * theta.cos(), y, ring * theta.sin()];
            vertices.push(Vertex {
                position: [n[0] * radius, n[1] * radius, n[2] * radius],
                normal: n,
                color,
            });
        }
    }

    // Index math in u32; u16 arithmetic could wrap before the capacity
    // check above would matter.
    for i in 0..u32::from(stacks) {
        for j in 0..u32::from(sectors) {
            let a = i * cols + j;
            let b = a + cols;
            // Two CCW triangles per quad; the poles produce degenerate
            // triangles that rasterize to nothing.
            indices.extend_from_slice(&[a as u16, (a + 1) as u16, b as u16]);
            indices.extend_from_slice(&[(a + 1) as u16, (b + 1) as u16, b as u16]);
        }
    }

    Mesh { vertices, indices }
}

/// Inward-facing unit cube for the skybox. Normals point to the center so
/// the sky shader can use the vertex position as a view direction.
pub fn sky_cube_mesh() -> Mesh {
    let mut mesh = cube_mesh([1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
    // Flip the winding so the interior faces survive back-face culling.
    for tri in mesh.indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
    for v in &mut mesh.vertices {
        v.normal = [-v.normal[0], -v.normal[1], -v.normal[2]];
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_36_indices() {
        let mesh = cube_mesh([0.5, 0.5, 0.5], [1.0; 4]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(mesh.indices.iter().all(|i| (*i as usize) < 24));
    }

    #[test]
    fn cube_normals_are_unit_axes() {
        let mesh = cube_mesh([2.0, 1.0, 3.0], [1.0; 4]);
        for v in &mesh.vertices {
            let len: f32 = v.normal.iter().map(|c| c * c).sum();
            assert!((len - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sphere_indices_in_bounds() {
        let mesh = sphere_mesh(0.4, 8, 12, [1.0; 4]);
        let n = mesh.vertices.len();
        assert!(mesh.indices.iter().all(|i| (*i as usize) < n));
        assert_eq!(mesh.index_count() % 3, 0);
    }

    #[test]
    fn dense_sphere_indices_stay_in_bounds() {
        // Close to the 16-bit vertex capacity limit.
        let mesh = sphere_mesh(0.5, 200, 250, [1.0; 4]);
        let n = mesh.vertices.len();
        assert!(mesh.indices.iter().all(|i| (*i as usize) < n));
    }

    #[test]
    #[should_panic(expected = "exceeds 16-bit indices")]
    fn oversized_sphere_panics() {
        sphere_mesh(0.5, 300, 300, [1.0; 4]);
    }

    #[test]
    fn sphere_vertices_on_radius() {
        let mesh = sphere_mesh(2.0, 6, 8, [1.0; 4]);
        for v in &mesh.vertices {
            let len: f32 = v.position.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((len - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sky_cube_winding_is_flipped() {
        let cube = cube_mesh([1.0, 1.0, 1.0], [1.0; 4]);
        let sky = sky_cube_mesh();
        assert_eq!(sky.indices.len(), cube.indices.len());
        assert_eq!(sky.indices[0], cube.indices[0]);
        assert_eq!(sky.indices[1], cube.indices[2]);
        assert_eq!(sky.indices[2], cube.indices[1]);
    }
}
