//! # Primitive Shape Generation
//!
//! This module contains functions to generate common 3D primitive shapes.
//! All shapes are generated with proper normals and texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate an axis-aligned box centered at the origin
///
/// Each face has its own four vertices so normals stay flat, and UVs span
/// the full 0..1 range on every face.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let half = [width * 0.5, height * 0.5, depth * 0.5];

    // (normal, right, up) with right x up == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    // Corner order is counter-clockwise seen from outside
    let corners: [(f32, f32, [f32; 2]); 4] = [
        (-1.0, -1.0, [0.0, 1.0]),
        (1.0, -1.0, [1.0, 1.0]),
        (1.0, 1.0, [1.0, 0.0]),
        (-1.0, 1.0, [0.0, 0.0]),
    ];

    for (normal, right, up) in faces.iter() {
        let base = data.vertices.len() as u32;
        for (sr, su, uv) in corners.iter() {
            let mut position = [0.0; 3];
            for axis in 0..3 {
                position[axis] = (normal[axis] + right[axis] * sr + up[axis] * su) * half[axis];
            }
            data.vertices.push(position);
            data.normals.push(*normal);
            data.tex_coords.push(*uv);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    data
}

/// Generate a unit cube centered at the origin
pub fn generate_cube() -> GeometryData {
    generate_box(1.0, 1.0, 1.0)
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `width_segments` - Number of segments around the equator
/// * `height_segments` - Number of segments from pole to pole
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(3);
    let h_segs = height_segments.max(2);

    for iy in 0..=h_segs {
        let v = iy as f32 / h_segs as f32;
        let theta = v * PI;

        for ix in 0..=w_segs {
            let u = ix as f32 / w_segs as f32;
            let phi = u * 2.0 * PI;

            let nx = -phi.cos() * theta.sin();
            let ny = theta.cos();
            let nz = phi.sin() * theta.sin();

            data.vertices.push([radius * nx, radius * ny, radius * nz]);
            data.normals.push([nx, ny, nz]);
            data.tex_coords.push([u, v]);
        }
    }

    let row = w_segs + 1;
    for iy in 0..h_segs {
        for ix in 0..w_segs {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // Skip the degenerate triangle touching each pole
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h_segs - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    data
}

/// Generate a plane in the XY plane
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Returns a plane centered at the origin with its normal along +Z. Rotate
/// it by -90 degrees about X to lay it on the ground.
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for iy in 0..=h_segs {
        let v = iy as f32 / h_segs as f32;
        let pos_y = (0.5 - v) * height;

        for ix in 0..=w_segs {
            let u = ix as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, v]);
        }
    }

    let row = w_segs + 1;
    for iy in 0..h_segs {
        for ix in 0..w_segs {
            let a = iy * row + ix;
            let b = (iy + 1) * row + ix;
            let c = (iy + 1) * row + ix + 1;
            let d = iy * row + ix + 1;

            data.indices.extend_from_slice(&[a, b, d]);
            data.indices.extend_from_slice(&[b, c, d]);
        }
    }

    data
}

/// Generate a torus lying in the XY plane
///
/// # Arguments
/// * `radius` - Distance from the center to the middle of the tube
/// * `tube` - Tube radius
/// * `radial_segments` - Segments around the tube
/// * `tubular_segments` - Segments around the ring
pub fn generate_torus(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let r_segs = radial_segments.max(3);
    let t_segs = tubular_segments.max(3);

    for j in 0..=r_segs {
        let v = j as f32 / r_segs as f32 * 2.0 * PI;

        for i in 0..=t_segs {
            let u = i as f32 / t_segs as f32 * 2.0 * PI;

            let x = (radius + tube * v.cos()) * u.cos();
            let y = (radius + tube * v.cos()) * u.sin();
            let z = tube * v.sin();

            let center = [radius * u.cos(), radius * u.sin(), 0.0];
            let n = [x - center[0], y - center[1], z - center[2]];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt().max(f32::EPSILON);

            data.vertices.push([x, y, z]);
            data.normals.push([n[0] / len, n[1] / len, n[2] / len]);
            data.tex_coords.push([
                i as f32 / t_segs as f32,
                1.0 - j as f32 / r_segs as f32,
            ]);
        }
    }

    let row = t_segs + 1;
    for j in 1..=r_segs {
        for i in 1..=t_segs {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;

            data.indices.extend_from_slice(&[a, b, d]);
            data.indices.extend_from_slice(&[b, c, d]);
        }
    }

    data
}

/// Generate a closed cone pointing up the Y axis
///
/// # Arguments
/// * `radius` - Radius of the base
/// * `height` - Height from base to apex, centered on the origin
/// * `radial_segments` - Number of segments around the base
pub fn generate_cone(radius: f32, height: f32, radial_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = if height > 0.0 { radius / height } else { 0.0 };

    // Side: row 0 is the apex ring, row 1 the base ring
    for y in 0..=1u32 {
        let v = y as f32;
        let ring_radius = v * radius;

        for x in 0..=segs {
            let u = x as f32 / segs as f32;
            let theta = u * 2.0 * PI;
            let (sin_t, cos_t) = theta.sin_cos();

            data.vertices.push([
                ring_radius * sin_t,
                -v * height + half_height,
                ring_radius * cos_t,
            ]);

            let n = [sin_t, slope, cos_t];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            data.normals.push([n[0] / len, n[1] / len, n[2] / len]);
            data.tex_coords.push([u, v]);
        }
    }

    let row = segs + 1;
    for x in 0..segs {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;

        data.indices.extend_from_slice(&[a, b, d]);
        data.indices.extend_from_slice(&[b, c, d]);
    }

    // Base cap: one center vertex per segment, then the rim
    let center_start = data.vertices.len() as u32;
    for x in 1..=segs {
        let u = (x as f32 - 0.5) / segs as f32;
        data.vertices.push([0.0, -half_height, 0.0]);
        data.normals.push([0.0, -1.0, 0.0]);
        data.tex_coords.push([u, 1.0]);
    }

    let rim_start = data.vertices.len() as u32;
    for x in 0..=segs {
        let theta = x as f32 / segs as f32 * 2.0 * PI;
        let (sin_t, cos_t) = theta.sin_cos();
        data.vertices.push([radius * sin_t, -half_height, radius * cos_t]);
        data.normals.push([0.0, -1.0, 0.0]);
        data.tex_coords.push([cos_t * 0.5 + 0.5, sin_t * 0.5 + 0.5]);
    }

    for x in 0..segs {
        let c = center_start + x;
        let i = rim_start + x;
        data.indices.extend_from_slice(&[i + 1, i, c]);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(data: &GeometryData, tri: usize) -> [f32; 3] {
        let v = |k: usize| data.vertices[data.indices[tri * 3 + k] as usize];
        let (a, b, c) = (v(0), v(1), v(2));
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_box_extents_and_winding() {
        let b = generate_box(0.5, 0.5, 0.5);
        for v in &b.vertices {
            for c in v {
                assert!((c.abs() - 0.25).abs() < 1e-6);
            }
        }
        for tri in 0..b.triangle_count() {
            let n = b.normals[b.indices[tri * 3] as usize];
            assert!(dot(face_normal(&b, tri), n) > 0.0, "triangle {} faces inward", tri);
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(0.25, 32, 32);
        assert_eq!(sphere.vertices.len(), 33 * 33);
        // Pole rows contribute one triangle per segment instead of two
        assert_eq!(sphere.triangle_count(), 32 * 32 * 2 - 2 * 32);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
        for v in &sphere.vertices {
            let r = dot(*v, *v).sqrt();
            assert!((r - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_faces_outward() {
        let sphere = generate_sphere(1.0, 8, 6);
        for tri in 0..sphere.triangle_count() {
            let centroid = (0..3).fold([0.0f32; 3], |acc, k| {
                let v = sphere.vertices[sphere.indices[tri * 3 + k] as usize];
                [acc[0] + v[0], acc[1] + v[1], acc[2] + v[2]]
            });
            assert!(dot(face_normal(&sphere, tri), centroid) > 0.0);
        }
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        for tri in 0..plane.triangle_count() {
            assert!(face_normal(&plane, tri)[2] > 0.0);
        }
    }

    #[test]
    fn test_torus_generation() {
        let torus = generate_torus(0.3, 0.1, 10, 100);
        assert_eq!(torus.vertices.len(), 11 * 101);
        assert_eq!(torus.indices.len(), 10 * 100 * 6);
        for v in &torus.vertices {
            let ring = (v[0] * v[0] + v[1] * v[1]).sqrt();
            let tube = ((ring - 0.3).powi(2) + v[2] * v[2]).sqrt();
            assert!((tube - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cone_generation() {
        let cone = generate_cone(0.012, 0.001, 7);
        // 2 side rings of 8, 7 cap centers, 8 rim vertices
        assert_eq!(cone.vertex_count(), 16 + 7 + 8);
        assert_eq!(cone.triangle_count(), 7 * 2 + 7);
        let max_y = cone.vertices.iter().map(|v| v[1]).fold(f32::MIN, f32::max);
        let min_y = cone.vertices.iter().map(|v| v[1]).fold(f32::MAX, f32::min);
        assert!((max_y - 0.0005).abs() < 1e-7);
        assert!((min_y + 0.0005).abs() < 1e-7);
    }
}
