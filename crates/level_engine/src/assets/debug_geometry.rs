//! Editor debug geometry
//!
//! Line-list wireframes appended to the vertex region once at level creation.
//! Every generator emits unit-sized geometry around the origin; the editor
//! scales and places it per draw through push constants. Vertices are bare
//! positions, 12-byte stride.

use std::f32::consts::TAU;

/// Line segments per generated circle
pub const CIRCLE_SEGMENTS: u32 = 32;

fn push_line(vertices: &mut Vec<[f32; 3]>, a: [f32; 3], b: [f32; 3]) {
    vertices.push(a);
    vertices.push(b);
}

fn push_circle<F>(vertices: &mut Vec<[f32; 3]>, radius: f32, point: F)
where
    F: Fn(f32, f32) -> [f32; 3],
{
    for segment in 0..CIRCLE_SEGMENTS {
        let a0 = segment as f32 / CIRCLE_SEGMENTS as f32 * TAU;
        let a1 = (segment + 1) as f32 / CIRCLE_SEGMENTS as f32 * TAU;
        push_line(
            vertices,
            point(radius * a0.cos(), radius * a0.sin()),
            point(radius * a1.cos(), radius * a1.sin()),
        );
    }
}

/// Wireframe unit cube spanning [-1, 1] on each axis.
pub fn bound_box_vertices() -> Vec<[f32; 3]> {
    let corner = |x: u32, y: u32, z: u32| {
        [
            if x == 0 { -1.0 } else { 1.0 },
            if y == 0 { -1.0 } else { 1.0 },
            if z == 0 { -1.0 } else { 1.0 },
        ]
    };
    let mut vertices = Vec::with_capacity(24);
    for a in 0..2 {
        for b in 0..2 {
            push_line(&mut vertices, corner(0, a, b), corner(1, a, b));
            push_line(&mut vertices, corner(a, 0, b), corner(a, 1, b));
            push_line(&mut vertices, corner(a, b, 0), corner(a, b, 1));
        }
    }
    vertices
}

/// Wireframe unit sphere: three great circles, one per axis plane.
pub fn sphere_vertices() -> Vec<[f32; 3]> {
    let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 6);
    push_circle(&mut vertices, 1.0, |u, v| [u, v, 0.0]);
    push_circle(&mut vertices, 1.0, |u, v| [u, 0.0, v]);
    push_circle(&mut vertices, 1.0, |u, v| [0.0, u, v]);
    vertices
}

/// Wireframe unit cylinder along the Y axis: caps at y = ±1 plus four struts.
pub fn cylinder_vertices() -> Vec<[f32; 3]> {
    let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 4 + 8);
    push_circle(&mut vertices, 1.0, |u, v| [u, 1.0, v]);
    push_circle(&mut vertices, 1.0, |u, v| [u, -1.0, v]);
    for segment in 0..4 {
        let angle = segment as f32 / 4.0 * TAU;
        let (x, z) = (angle.cos(), angle.sin());
        push_line(&mut vertices, [x, -1.0, z], [x, 1.0, z]);
    }
    vertices
}

/// Flat ring in the XZ plane: concentric unit and 0.8-radius circles.
pub fn hollow_circle_vertices() -> Vec<[f32; 3]> {
    let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 4);
    push_circle(&mut vertices, 1.0, |u, v| [u, 0.0, v]);
    push_circle(&mut vertices, 0.8, |u, v| [u, 0.0, v]);
    vertices
}

/// Wireframe torus around the Y axis: major radius 1, tube radius 0.25,
/// drawn as inner/outer/top rings plus eight tube cross sections.
pub fn torus_vertices() -> Vec<[f32; 3]> {
    const TUBE: f32 = 0.25;
    let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 22);
    push_circle(&mut vertices, 1.0 + TUBE, |u, v| [u, 0.0, v]);
    push_circle(&mut vertices, 1.0 - TUBE, |u, v| [u, 0.0, v]);
    push_circle(&mut vertices, 1.0, |u, v| [u, TUBE, v]);
    push_circle(&mut vertices, 1.0, |u, v| [u, -TUBE, v]);
    for section in 0..8 {
        let angle = section as f32 / 8.0 * TAU;
        let (dx, dz) = (angle.cos(), angle.sin());
        push_circle(&mut vertices, TUBE, |u, v| {
            [(1.0 + u) * dx, v, (1.0 + u) * dz]
        });
    }
    vertices
}
