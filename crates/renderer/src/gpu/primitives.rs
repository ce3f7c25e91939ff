//! CPU-side mesh generation for the selectable primitives.
//!
//! Proportions follow three.js defaults: unit sphere (32x16), 2x2x2 box, unit
//! dodecahedron and icosahedron, 2x2 plane and a torus knot of radius 1.

use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use hotswap::GeometryKind;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn for_kind(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Sphere => sphere(1.0, 32, 16),
            GeometryKind::Cube => cube(2.0),
            GeometryKind::Dodecahedron => dodecahedron(1.0),
            GeometryKind::Icosahedron => icosahedron(1.0),
            GeometryKind::Plane => plane(2.0, 2.0),
            GeometryKind::TorusKnot => torus_knot(1.0, 0.4, 64, 8, 2.0, 3.0),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unique triangle edges as a line list.
    pub fn wire_indices(&self) -> Vec<u32> {
        let mut edges = BTreeSet::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
    }
}

pub(crate) fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let theta = v * PI;
            let phi = u * TAU;
            let position = Vec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = position.normalize_or_zero();
            row.push(mesh.vertices.len() as u32);
            mesh.vertices
                .push(Vertex::new(position, normal, Vec2::new(u, 1.0 - v)));
        }
        grid.push(row);
    }
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.indices.extend([a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                mesh.indices.extend([b, c, d]);
            }
        }
    }
    mesh
}

pub(crate) fn cube(size: f32) -> MeshData {
    let half = size * 0.5;
    let faces = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z),
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::X),
    ];
    let mut mesh = MeshData::default();
    for (normal, u_axis) in faces {
        let v_axis = normal.cross(u_axis);
        push_quad(&mut mesh, normal * half, u_axis * half, v_axis * half, normal);
    }
    mesh
}

pub(crate) fn plane(width: f32, height: f32) -> MeshData {
    let mut mesh = MeshData::default();
    push_quad(
        &mut mesh,
        Vec3::ZERO,
        Vec3::X * width * 0.5,
        Vec3::Y * height * 0.5,
        Vec3::Z,
    );
    mesh
}

/// Quad centred on `center`; `u × v` must point along `normal` for CCW winding.
fn push_quad(mesh: &mut MeshData, center: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
    let base = mesh.vertices.len() as u32;
    let corners = [
        (center - u - v, Vec2::new(0.0, 0.0)),
        (center + u - v, Vec2::new(1.0, 0.0)),
        (center + u + v, Vec2::new(1.0, 1.0)),
        (center - u + v, Vec2::new(0.0, 1.0)),
    ];
    for (position, uv) in corners {
        mesh.vertices.push(Vertex::new(position, normal, uv));
    }
    mesh.indices
        .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_vertices(radius: f32) -> Vec<Vec3> {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize() * radius)
    .collect()
}

pub(crate) fn icosahedron(radius: f32) -> MeshData {
    let corners = icosahedron_vertices(radius);
    let mut mesh = MeshData::default();
    for face in ICOSAHEDRON_FACES {
        push_flat_polygon(&mut mesh, &[corners[face[0]], corners[face[1]], corners[face[2]]]);
    }
    mesh
}

/// Built as the dual of the icosahedron: one pentagon per icosahedron corner.
pub(crate) fn dodecahedron(radius: f32) -> MeshData {
    let corners = icosahedron_vertices(1.0);
    let centroids: Vec<Vec3> = ICOSAHEDRON_FACES
        .iter()
        .map(|face| {
            ((corners[face[0]] + corners[face[1]] + corners[face[2]]) / 3.0).normalize() * radius
        })
        .collect();

    let mut mesh = MeshData::default();
    for (corner_index, corner) in corners.iter().enumerate() {
        let axis = corner.normalize();
        let mut ring: Vec<Vec3> = ICOSAHEDRON_FACES
            .iter()
            .zip(&centroids)
            .filter(|(face, _)| face.contains(&corner_index))
            .map(|(_, centroid)| *centroid)
            .collect();
        let reference = (ring[0] - axis * ring[0].dot(axis)).normalize();
        let side = axis.cross(reference);
        ring.sort_by(|a, b| {
            let angle_a = a.dot(side).atan2(a.dot(reference));
            let angle_b = b.dot(side).atan2(b.dot(reference));
            angle_a.total_cmp(&angle_b)
        });
        push_flat_polygon(&mut mesh, &ring);
    }
    mesh
}

/// Fan-triangulates a convex polygon with one outward face normal.
fn push_flat_polygon(mesh: &mut MeshData, points: &[Vec3]) {
    let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    let mut normal = (points[1] - points[0])
        .cross(points[2] - points[0])
        .normalize_or_zero();
    let outward = normal.dot(centroid) >= 0.0;
    if !outward {
        normal = -normal;
    }

    let base = mesh.vertices.len() as u32;
    let reference = (points[0] - centroid).normalize_or_zero();
    let side = normal.cross(reference);
    for point in points {
        let offset = *point - centroid;
        let uv = Vec2::new(offset.dot(reference), offset.dot(side)) * 0.5 + Vec2::splat(0.5);
        mesh.vertices.push(Vertex::new(*point, normal, uv));
    }
    for k in 1..points.len() as u32 - 1 {
        if outward {
            mesh.indices.extend([base, base + k, base + k + 1]);
        } else {
            mesh.indices.extend([base, base + k + 1, base + k]);
        }
    }
}

pub(crate) fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: f32,
    q: f32,
) -> MeshData {
    let curve = |u: f32| {
        let quotient = q / p * u;
        let cs = quotient.cos();
        Vec3::new(
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * u.sin() * 0.5,
            radius * quotient.sin() * 0.5,
        )
    };

    let mut mesh = MeshData::default();
    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * p * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);
        let tangent = p2 - p1;
        let mut normal = p2 + p1;
        let binormal = tangent.cross(normal).normalize();
        normal = binormal.cross(tangent).normalize();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let position = p1 + normal * cx + binormal * cy;
            let surface_normal = (position - p1).normalize_or_zero();
            mesh.vertices.push(Vertex::new(
                position,
                surface_normal,
                Vec2::new(
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ),
            ));
        }
    }

    let stride = radial_segments + 1;
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            mesh.indices.extend([a, b, d, b, c, d]);
        }
    }
    mesh
}
