use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::mesh::TriangleMesh;
use crate::triangulate::Triangulator;

/// GPU ready mesh buffers produced from an OBJ file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 6
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Parses an OBJ file from memory and returns interleaved vertex/index arrays.
///
/// Vertices are laid out as `position.xyz` followed by `normal.xyz`. Faces
/// with more than three corners are ear clipped with the default
/// [`Triangulator`].
pub fn load_obj_from_str(data: &str) -> Result<ObjMesh> {
    load_obj_with(data, &Triangulator::default())
}

/// [`load_obj_from_str`] with an explicit triangulator configuration.
pub fn load_obj_with(data: &str, triangulator: &Triangulator) -> Result<ObjMesh> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut polygons: Vec<(usize, Vec<FaceIndex>)> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "f" => polygons.push((
                line_no + 1,
                parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?,
            )),
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();
    for (line, polygon) in &polygons {
        triangulate_face(polygon, &positions, triangulator, &mut faces)
            .with_context(|| format!("invalid face on line {line}"))?;
    }

    let mut mesh = build_mesh(&positions, &normals, &faces)?;
    if needs_normals(&mesh.vertices) {
        compute_normals(&mut mesh);
    }
    Ok(mesh)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    let x = component()?;
    let y = component()?;
    let z = component()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let _texture = segments.next();
        let vn = match segments.next() {
            Some(s) if !s.is_empty() => s.parse::<i32>()?,
            _ => 0,
        };
        indices.push(FaceIndex { v, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

/// Splits a face into triangles. Faces whose outline is degenerate fall
/// back to a fan so no geometry is dropped.
fn triangulate_face(
    polygon: &[FaceIndex],
    positions: &[Vec3],
    triangulator: &Triangulator,
    faces: &mut Vec<[FaceIndex; 3]>,
) -> Result<()> {
    if polygon.len() == 3 {
        faces.push([polygon[0], polygon[1], polygon[2]]);
        return Ok(());
    }

    let contour = polygon
        .iter()
        .map(|corner| {
            fix_index(corner.v, positions.len())
                .map(|i| positions[i])
                .ok_or_else(|| anyhow!("invalid vertex index {}", corner.v))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut scratch = TriangleMesh::new();
    match triangulator.triangulate(&contour, &mut scratch) {
        Ok(_) => {
            for triangle in scratch.triangles() {
                let [a, b, c] = triangle.indices();
                faces.push([polygon[a], polygon[b], polygon[c]]);
            }
        }
        Err(err) => {
            warn!("{err}; splitting {}-gon as a fan", polygon.len());
            for i in 1..(polygon.len() - 1) {
                faces.push([polygon[0], polygon[i], polygon[i + 1]]);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vn: i32,
}

fn build_mesh(positions: &[Vec3], normals: &[Vec3], faces: &[[FaceIndex; 3]]) -> Result<ObjMesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let pos_index =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let normal_index = fix_index(idx.vn, normals.len());
            let key = Key {
                position: pos_index,
                normal: normal_index,
            };
            let next_index = (vertices.len() / 6) as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                let position = positions[pos_index];
                vertices.extend_from_slice(&[position.x, position.y, position.z]);
                let normal = normal_index.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                vertices.extend_from_slice(&[normal.x, normal.y, normal.z]);
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(ObjMesh { vertices, indices })
}

/// Resolves a 1-based (or negative, relative) OBJ index.
fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[f32]) -> bool {
    vertices
        .chunks_exact(6)
        .any(|chunk| chunk[3] == 0.0 && chunk[4] == 0.0 && chunk[5] == 0.0)
}

fn compute_normals(mesh: &mut ObjMesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertex_count()];

    for triangle in mesh.indices.chunks_exact(3) {
        let corners = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let [p0, p1, p2] = corners.map(|i| Vec3::from_slice(&mesh.vertices[i * 6..i * 6 + 3]));
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            for i in corners {
                accum[i] += normal;
            }
        }
    }

    for (i, normal) in accum.into_iter().enumerate() {
        let normal = normal.normalize_or_zero();
        mesh.vertices[i * 6 + 3..i * 6 + 6].copy_from_slice(&normal.to_array());
    }
}
