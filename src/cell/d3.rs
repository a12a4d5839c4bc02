use crate::bounds::BoundingBox;
use crate::cell::{Cell, vertex_bounds, vertex_mean};

const EPS: f64 = 1e-9;

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone)]
pub struct Cell3DScratch {
    vertices: Vec<f64>,
    face_counts: Vec<u8>,
    face_indices: Vec<u16>,
    dists: Vec<f64>,
    is_intersection: Vec<bool>,
    old_to_new: Vec<Option<u16>>,
    intersection_map: Vec<(u32, u16)>,
    lid_segments: Vec<(u16, u16)>,
    face_buffer: Vec<u16>,
    lid_buffer: Vec<u16>,
    lid_map: Vec<u16>,
}

/// A 3D Voronoi cell stored as a convex polyhedron with explicit faces.
#[derive(Clone, Debug)]
pub struct Cell3D {
    // Flat array of vertices [x, y, z, x, y, z, ...]
    vertices: Vec<f64>,
    // Number of vertices for each face
    face_counts: Vec<u8>,
    // Flattened indices for all faces
    face_indices: Vec<u16>,
}

impl Cell3D {
    pub fn new(bounds: BoundingBox<3>) -> Cell3D {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        let vertices: Vec<f64> = vec![
            x0, y0, z0, // 0
            x1, y0, z0, // 1
            x1, y1, z0, // 2
            x0, y1, z0, // 3
            x0, y0, z1, // 4
            x1, y0, z1, // 5
            x1, y1, z1, // 6
            x0, y1, z1, // 7
        ];

        let face_indices: Vec<u16> = vec![
            3, 2, 1, 0, // z-
            4, 5, 6, 7, // z+
            0, 1, 5, 4, // y-
            2, 3, 7, 6, // y+
            0, 4, 7, 3, // x-
            1, 2, 6, 5, // x+
        ];

        Cell3D {
            vertices,
            face_counts: vec![4; 6],
            face_indices,
        }
    }

    fn vertex(&self, i: usize) -> [f64; 3] {
        [self.vertices[i * 3], self.vertices[i * 3 + 1], self.vertices[i * 3 + 2]]
    }

    pub fn volume(&self) -> f64 {
        let mut volume: f64 = 0.0;
        let mut index_offset: usize = 0;

        for &count in &self.face_counts {
            let count = count as usize;
            if count >= 3 {
                // Fan triangulation around the first vertex of the face
                let v0 = self.vertex(self.face_indices[index_offset] as usize);
                for i in 1..count - 1 {
                    let v1 = self.vertex(self.face_indices[index_offset + i] as usize);
                    let v2 = self.vertex(self.face_indices[index_offset + i + 1] as usize);
                    volume += dot(v0, cross(v1, v2));
                }
            }
            index_offset += count;
        }

        (volume / 6.0).abs()
    }

    /// Returns the index of the vertex where edge `(idx_s, idx_e)` crosses the
    /// clipping plane, creating it on first use.
    fn edge_intersection(
        &self,
        idx_s: usize,
        idx_e: usize,
        scratch: &mut Cell3DScratch,
        generator: Option<&[f64; 3]>,
        max_d2: &mut f64,
    ) -> u16 {
        let key = if idx_s < idx_e {
            (idx_s as u32) << 16 | (idx_e as u32)
        } else {
            (idx_e as u32) << 16 | (idx_s as u32)
        };
        if let Some(&(_, id)) = scratch.intersection_map.iter().find(|&&(k, _)| k == key) {
            return id;
        }

        let d_s = scratch.dists[idx_s];
        let d_e = scratch.dists[idx_e];
        let t = (d_s / (d_s - d_e)).clamp(0.0, 1.0);
        let a = self.vertex(idx_s);
        let b = self.vertex(idx_e);
        let new_idx = (scratch.vertices.len() / 3) as u16;
        let v = [
            a[0] + t * (b[0] - a[0]),
            a[1] + t * (b[1] - a[1]),
            a[2] + t * (b[2] - a[2]),
        ];
        scratch.vertices.extend_from_slice(&v);
        if let Some(g) = generator {
            *max_d2 = max_d2.max(dist_sq(v, *g));
        }

        scratch.is_intersection.push(true);
        scratch.intersection_map.push((key, new_idx));
        new_idx
    }

    fn clip_with_scratch(
        &mut self,
        point: &[f64; 3],
        normal: &[f64; 3],
        scratch: &mut Cell3DScratch,
        generator: Option<&[f64; 3]>,
    ) -> (bool, f64) {
        let num_verts = self.vertices.len() / 3;
        scratch.dists.clear();
        scratch.dists.reserve(num_verts);
        let mut all_inside = true;
        let mut all_outside = true;

        // 1. Signed distances to the plane
        for i in 0..num_verts {
            let v = self.vertex(i);
            let d = (v[0] - point[0]) * normal[0] + (v[1] - point[1]) * normal[1] + (v[2] - point[2]) * normal[2];
            scratch.dists.push(d);

            if d > EPS {
                all_inside = false;
            } else if d < -EPS {
                all_outside = false;
            }
        }

        if all_inside {
            return (false, 0.0);
        }
        if all_outside {
            self.vertices.clear();
            self.face_counts.clear();
            self.face_indices.clear();
            return (true, 0.0);
        }

        // 2. Reset scratch structures
        scratch.vertices.clear();
        scratch.face_counts.clear();
        scratch.face_indices.clear();
        scratch.is_intersection.clear();
        scratch.old_to_new.clear();
        scratch.old_to_new.resize(num_verts, None);
        scratch.intersection_map.clear();
        scratch.lid_segments.clear();
        scratch.lid_map.clear();

        let mut max_d2: f64 = 0.0;

        // Keep existing vertices that are inside
        for i in 0..num_verts {
            if scratch.dists[i] <= EPS {
                let v = self.vertex(i);
                scratch.old_to_new[i] = Some((scratch.vertices.len() / 3) as u16);
                scratch.vertices.extend_from_slice(&v);
                scratch.is_intersection.push(false);
                if let Some(g) = generator {
                    max_d2 = max_d2.max(dist_sq(v, *g));
                }
            }
        }

        // 3. Clip each face
        let mut index_offset = 0;
        for &count in &self.face_counts {
            let count = count as usize;
            let face = &self.face_indices[index_offset..index_offset + count];
            index_offset += count;

            scratch.face_buffer.clear();

            for i in 0..count {
                let idx_s = face[i] as usize;
                let idx_e = face[(i + 1) % count] as usize;
                let s_in = scratch.dists[idx_s] <= EPS;
                let e_in = scratch.dists[idx_e] <= EPS;

                if s_in && e_in {
                    if let Some(idx) = scratch.old_to_new[idx_e] {
                        scratch.face_buffer.push(idx);
                    }
                } else if s_in {
                    let idx = self.edge_intersection(idx_s, idx_e, scratch, generator, &mut max_d2);
                    scratch.face_buffer.push(idx);
                } else if e_in {
                    let idx = self.edge_intersection(idx_s, idx_e, scratch, generator, &mut max_d2);
                    scratch.face_buffer.push(idx);
                    if let Some(idx) = scratch.old_to_new[idx_e] {
                        scratch.face_buffer.push(idx);
                    }
                }
            }

            if scratch.face_buffer.len() >= 3 {
                scratch.face_counts.push(scratch.face_buffer.len() as u8);

                // Segments on the clipping plane connect two intersection points
                let n = scratch.face_buffer.len();
                for i in 0..n {
                    let u = scratch.face_buffer[i];
                    let v = scratch.face_buffer[(i + 1) % n];
                    if scratch.is_intersection[u as usize] && scratch.is_intersection[v as usize] {
                        scratch.lid_segments.push((v, u)); // Reverse order for the lid face
                    }
                }
                scratch.face_indices.extend_from_slice(&scratch.face_buffer);
            }
        }

        // 4. Close the cell with the lid face lying on the clipping plane
        if !scratch.lid_segments.is_empty() {
            scratch.lid_buffer.clear();
            scratch.lid_map.resize(scratch.vertices.len() / 3, u16::MAX);
            for &(u, v) in &scratch.lid_segments {
                scratch.lid_map[u as usize] = v;
            }

            let (start, next) = scratch.lid_segments[0];
            scratch.lid_buffer.push(start);

            let mut current = next;
            while current != start && scratch.lid_buffer.len() <= scratch.lid_segments.len() {
                scratch.lid_buffer.push(current);
                current = scratch.lid_map[current as usize];
                if current == u16::MAX {
                    break;
                }
            }

            if scratch.lid_buffer.len() >= 3 {
                scratch.face_counts.push(scratch.lid_buffer.len() as u8);
                scratch.face_indices.extend_from_slice(&scratch.lid_buffer);
            }
        }

        std::mem::swap(&mut self.vertices, &mut scratch.vertices);
        std::mem::swap(&mut self.face_counts, &mut scratch.face_counts);
        std::mem::swap(&mut self.face_indices, &mut scratch.face_indices);

        (true, max_d2)
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dist_sq(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    dot(d, d)
}

impl Cell<3> for Cell3D {
    type Scratch = Cell3DScratch;

    #[inline]
    fn new(bounds: BoundingBox<3>) -> Self {
        Cell3D::new(bounds)
    }

    #[inline]
    fn clip(
        &mut self,
        point: &[f64; 3],
        normal: &[f64; 3],
        scratch: &mut Self::Scratch,
        generator: Option<&[f64; 3]>,
    ) -> (bool, f64) {
        self.clip_with_scratch(point, normal, scratch, generator)
    }

    fn max_radius_sq(&self, center: &[f64; 3]) -> f64 {
        (0..self.vertices.len() / 3)
            .map(|k| dist_sq(self.vertex(k), *center))
            .fold(0.0, f64::max)
    }

    fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn bounding_box(&self) -> Option<BoundingBox<3>> {
        vertex_bounds::<3>(&self.vertices)
    }

    fn contains(&self, point: &[f64; 3], tolerance: f64) -> bool {
        if self.face_counts.is_empty() {
            return false;
        }
        let inner = vertex_mean::<3>(&self.vertices);

        let mut offset = 0;
        for &count in &self.face_counts {
            let count = count as usize;
            let face = &self.face_indices[offset..offset + count];
            offset += count;
            if count < 3 {
                continue;
            }

            // Newell normal and centre of the face
            let mut normal = [0.0; 3];
            let mut center = [0.0; 3];
            for i in 0..count {
                let a = self.vertex(face[i] as usize);
                let b = self.vertex(face[(i + 1) % count] as usize);
                normal[0] += (a[1] - b[1]) * (a[2] + b[2]);
                normal[1] += (a[2] - b[2]) * (a[0] + b[0]);
                normal[2] += (a[0] - b[0]) * (a[1] + b[1]);
                for d in 0..3 {
                    center[d] += a[d] / count as f64;
                }
            }
            let len = dot(normal, normal).sqrt();
            if len < EPS {
                continue;
            }

            let offset_of = |p: [f64; 3]| {
                dot(normal, [p[0] - center[0], p[1] - center[1], p[2] - center[2]]) / len
            };
            let side = offset_of(inner).signum();
            if offset_of(*point) * side < -tolerance {
                return false;
            }
        }
        true
    }
}
