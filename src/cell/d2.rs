use crate::bounds::BoundingBox;
use crate::cell::{Cell, vertex_bounds, vertex_mean};

const EPS: f64 = 1e-9;

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone)]
pub struct Cell2DScratch {
    vertices: Vec<f64>,
    dists: Vec<f64>,
}

/// A 2D Voronoi cell represented as a convex polygon.
#[derive(Clone, Debug)]
pub struct Cell2D {
    // Flat array of vertices [x, y, x, y, ...], counter-clockwise
    vertices: Vec<f64>,
}

impl Cell2D {
    pub fn new(bounds: BoundingBox<2>) -> Cell2D {
        let vertices = vec![
            bounds.min[0], bounds.min[1], // 0: Bottom-Left
            bounds.max[0], bounds.min[1], // 1: Bottom-Right
            bounds.max[0], bounds.max[1], // 2: Top-Right
            bounds.min[0], bounds.max[1], // 3: Top-Left
        ];
        Cell2D { vertices }
    }

    pub fn area(&self) -> f64 {
        let n = self.vertices.len() / 2;
        if n < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let xi = self.vertices[i * 2];
            let yi = self.vertices[i * 2 + 1];
            let xj = self.vertices[j * 2];
            let yj = self.vertices[j * 2 + 1];
            area += xi * yj - xj * yi;
        }
        (area * 0.5).abs()
    }

    fn vertex(&self, i: usize) -> [f64; 2] {
        [self.vertices[i * 2], self.vertices[i * 2 + 1]]
    }

    fn clip_with_scratch(
        &mut self,
        point: &[f64; 2],
        normal: &[f64; 2],
        scratch: &mut Cell2DScratch,
        generator: Option<&[f64; 2]>,
    ) -> (bool, f64) {
        let num_verts = self.vertices.len() / 2;
        if num_verts < 3 {
            return (false, 0.0);
        }

        scratch.dists.clear();
        scratch.dists.reserve(num_verts);

        let mut all_inside = true;
        let mut all_outside = true;

        for i in 0..num_verts {
            let [vx, vy] = self.vertex(i);
            let d = (vx - point[0]) * normal[0] + (vy - point[1]) * normal[1];
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
            return (true, 0.0);
        }

        scratch.vertices.clear();
        let mut max_d2: f64 = 0.0;
        let mut push = |scratch: &mut Cell2DScratch, v: [f64; 2]| {
            scratch.vertices.extend_from_slice(&v);
            if let Some(g) = generator {
                let dx = v[0] - g[0];
                let dy = v[1] - g[1];
                max_d2 = max_d2.max(dx * dx + dy * dy);
            }
        };

        for i in 0..num_verts {
            let j = (i + 1) % num_verts;
            let d_i = scratch.dists[i];
            let d_j = scratch.dists[j];
            let v_i = self.vertex(i);
            let v_j = self.vertex(j);

            if d_i <= EPS {
                push(scratch, v_i);
                if d_j > EPS {
                    // Leaving: the edge after the intersection lies on the clipping line.
                    push(scratch, lerp(v_i, v_j, d_i / (d_i - d_j)));
                }
            } else if d_j <= EPS {
                // Entering
                push(scratch, lerp(v_i, v_j, d_i / (d_i - d_j)));
            }
        }

        std::mem::swap(&mut self.vertices, &mut scratch.vertices);
        (true, max_d2)
    }
}

fn lerp(a: [f64; 2], b: [f64; 2], t: f64) -> [f64; 2] {
    [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
}

impl Cell<2> for Cell2D {
    type Scratch = Cell2DScratch;

    fn new(bounds: BoundingBox<2>) -> Self {
        Cell2D::new(bounds)
    }

    fn clip(
        &mut self,
        point: &[f64; 2],
        normal: &[f64; 2],
        scratch: &mut Self::Scratch,
        generator: Option<&[f64; 2]>,
    ) -> (bool, f64) {
        self.clip_with_scratch(point, normal, scratch, generator)
    }

    fn max_radius_sq(&self, center: &[f64; 2]) -> f64 {
        self.vertices
            .chunks_exact(2)
            .map(|v| {
                let dx = v[0] - center[0];
                let dy = v[1] - center[1];
                dx * dx + dy * dy
            })
            .fold(0.0, f64::max)
    }

    fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn bounding_box(&self) -> Option<BoundingBox<2>> {
        vertex_bounds::<2>(&self.vertices)
    }

    fn contains(&self, point: &[f64; 2], tolerance: f64) -> bool {
        let n = self.vertices.len() / 2;
        if n < 3 {
            return false;
        }
        let inner = vertex_mean::<2>(&self.vertices);

        for i in 0..n {
            let a = self.vertex(i);
            let b = self.vertex((i + 1) % n);
            let ex = b[0] - a[0];
            let ey = b[1] - a[1];
            let len = (ex * ex + ey * ey).sqrt();
            if len < EPS {
                continue;
            }
            // Signed distances to the edge line; the interior side is where the mean lies.
            let side = (ex * (inner[1] - a[1]) - ey * (inner[0] - a[0])).signum();
            let dist = (ex * (point[1] - a[1]) - ey * (point[0] - a[0])) / len;
            if dist * side < -tolerance {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell2d_box() {
        let bounds = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
        let cell = Cell2D::new(bounds);

        assert!((cell.area() - 1.0).abs() < 1e-6);
        assert!(cell.contains(&[0.5, 0.5], 0.0));
        assert!(cell.contains(&[1.0, 1.0], 1e-12));
        assert!(!cell.contains(&[1.1, 0.5], 1e-9));
    }

    #[test]
    fn test_cell2d_clip() {
        let bounds = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
        let mut cell = Cell2D::new(bounds);
        let mut scratch = Cell2DScratch::default();

        // Keeps x <= 0.5
        let (changed, _) = cell.clip_with_scratch(&[0.5, 0.5], &[1.0, 0.0], &mut scratch, None);
        assert!(changed);

        assert!((cell.area() - 0.5).abs() < 1e-6);
        assert_eq!(cell.vertices.len(), 8);
        assert!(cell.contains(&[0.25, 0.9], 1e-9));
        assert!(!cell.contains(&[0.75, 0.5], 1e-9));

        let bb = cell.bounding_box().unwrap();
        assert!((bb.max[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cell2d_clip_away() {
        let bounds = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
        let mut cell = Cell2D::new(bounds);
        let mut scratch = Cell2DScratch::default();

        // Plane beyond the far side: everything is outside.
        cell.clip_with_scratch(&[-1.0, 0.0], &[-1.0, 0.0], &mut scratch, None);
        assert!(!cell.is_empty());
        cell.clip_with_scratch(&[-1.0, 0.0], &[1.0, 0.0], &mut scratch, None);
        assert!(cell.is_empty());
        assert!(cell.bounding_box().is_none());
    }

    #[test]
    fn test_cell2d_max_radius_tracks_generator() {
        let bounds = BoundingBox::new([0.0, 0.0], [1.0, 1.0]);
        let mut cell = Cell2D::new(bounds);
        let mut scratch = Cell2DScratch::default();
        let g = [0.25, 0.5];

        let (_, r2) = cell.clip_with_scratch(&[0.5, 0.5], &[1.0, 0.0], &mut scratch, Some(&g));
        assert!((r2 - cell.max_radius_sq(&g)).abs() < 1e-12);
    }
}
