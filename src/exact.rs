//! Exact voxel assignment from convex Voronoi cells.
//!
//! Every candidate's cell is built by clipping the domain box against the
//! bisectors of its neighbours; voxels whose centres fall inside the cell's
//! hull receive the candidate's label.

use crate::algorithm::{SeedLocator, distance_sq};
use crate::bounds::BoundingBox;
use crate::cell::Cell;
use crate::grid::VoxelGrid;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Voxel centres this far outside a cell boundary still count as inside.
const CONTAINS_TOLERANCE: f64 = 1e-10;

fn point<const D: usize>(flat: &[f64], index: usize) -> [f64; D] {
    let mut p = [0.0; D];
    p.copy_from_slice(&flat[index * D..(index + 1) * D]);
    p
}

/// Builds the cell of candidate `index` restricted to `bounds`.
///
/// Neighbours are visited nearest first; once a neighbour is further than twice
/// the cell radius its bisector cannot cut the cell any more, and neither can
/// any later one.
fn build_cell<const D: usize, C: Cell<D>>(
    index: usize,
    candidates: &[f64],
    bounds: BoundingBox<D>,
    scratch: &mut C::Scratch,
) -> Option<C> {
    let count = candidates.len() / D;
    let g = point::<D>(candidates, index);

    let mut order: Vec<(f64, usize)> = (0..count)
        .filter(|&j| j != index)
        .map(|j| (distance_sq(&g, &candidates[j * D..(j + 1) * D]), j))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut cell = C::new(bounds);
    let mut max_dist_sq = cell.max_radius_sq(&g);

    for (dist_sq, j) in order {
        if dist_sq > 4.0 * max_dist_sq {
            break;
        }
        if dist_sq == 0.0 {
            // Coincident candidates share one cell; the lower label wins later.
            continue;
        }
        let n = point::<D>(candidates, j);
        let mut mid = [0.0; D];
        let mut normal = [0.0; D];
        for d in 0..D {
            normal[d] = n[d] - g[d];
            mid[d] = g[d] + normal[d] * 0.5;
        }

        let (changed, radius_sq) = cell.clip(&mid, &normal, scratch, Some(&g));
        if changed {
            if cell.is_empty() {
                return None;
            }
            max_dist_sq = radius_sq;
        }
    }

    if cell.is_empty() { None } else { Some(cell) }
}

/// Inclusive voxel index range along one axis whose centres can lie in `[lo, hi]`.
fn index_range(lo: f64, hi: f64, element: f64, n: usize) -> Option<(usize, usize)> {
    let first = (lo / element - 0.5).floor().max(0.0);
    let last = (hi / element - 0.5).ceil().min(n as f64 - 1.0);
    if last < first {
        return None;
    }
    Some((first as usize, last as usize))
}

/// Labels every voxel of `grid` from exact cells of the candidate set.
///
/// `candidates` holds flat positions, `labels[i]` the seed candidate `i`
/// represents. A voxel inside several cells keeps the lowest label; a voxel
/// inside none (a numerical sliver) is labeled by `fallback`.
pub(crate) fn assign<const D: usize, C: Cell<D>>(
    grid: &VoxelGrid,
    candidates: &[f64],
    labels: &[usize],
    fallback: &dyn SeedLocator,
) -> Vec<usize> {
    let mut size = [0.0; D];
    size.copy_from_slice(grid.size());
    let bounds = BoundingBox::from_size(size);

    let cells: Vec<Option<C>> = (0..labels.len())
        .into_par_iter()
        .map_init(|| C::Scratch::default(), |scratch, i| build_cell::<D, C>(i, candidates, bounds, scratch))
        .collect();
    debug!(
        candidates = labels.len(),
        non_empty = cells.iter().filter(|c| c.is_some()).count(),
        "Built exact cells"
    );

    let resolution = grid.resolution();
    let element = grid.element_size();
    let strides = grid.axis_strides();
    let mut assigned: Vec<Option<usize>> = vec![None; grid.voxel_count()];
    let mut center = [0.0; D];

    for (cell, &label) in cells.iter().zip(labels) {
        let Some(cell) = cell else { continue };
        let Some(bb) = cell.bounding_box() else { continue };

        let mut ranges = [(0usize, 0usize); D];
        let mut empty = false;
        for d in 0..D {
            match index_range(bb.min[d], bb.max[d], element[d], resolution[d]) {
                Some(r) => ranges[d] = r,
                None => empty = true,
            }
        }
        if empty {
            continue;
        }

        // Walk the voxel block covering the cell's bounding box.
        let mut idx: [usize; D] = std::array::from_fn(|d| ranges[d].0);
        'block: loop {
            let flat: usize = (0..D).map(|d| idx[d] * strides[d]).sum();
            grid.voxel_center_into(flat, &mut center);
            if cell.contains(&center, CONTAINS_TOLERANCE) {
                let slot = &mut assigned[flat];
                *slot = Some(slot.map_or(label, |l| l.min(label)));
            }

            let mut d = D;
            loop {
                if d == 0 {
                    break 'block;
                }
                d -= 1;
                if idx[d] < ranges[d].1 {
                    idx[d] += 1;
                    break;
                }
                idx[d] = ranges[d].0;
            }
        }
    }

    let missing = assigned.iter().filter(|a| a.is_none()).count();
    if missing > 0 {
        warn!(voxels = missing, "Exact cells left voxels unassigned, using nearest seed");
    }

    assigned
        .into_par_iter()
        .enumerate()
        .map(|(flat, label)| {
            label.unwrap_or_else(|| {
                let center = grid.voxel_center(flat);
                fallback.nearest(&center)
            })
        })
        .collect()
}
