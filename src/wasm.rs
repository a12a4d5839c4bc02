//! JavaScript bindings.
//!
//! Fields cross the boundary as flat typed arrays together with their shape;
//! the first coordinate is the last (fastest) array axis.

use crate::config::{AssignmentMethod, TessellationConfigBuilder, VoxelGraphConfig};
use crate::grid::VoxelField;
use crate::tessellation::DiscreteVoronoi;
use crate::voxel_graph::{BULK_SENTINEL, InterfaceLookup, InterfaceMatrix, VoxelGraph};
use js_sys::{Array, Uint32Array};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = initThreads)]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

fn to_u32(values: &[usize]) -> Vec<u32> {
    values.iter().map(|&v| v as u32).collect()
}

// --- Tessellation ---

#[wasm_bindgen(js_name = DiscreteVoronoi)]
pub struct DiscreteVoronoiJs {
    inner: DiscreteVoronoi,
}

#[wasm_bindgen(js_class = DiscreteVoronoi)]
impl DiscreteVoronoiJs {
    /// `seeds` is flat with one coordinate per entry of `resolution`; an empty
    /// `size` means the unit square or cube.
    #[wasm_bindgen(constructor)]
    pub fn new(
        seeds: &[f64],
        resolution: &[u32],
        size: &[f64],
        periodic: bool,
        exact: bool,
    ) -> Result<DiscreteVoronoiJs, JsError> {
        let resolution: Vec<usize> = resolution.iter().map(|&n| n as usize).collect();
        let mut builder = TessellationConfigBuilder::new()
            .resolution(&resolution)
            .periodic(periodic)
            .method(if exact { AssignmentMethod::Exact } else { AssignmentMethod::Binned });
        if !size.is_empty() {
            builder = builder.size(size);
        }
        let config = builder.build()?;

        let dimension = config.dimension();
        if seeds.len() % dimension != 0 {
            return Err(JsError::new("seed buffer length is not a multiple of the dimension"));
        }
        let seeds: Vec<&[f64]> = seeds.chunks_exact(dimension).collect();
        Ok(DiscreteVoronoiJs { inner: DiscreteVoronoi::new(&seeds, &config)? })
    }

    #[wasm_bindgen(getter)]
    pub fn dimension(&self) -> usize { self.inner.dimension() }
    #[wasm_bindgen(getter)]
    pub fn count_seeds(&self) -> usize { self.inner.num_seeds() }
    #[wasm_bindgen(getter)]
    pub fn num_regions(&self) -> usize { self.inner.num_regions() }
    #[wasm_bindgen(getter)]
    pub fn shape(&self) -> Vec<u32> { to_u32(self.inner.labels().shape()) }
    #[wasm_bindgen(getter)]
    pub fn labels(&self) -> Vec<u32> { to_u32(self.inner.labels().as_slice()) }
    #[wasm_bindgen(getter)]
    pub fn coords(&self) -> Vec<f64> { self.inner.coords() }
    #[wasm_bindgen(getter)]
    pub fn element_size(&self) -> Vec<f64> { self.inner.element_size() }
    #[wasm_bindgen(getter)]
    pub fn seeds(&self) -> Vec<f64> { self.inner.seeds().to_vec() }
    #[wasm_bindgen(getter)]
    pub fn voxel_counts(&self) -> Vec<u32> { to_u32(&self.inner.voxel_counts()) }
    pub fn periodic_seeds(&self) -> Vec<f64> { self.inner.periodic_seeds().points().to_vec() }
    pub fn region_boundaries(&self, axis: usize) -> Result<Vec<f64>, JsError> {
        Ok(self.inner.region_boundaries(axis)?)
    }
}

// --- Voxel graph ---

#[wasm_bindgen(js_name = VoxelGraph)]
pub struct VoxelGraphJs {
    labels: Vec<usize>,
    partners: Vec<Option<usize>>,
    boundary: Vec<u8>,
    pairs: Vec<(usize, usize)>,
    num_regions: usize,
}

#[wasm_bindgen(js_class = VoxelGraph)]
impl VoxelGraphJs {
    #[wasm_bindgen(constructor)]
    pub fn new(labels: &[u32], shape: &[u32], size: &[f64], periodic: bool) -> Result<VoxelGraphJs, JsError> {
        let shape: Vec<usize> = shape.iter().map(|&n| n as usize).collect();
        let labels = VoxelField::new(shape, labels.iter().map(|&l| l as usize).collect())?;
        let config = VoxelGraphConfig::new(size, periodic);

        let graph = VoxelGraph::with_config(&labels, &config)?;
        let boundary = graph.boundary_mask().iter().map(|&b| b as u8).collect();
        let pairs = graph.adjacency_pairs().iter().copied().collect();
        let num_regions = graph.num_regions();
        let partners = graph.interface_partners().into_vec();

        Ok(VoxelGraphJs { labels: labels.into_vec(), partners, boundary, pairs, num_regions })
    }

    #[wasm_bindgen(getter)]
    pub fn num_regions(&self) -> usize { self.num_regions }
    #[wasm_bindgen(getter)]
    pub fn count_pairs(&self) -> usize { self.pairs.len() }

    /// `1` on interface voxels, `0` on bulk voxels.
    #[wasm_bindgen(getter)]
    pub fn boundary_mask(&self) -> Vec<u8> { self.boundary.clone() }

    /// Adjacent region pairs as an array of two-element `Uint32Array`s.
    pub fn adjacency_pairs(&self) -> Array {
        self.pairs
            .iter()
            .map(|&(a, b)| JsValue::from(Uint32Array::from(&[a as u32, b as u32][..])))
            .collect()
    }

    /// Interface ids against a dense row-major `regions x regions` matrix,
    /// `-1` on bulk voxels.
    pub fn interface_index(&self, matrix: &[i32], regions: usize) -> Result<Vec<i32>, JsError> {
        let matrix = InterfaceMatrix::new(regions, matrix.iter().map(|&id| id as i64).collect())?;
        self.labels
            .iter()
            .zip(&self.partners)
            .map(|(&own, partner)| {
                let Some(other) = *partner else {
                    return Ok(BULK_SENTINEL as i32);
                };
                let id = matrix.interface_id(own, other).ok_or_else(|| {
                    JsError::new(&format!("no interface id for regions ({}, {})", own, other))
                })?;
                i32::try_from(id).map_err(|_| JsError::new(&format!("interface id {} does not fit in i32", id)))
            })
            .collect()
    }
}
