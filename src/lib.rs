//! # vorovox
//!
//! `vorovox` is a Rust library for discrete Voronoi tessellations on voxel grids in 2D and 3D,
//! designed to be used in Rust as well as compiled to WebAssembly (WASM). It labels every voxel
//! of a uniform grid with its nearest seed and analyzes the resulting label field as a graph of
//! adjacent regions, as used for synthetic microstructures.
//!
//! ## Features
//!
//! - **Periodic domains**: Seeds are replicated into their periodic images, so regions wrap across opposite faces.
//! - **Assignment strategies**: Brute-force and binned nearest-seed search, or membership in exact convex cells.
//! - **Voxel graphs**: Neighbour fields, bulk and interface masks, region adjacency and per-voxel interface ids.
//! - **WASM-first**: Built with `wasm-bindgen` for seamless integration with JavaScript and TypeScript.
//!
//! ## Example
//!
//! ```rust
//! use vorovox::*;
//!
//! let seeds = random_seeds(16, &[1.0, 1.0], 7);
//! let config = TessellationConfigBuilder::new()
//!     .resolution(&[64, 64])
//!     .periodic(true)
//!     .build()
//!     .unwrap();
//! let voronoi = DiscreteVoronoi::new(&seeds, &config).unwrap();
//!
//! let graph = VoxelGraph::new(voronoi.labels(), &[1.0, 1.0], true).unwrap();
//! let interfaces = InterfaceMatrix::from_pairs(voronoi.num_seeds(), graph.adjacency_pairs()).unwrap();
//! let index = graph.interface_index(&interfaces).unwrap();
//! assert_eq!(index.shape(), &[64, 64]);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry points are [`DiscreteVoronoi`] (or the one-call [`tessellate`]) and
//! [`VoxelGraph`].

pub mod algorithm;
mod bounds;
pub mod cell;
mod config;
mod error;
mod exact;
mod grid;
mod periodic;
mod tessellation;
mod voxel_graph;
pub mod wasm;

pub use algorithm::SeedLocator;
pub use bounds::BoundingBox;
pub use config::AssignmentMethod;
pub use config::EdgeMode;
pub use config::TessellationConfig;
pub use config::TessellationConfigBuilder;
pub use config::VoxelGraphConfig;
pub use error::Result;
pub use error::VoxelError;
pub use grid::VoxelField;
pub use grid::VoxelGrid;
pub use periodic::PeriodicImages;
pub use tessellation::DiscreteVoronoi;
pub use tessellation::Tessellated;
pub use tessellation::random_seeds;
pub use tessellation::tessellate;
pub use voxel_graph::BULK_SENTINEL;
pub use voxel_graph::Direction;
pub use voxel_graph::InterfaceLookup;
pub use voxel_graph::InterfaceMatrix;
pub use voxel_graph::VoxelGraph;
