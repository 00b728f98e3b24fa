//! Dynamic terrain meshing for the Terramesh engine.
//!
//! Turns a sparse, chunk-organized set of visible block faces into one packed
//! vertex/index buffer pair that renders in a single draw call:
//! - [`registry`]: chunk → block face descriptors, with a hard capacity
//! - [`mesher`]: allocation-free quad emission into pre-sized slices
//! - [`terrain`]: the synchronizer that owns the GPU buffers and rebuilds
//!   them when the registry changed
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use terramesh_core::{BlockFaceDescriptor, BlockFaces, ChunkPos};
//! use terramesh_gpu::{HostAllocator, Material};
//! use terramesh_terrain::{GraphicalTerrain, TerrainConfig};
//!
//! let mut allocator = HostAllocator::new();
//! let terrain = GraphicalTerrain::new(
//!     &mut allocator,
//!     Arc::new(Material::new(1, "terrain")),
//!     TerrainConfig::default().with_max_block_count(64),
//! )
//! .unwrap();
//!
//! terrain.add_block(ChunkPos::ORIGIN, BlockFaceDescriptor::at(0, 0, 0, BlockFaces::TOP));
//! assert!(terrain.rebuild_if_dirty().unwrap());
//! assert_eq!(terrain.draw_count(), 6);
//! ```

pub mod config;
pub mod error;
pub mod mesher;
pub mod registry;
pub mod terrain;
pub mod vertex;

pub use config::{MeshCapacity, TerrainConfig};
pub use error::{Result, TerrainError};
pub use mesher::{build_blocks, build_mesh, MeshCounts};
pub use registry::{BlockRegistry, PurgeOutcome};
pub use terrain::GraphicalTerrain;
pub use vertex::TerrainVertex;
