//! Renderable units and scene handles.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::layout::{IndexFormat, PrimitiveTopology, VertexLayout};

/// Opaque material identifier owned by the host engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Material handle attached to a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
}

impl Material {
    /// Create a new material handle
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: MaterialId(id),
            name: name.into(),
        }
    }
}

/// One indexed draw: layouts, material and the number of indices to draw.
///
/// The element count is written by whoever fills the buffers and read by the
/// host at submission time, possibly from another thread.
#[derive(Debug)]
pub struct MeshDraw {
    topology: PrimitiveTopology,
    vertex_layout: VertexLayout,
    index_format: IndexFormat,
    material: Arc<Material>,
    element_count: AtomicU32,
}

impl MeshDraw {
    /// Create a draw with an element count of zero.
    pub fn new(
        topology: PrimitiveTopology,
        vertex_layout: VertexLayout,
        index_format: IndexFormat,
        material: Arc<Material>,
    ) -> Self {
        Self {
            topology,
            vertex_layout,
            index_format,
            material,
            element_count: AtomicU32::new(0),
        }
    }

    pub const fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub const fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    pub const fn index_format(&self) -> IndexFormat {
        self.index_format
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Number of indices to draw.
    pub fn element_count(&self) -> u32 {
        self.element_count.load(Ordering::Acquire)
    }

    /// Set the number of indices to draw.
    pub fn set_element_count(&self, count: u32) {
        self.element_count.store(count, Ordering::Release);
    }
}

/// Opaque identity of a scene entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Scene handle the host inserts into its scene graph.
///
/// Cloning shares the attached draws; it does not copy them.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    draws: Vec<Arc<MeshDraw>>,
}

impl Entity {
    /// Create an entity with no draws.
    pub fn new() -> Self {
        Self {
            id: EntityId::next(),
            draws: Vec::new(),
        }
    }

    /// Attach a draw to this entity.
    #[must_use]
    pub fn with_draw(mut self, draw: Arc<MeshDraw>) -> Self {
        self.draws.push(draw);
        self
    }

    pub const fn id(&self) -> EntityId {
        self.id
    }

    pub fn draws(&self) -> &[Arc<MeshDraw>] {
        &self.draws
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}
