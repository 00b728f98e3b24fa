//! Vertex and index layout descriptions.

/// Format of a single vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x3,
    Float16x2,
    Float16x4,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Float32x3 => 12,
            Self::Float16x4 => 8,
            Self::Float16x2 => 4,
        }
    }
}

/// Named meaning of a vertex attribute, matched against shader inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    Normal,
    TexCoord,
}

/// One attribute within a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex
    pub offset: u32,
}

/// Ordered, tightly packed attribute list of a vertex buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexLayout {
    elements: Vec<VertexElement>,
    stride: u32,
}

impl VertexLayout {
    /// Create an empty layout.
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
            stride: 0,
        }
    }

    /// Append an attribute directly after the previous one.
    #[must_use]
    pub fn with(mut self, semantic: VertexSemantic, format: VertexFormat) -> Self {
        self.elements.push(VertexElement {
            semantic,
            format,
            offset: self.stride,
        });
        self.stride += format.size();
        self
    }

    /// Size of one vertex in bytes.
    pub const fn stride(&self) -> u32 {
        self.stride
    }

    /// Attributes in declaration order.
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Look up an attribute by semantic.
    pub fn find(&self, semantic: VertexSemantic) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }
}

/// Index element type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    #[default]
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::U32 => 4,
        }
    }
}

/// How indices are assembled into primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    #[default]
    TriangleList,
}
