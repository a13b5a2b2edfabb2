use arbor_core::id::Handle;

/// Identifies a node in the resource hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) Handle);

/// Identifies a material in the flat material registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub(crate) Handle);

/// Identifies a mesh in the flat mesh registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub(crate) Handle);

/// Something a resource node refers to without owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentId {
    Material(MaterialId),
    Mesh(MeshId),
}

impl ResourceId {
    pub fn handle(self) -> Handle {
        self.0
    }
}

impl MaterialId {
    pub fn handle(self) -> Handle {
        self.0
    }
}

impl MeshId {
    pub fn handle(self) -> Handle {
        self.0
    }
}

impl From<MaterialId> for AttachmentId {
    fn from(id: MaterialId) -> Self {
        Self::Material(id)
    }
}

impl From<MeshId> for AttachmentId {
    fn from(id: MeshId) -> Self {
        Self::Mesh(id)
    }
}
