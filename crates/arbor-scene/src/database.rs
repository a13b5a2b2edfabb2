//! The resource database: one transform hierarchy plus flat material and mesh
//! registries, all backed by [`SlotStore`]s.
//!
//! Resource nodes refer to materials and meshes through [`AttachmentId`]s.
//! Attachments do not own their targets; removing a material or mesh strips
//! it from every node that referenced it.

use std::collections::HashMap;

use arbor_core::id::Handle;
use arbor_core::store::{SlotStore, StoreError};
use arbor_core::tree::{LinkKey, Links, Threaded, Tree, TreeError};

use crate::config::ResourceConfig;
use crate::id::{AttachmentId, MaterialId, MeshId, ResourceId};
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{kind} named {name:?} already exists")]
    DuplicateName { kind: &'static str, name: String },
    #[error("attachment target {0:?} does not exist")]
    UnknownAttachment(AttachmentId),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A node in the resource hierarchy.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    links: Links,
    pub name: String,
    /// Placement relative to the parent node.
    pub local: Transform,
    attachments: Vec<AttachmentId>,
}

impl SceneNode {
    fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            links: Links::default(),
            name: name.into(),
            local,
            attachments: Vec::new(),
        }
    }

    pub fn attachments(&self) -> &[AttachmentId] {
        &self.attachments
    }
}

impl Threaded for SceneNode {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self, _: LinkKey) -> &mut Links {
        &mut self.links
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
}

// ---------------------------------------------------------------------------
// ResourceDatabase
// ---------------------------------------------------------------------------

const ROOT_NAME: &str = "root";

/// Owner of the resource hierarchy and the flat registries.
#[derive(Debug, Clone)]
pub struct ResourceDatabase {
    nodes: Tree<SceneNode>,
    materials: SlotStore<Material>,
    material_names: HashMap<String, MaterialId>,
    meshes: SlotStore<Mesh>,
    mesh_names: HashMap<String, MeshId>,
}

impl Default for ResourceDatabase {
    fn default() -> Self {
        Self::new(&ResourceConfig::default())
    }
}

impl ResourceDatabase {
    pub fn new(config: &ResourceConfig) -> Self {
        Self {
            nodes: Tree::with_config(SceneNode::new(ROOT_NAME, Transform::IDENTITY), config.nodes),
            materials: SlotStore::with_config(config.materials),
            material_names: HashMap::new(),
            meshes: SlotStore::with_config(config.meshes),
            mesh_names: HashMap::new(),
        }
    }

    /// Drop every resource, material and mesh and start over with a bare
    /// root. Every id issued before the call is invalidated.
    pub fn init(&mut self) {
        tracing::debug!(
            nodes = self.nodes.node_count(),
            materials = self.material_names.len(),
            meshes = self.mesh_names.len(),
            "reinitialising resource database"
        );
        self.nodes.reset(SceneNode::new(ROOT_NAME, Transform::IDENTITY));
        self.materials.clear();
        self.material_names.clear();
        self.meshes.clear();
        self.mesh_names.clear();
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    pub fn root(&self) -> ResourceId {
        ResourceId(self.nodes.root())
    }

    pub fn resource_count(&self) -> usize {
        self.nodes.node_count()
    }

    /// Attach a new resource as the last child of `parent`.
    pub fn add_resource(
        &mut self,
        parent: ResourceId,
        name: &str,
        local: Transform,
    ) -> Result<ResourceId, SceneError> {
        let handle = self.nodes.add_child(parent.0, SceneNode::new(name, local))?;
        Ok(ResourceId(handle))
    }

    /// Remove `id` and everything below it. Returns how many resources were
    /// removed.
    pub fn remove_resource(&mut self, id: ResourceId) -> Result<usize, SceneError> {
        Ok(self.nodes.take_subtree(id.0)?.len())
    }

    pub fn resource(&self, id: ResourceId) -> Result<&SceneNode, SceneError> {
        Ok(self.nodes.get(id.0)?)
    }

    pub fn set_local_transform(&mut self, id: ResourceId, local: Transform) -> Result<(), SceneError> {
        self.nodes.get_mut(id.0)?.local = local;
        Ok(())
    }

    pub fn parent(&self, id: ResourceId) -> Result<Option<ResourceId>, SceneError> {
        Ok(self.nodes.parent(id.0)?.map(ResourceId))
    }

    pub fn first_child(&self, id: ResourceId) -> Result<Option<ResourceId>, SceneError> {
        Ok(self.nodes.first_child(id.0)?.map(ResourceId))
    }

    pub fn next_sibling(&self, id: ResourceId) -> Result<Option<ResourceId>, SceneError> {
        Ok(self.nodes.next_sibling(id.0)?.map(ResourceId))
    }

    /// Children of `id` in insertion order. Double-ended.
    pub fn children(
        &self,
        id: ResourceId,
    ) -> Result<impl DoubleEndedIterator<Item = ResourceId> + '_, SceneError> {
        Ok(self.nodes.children(id.0)?.map(ResourceId))
    }

    /// First resource named `name` in depth-first pre-order, root included.
    pub fn find(&self, name: &str) -> Option<ResourceId> {
        let root = self.nodes.root();
        std::iter::once(root)
            .chain(self.nodes.descendants(root).ok()?)
            .find(|&h| self.nodes.get(h).is_ok_and(|n| n.name == name))
            .map(ResourceId)
    }

    /// Placement of `id` in root space.
    pub fn world_transform(&self, id: ResourceId) -> Result<Transform, SceneError> {
        let mut chain = vec![id.0];
        chain.extend(self.nodes.ancestors(id.0)?);
        chain.iter().rev().try_fold(Transform::IDENTITY, |world, &h| {
            Ok(world.then(&self.nodes.get(h)?.local))
        })
    }

    // -----------------------------------------------------------------------
    // Attachments
    // -----------------------------------------------------------------------

    /// Record that `id` uses `attachment`. The target must exist.
    pub fn attach(
        &mut self,
        id: ResourceId,
        attachment: impl Into<AttachmentId>,
    ) -> Result<(), SceneError> {
        let attachment = attachment.into();
        if !self.attachment_exists(attachment) {
            return Err(SceneError::UnknownAttachment(attachment));
        }
        let node = self.nodes.get_mut(id.0)?;
        if !node.attachments.contains(&attachment) {
            node.attachments.push(attachment);
        }
        Ok(())
    }

    pub fn attachments(&self, id: ResourceId) -> Result<&[AttachmentId], SceneError> {
        Ok(self.nodes.get(id.0)?.attachments())
    }

    fn attachment_exists(&self, attachment: AttachmentId) -> bool {
        match attachment {
            AttachmentId::Material(id) => self.materials.is_occupied(id.0),
            AttachmentId::Mesh(id) => self.meshes.is_occupied(id.0),
        }
    }

    /// Remove `gone` from every node's attachment list.
    fn strip_attachments(&mut self, gone: &[AttachmentId]) {
        let handles: Vec<Handle> = self.nodes.store().handles().collect();
        for handle in handles {
            if let Ok(node) = self.nodes.get_mut(handle) {
                node.attachments.retain(|a| !gone.contains(a));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Materials
    // -----------------------------------------------------------------------

    /// Register a material. Names are unique; a duplicate leaves the
    /// registry untouched.
    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        if self.material_names.contains_key(&material.name) {
            tracing::warn!(name = %material.name, "duplicate material name refused");
            return Err(SceneError::DuplicateName {
                kind: "material",
                name: material.name,
            });
        }
        let handle = self.materials.insert(material)?;
        let id = MaterialId(handle);
        let name = self.materials.get_unchecked(handle)?.name.clone();
        self.material_names.insert(name, id);
        self.materials.mark_occupied(handle)?;
        Ok(id)
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material, SceneError> {
        Ok(self.materials.get(id.0)?)
    }

    pub fn material_by_name(&self, name: &str) -> Option<MaterialId> {
        self.material_names.get(name).copied()
    }

    /// All live materials in slot order.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().map(|(h, m)| (MaterialId(h), m))
    }

    /// Remove every material in `ids`, or none of them.
    pub fn remove_materials(&mut self, ids: &[MaterialId]) -> Result<(), SceneError> {
        let handles: Vec<Handle> = ids.iter().map(|id| id.0).collect();
        for (material, id) in self.materials.erase_take(&handles)?.into_iter().zip(ids) {
            if self.material_names.get(&material.name) == Some(id) {
                self.material_names.remove(&material.name);
            }
        }
        let gone: Vec<AttachmentId> = ids.iter().map(|&id| id.into()).collect();
        self.strip_attachments(&gone);
        tracing::debug!(count = ids.len(), "removed materials");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Meshes
    // -----------------------------------------------------------------------

    /// Register a mesh. Names are unique; a duplicate leaves the registry
    /// untouched.
    pub fn add_mesh(&mut self, mesh: Mesh) -> Result<MeshId, SceneError> {
        if self.mesh_names.contains_key(&mesh.name) {
            tracing::warn!(name = %mesh.name, "duplicate mesh name refused");
            return Err(SceneError::DuplicateName {
                kind: "mesh",
                name: mesh.name,
            });
        }
        let handle = self.meshes.insert(mesh)?;
        let id = MeshId(handle);
        let name = self.meshes.get_unchecked(handle)?.name.clone();
        self.mesh_names.insert(name, id);
        self.meshes.mark_occupied(handle)?;
        Ok(id)
    }

    pub fn mesh(&self, id: MeshId) -> Result<&Mesh, SceneError> {
        Ok(self.meshes.get(id.0)?)
    }

    pub fn mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.mesh_names.get(name).copied()
    }

    /// All live meshes in slot order, following "next occupied" links.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        std::iter::successors(self.meshes.next_occupied(None), |&h| {
            self.meshes.next_occupied(Some(h))
        })
        .filter_map(|h| self.meshes.get(h).ok().map(|m| (MeshId(h), m)))
    }

    /// Remove every mesh in `ids`, or none of them.
    pub fn remove_meshes(&mut self, ids: &[MeshId]) -> Result<(), SceneError> {
        let handles: Vec<Handle> = ids.iter().map(|id| id.0).collect();
        for (mesh, id) in self.meshes.erase_take(&handles)?.into_iter().zip(ids) {
            if self.mesh_names.get(&mesh.name) == Some(id) {
                self.mesh_names.remove(&mesh.name);
            }
        }
        let gone: Vec<AttachmentId> = ids.iter().map(|&id| id.into()).collect();
        self.strip_attachments(&gone);
        tracing::debug!(count = ids.len(), "removed meshes");
        Ok(())
    }

    /// Structural check of the hierarchy. Empty when consistent.
    pub fn validate(&self) -> Vec<arbor_core::validation::InvariantViolation> {
        self.nodes.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel() -> Material {
        Material {
            name: "steel".to_string(),
            base_color: [0.6, 0.6, 0.65, 1.0],
        }
    }

    fn cube() -> Mesh {
        Mesh {
            name: "cube".to_string(),
        }
    }

    #[test]
    fn hierarchy_walks_in_insertion_order() {
        let mut db = ResourceDatabase::default();
        let root = db.root();
        let camera = db.add_resource(root, "camera", Transform::IDENTITY).unwrap();
        let light = db.add_resource(root, "light", Transform::IDENTITY).unwrap();
        let lens = db.add_resource(camera, "lens", Transform::IDENTITY).unwrap();

        assert_eq!(db.first_child(root).unwrap(), Some(camera));
        assert_eq!(db.next_sibling(camera).unwrap(), Some(light));
        assert_eq!(db.next_sibling(light).unwrap(), None);
        assert_eq!(db.parent(lens).unwrap(), Some(camera));
        let rev: Vec<ResourceId> = db.children(root).unwrap().rev().collect();
        assert_eq!(rev, vec![light, camera]);
        assert!(db.validate().is_empty());
    }

    #[test]
    fn world_transform_composes_ancestors() {
        let mut db = ResourceDatabase::default();
        let arm = db
            .add_resource(db.root(), "arm", Transform::from_translation([1.0, 0.0, 0.0]).with_scale(2.0))
            .unwrap();
        let hand = db
            .add_resource(arm, "hand", Transform::from_translation([0.5, 0.0, 0.0]))
            .unwrap();
        let world = db.world_transform(hand).unwrap();
        assert_eq!(world.translation, [2.0, 0.0, 0.0]);
        assert_eq!(world.scale, 2.0);

        db.set_local_transform(arm, Transform::IDENTITY).unwrap();
        assert_eq!(db.world_transform(hand).unwrap().translation, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn duplicate_material_name_leaves_slot_free() {
        let mut db = ResourceDatabase::default();
        let first = db.add_material(steel()).unwrap();
        let err = db.add_material(steel()).unwrap_err();
        assert_eq!(
            err,
            SceneError::DuplicateName {
                kind: "material",
                name: "steel".to_string()
            }
        );
        assert_eq!(db.materials().count(), 1);
        assert_eq!(db.material_by_name("steel"), Some(first));
    }

    #[test]
    fn attach_requires_live_target() {
        let mut db = ResourceDatabase::default();
        let node = db.add_resource(db.root(), "crate", Transform::IDENTITY).unwrap();
        let mat = db.add_material(steel()).unwrap();
        let mesh = db.add_mesh(cube()).unwrap();
        db.attach(node, mat).unwrap();
        db.attach(node, mesh).unwrap();
        db.attach(node, mat).unwrap();
        assert_eq!(
            db.attachments(node).unwrap(),
            &[AttachmentId::Material(mat), AttachmentId::Mesh(mesh)]
        );

        db.remove_materials(&[mat]).unwrap();
        assert_eq!(db.attachments(node).unwrap(), &[AttachmentId::Mesh(mesh)]);
        assert_eq!(
            db.attach(node, mat),
            Err(SceneError::UnknownAttachment(AttachmentId::Material(mat)))
        );
    }

    #[test]
    fn removed_material_name_can_be_reused() {
        let mut db = ResourceDatabase::default();
        let old = db.add_material(steel()).unwrap();
        db.remove_materials(&[old]).unwrap();
        assert_eq!(db.material_by_name("steel"), None);
        let new = db.add_material(steel()).unwrap();
        assert_eq!(db.material(new).unwrap().name, "steel");
    }

    #[test]
    fn mesh_iteration_skips_removed() {
        let mut db = ResourceDatabase::default();
        let ids: Vec<MeshId> = ["a", "b", "c"]
            .iter()
            .map(|n| db.add_mesh(Mesh { name: n.to_string() }).unwrap())
            .collect();
        db.remove_meshes(&[ids[1]]).unwrap();
        let names: Vec<&str> = db.meshes().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(db.mesh(ids[1]).is_err());
        assert_eq!(db.mesh_by_name("c"), Some(ids[2]));
    }

    #[test]
    fn remove_resource_counts_subtree() {
        let mut db = ResourceDatabase::default();
        let a = db.add_resource(db.root(), "a", Transform::IDENTITY).unwrap();
        db.add_resource(a, "a1", Transform::IDENTITY).unwrap();
        db.add_resource(a, "a2", Transform::IDENTITY).unwrap();
        assert_eq!(db.remove_resource(a).unwrap(), 3);
        assert_eq!(db.resource_count(), 1);
        assert!(db.resource(a).is_err());
        assert!(matches!(
            db.remove_resource(db.root()),
            Err(SceneError::Tree(TreeError::RootRemoval(_)))
        ));
    }

    #[test]
    fn removed_payloads_are_released() {
        let mut db = ResourceDatabase::default();
        let mat = db.add_material(steel()).unwrap();
        let node = db.add_resource(db.root(), "crate", Transform::IDENTITY).unwrap();
        db.attach(node, mat).unwrap();

        db.remove_resource(node).unwrap();
        let freed = db.nodes.store().get_unchecked(node.0).unwrap();
        assert!(freed.name.is_empty());
        assert!(freed.attachments().is_empty());

        db.remove_materials(&[mat]).unwrap();
        assert_eq!(db.materials.get_unchecked(mat.0), Ok(&Material::default()));
    }

    #[test]
    fn find_searches_depth_first() {
        let mut db = ResourceDatabase::default();
        let a = db.add_resource(db.root(), "a", Transform::IDENTITY).unwrap();
        let deep = db.add_resource(a, "target", Transform::IDENTITY).unwrap();
        db.add_resource(db.root(), "target", Transform::IDENTITY).unwrap();
        assert_eq!(db.find("target"), Some(deep));
        assert_eq!(db.find("root"), Some(db.root()));
        assert_eq!(db.find("missing"), None);
    }

    #[test]
    fn init_clears_everything() {
        let mut db = ResourceDatabase::default();
        let node = db.add_resource(db.root(), "n", Transform::IDENTITY).unwrap();
        let mat = db.add_material(steel()).unwrap();
        let mesh = db.add_mesh(cube()).unwrap();
        db.init();
        assert_eq!(db.resource_count(), 1);
        assert!(db.resource(node).is_err());
        assert!(db.material(mat).is_err());
        assert!(db.mesh(mesh).is_err());
        assert_eq!(db.material_by_name("steel"), None);
        assert_eq!(db.resource(db.root()).unwrap().name, "root");
    }
}
