//! A resource database built on `arbor-core`: a transform hierarchy of named
//! resource nodes plus flat material and mesh registries.

pub mod config;
pub mod database;
pub mod id;
pub mod transform;

pub use config::{ConfigError, ResourceConfig};
pub use database::{Material, Mesh, ResourceDatabase, SceneError, SceneNode};
pub use id::{AttachmentId, MaterialId, MeshId, ResourceId};
pub use transform::Transform;
