//! Central ownership of meshes and materials.
//!
//! Entities refer to GPU resources through plain index handles instead of
//! references or reference counting. The registry only ever grows while the
//! app runs, so a handle stays valid for the lifetime of the scene and the
//! gameplay code can copy handles around freely without borrowing anything.

use crate::data_structures::model::{Material, Mesh};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub usize);

#[derive(Default)]
pub struct SceneRegistry {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle(self.materials.len() - 1)
    }

    /// Handles are only minted by `add_mesh` and nothing is ever removed, so
    /// indexing is safe as long as the handle came from this registry.
    pub fn mesh(&self, handle: MeshHandle) -> &Mesh {
        &self.meshes[handle.0]
    }

    pub fn material(&self, handle: MaterialHandle) -> &Material {
        &self.materials[handle.0]
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
