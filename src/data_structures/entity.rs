//! Game entities: a transform plus handles into the scene registry.
//!
//! The transform fields are the source of truth; the world matrix is derived
//! from them and only recomputed when [`GameEntity::update_world_matrix`] is
//! called. Mutators deliberately leave the matrix stale so a burst of updates
//! costs one recompute right before drawing.

use cgmath::{Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

use crate::data_structures::model::Vertex;
use crate::data_structures::registry::{MaterialHandle, MeshHandle};

/// Position, Euler rotation (radians) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotation part only, composed as X * Y * Z so that with column vectors
    /// the Z rotation applies first, then Y, then X.
    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(Rad(self.rotation.x))
            * Matrix3::from_angle_y(Rad(self.rotation.y))
            * Matrix3::from_angle_z(Rad(self.rotation.z))
    }

    /// World matrix: translation * rotation-X * rotation-Y * rotation-Z *
    /// scale. Applied to a column vector that scales first, rotates Z then Y
    /// then X, and translates last.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation_matrix())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Split a world matrix back into (position, rotation, scale). Scales are
    /// recovered as column lengths, so mirrored (negative-scale) matrices are
    /// out of scope here.
    pub fn decompose(matrix: &Matrix4<f32>) -> (Vector3<f32>, Matrix3<f32>, Vector3<f32>) {
        use cgmath::InnerSpace;

        let position = matrix.w.truncate();
        let x = matrix.x.truncate();
        let y = matrix.y.truncate();
        let z = matrix.z.truncate();
        let scale = Vector3::new(x.magnitude(), y.magnitude(), z.magnitude());
        let rotation = Matrix3::from_cols(x / scale.x, y / scale.y, z / scale.z);
        (position, rotation, scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// A drawable world-space object: mesh + material handles and a transform.
///
/// Handles index into the [`crate::data_structures::registry::SceneRegistry`]
/// that owns the actual GPU resources, so entities stay plain CPU data and
/// recycling them never touches a buffer.
#[derive(Debug, Clone)]
pub struct GameEntity {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub transform: Transform,
    world_matrix: Matrix4<f32>,
}

impl GameEntity {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            transform: Transform::new(),
            world_matrix: Matrix4::identity(),
        }
    }

    /// Recompute the cached world matrix from the transform. Callers must
    /// invoke this after mutating the transform and before relying on
    /// [`Self::world_matrix`] or [`Self::to_raw`].
    pub fn update_world_matrix(&mut self) {
        self.world_matrix = self.transform.matrix();
    }

    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world_matrix
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.position = position;
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.transform.position += delta;
    }

    pub fn set_rotation(&mut self, rotation: Vector3<f32>) {
        self.transform.rotation = rotation;
    }

    pub fn rotate(&mut self, delta: Vector3<f32>) {
        self.transform.rotation += delta;
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.transform.scale = scale;
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.world_matrix.into(),
            normal: self.transform.rotation_matrix().into(),
        }
    }
}

/// Per-entity data as it lives in the instance vertex buffer: the world
/// matrix plus the rotation-only matrix used to transform normals.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance per instance, not per vertex; the shader reads the same
            // matrices for every vertex of one entity.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 occupies four vec4 slots. Locations 0-3 belong to
                // ModelVertex; 4 is left free for future vertex attributes.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix, Point3, Transform as _, vec3};

    const EPS: f32 = 1e-5;

    fn assert_vec3_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    fn entity() -> GameEntity {
        GameEntity::new(MeshHandle(0), MaterialHandle(0))
    }

    #[test]
    fn identity_transform_gives_identity_matrix() {
        let t = Transform::new();
        assert_eq!(t.matrix(), Matrix4::identity());
    }

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let mut t = Transform::new();
        t.position = vec3(1.0, 2.0, 3.0);
        t.rotation = vec3(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        t.scale = vec3(2.0, 1.0, 1.0);

        // (1, 0, 0) scales to (2, 0, 0), rotates 90 deg around Y to
        // (0, 0, -2), then translates.
        let p = t.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_vec3_eq(
            vec3(p.x, p.y, p.z),
            vec3(1.0 + 0.0, 2.0 + 0.0, 3.0 - 2.0),
        );
    }

    #[test]
    fn rotation_order_is_z_then_y_then_x() {
        let mut t = Transform::new();
        t.rotation = vec3(0.3, 0.8, -1.2);

        let expected = Matrix4::from_angle_x(Rad(0.3))
            * Matrix4::from_angle_y(Rad(0.8))
            * Matrix4::from_angle_z(Rad(-1.2));
        let got = t.matrix();
        for c in 0..4 {
            for r in 0..4 {
                assert!((got[c][r] - expected[c][r]).abs() < EPS);
            }
        }
    }

    #[test]
    fn world_matrix_round_trips_through_decompose() {
        let mut e = entity();
        e.set_position(vec3(4.0, -1.0, 12.5));
        e.set_rotation(vec3(0.2, -0.7, 1.1));
        e.set_scale(vec3(3.0, 2.0, 15.0));
        e.update_world_matrix();

        let (position, rotation, scale) = Transform::decompose(e.world_matrix());
        assert_vec3_eq(position, e.transform.position);
        assert_vec3_eq(scale, e.transform.scale);

        let expected_rotation = e.transform.rotation_matrix();
        for c in 0..3 {
            for r in 0..3 {
                assert!((rotation[c][r] - expected_rotation[c][r]).abs() < EPS);
            }
        }
    }

    #[test]
    fn mutators_leave_the_world_matrix_stale() {
        let mut e = entity();
        e.update_world_matrix();
        e.set_position(vec3(0.0, 0.0, 9.0));
        e.translate(vec3(1.0, 0.0, 0.0));
        assert_eq!(*e.world_matrix(), Matrix4::identity());

        e.update_world_matrix();
        assert_eq!(e.world_matrix().w.truncate(), vec3(1.0, 0.0, 9.0));
    }

    #[test]
    fn normal_matrix_ignores_scale() {
        let mut e = entity();
        e.set_scale(vec3(3.0, 2.0, 15.0));
        e.set_rotation(vec3(0.0, 0.0, 0.0));
        e.update_world_matrix();

        let raw = e.to_raw();
        let normal: Matrix3<f32> = raw.normal.into();
        for c in 0..3 {
            for r in 0..3 {
                assert!((normal[c][r] - Matrix3::<f32>::identity()[c][r]).abs() < EPS);
            }
        }
    }

    #[test]
    fn decompose_recovers_rotation_columns_as_unit_vectors() {
        let mut t = Transform::new();
        t.rotation = vec3(0.5, 0.25, -0.75);
        t.scale = vec3(0.1, 0.1, 0.1);
        let (_, rotation, _) = Transform::decompose(&t.matrix());

        use cgmath::InnerSpace;
        assert!((rotation.x.magnitude() - 1.0).abs() < EPS);
        assert!((rotation.y.magnitude() - 1.0).abs() < EPS);
        assert!((rotation.z.magnitude() - 1.0).abs() < EPS);
        // Orthonormal columns: the transpose is the inverse.
        let should_be_identity = rotation.transpose() * rotation;
        for c in 0..3 {
            for r in 0..3 {
                let expected = if c == r { 1.0 } else { 0.0 };
                assert!((should_be_identity[c][r] - expected).abs() < EPS);
            }
        }
    }
}
