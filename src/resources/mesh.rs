use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Triangles whose UV area is below this are skipped during tangent
/// accumulation instead of dividing by a near-zero determinant.
const UV_AREA_EPSILON: f32 = 1e-8;

/**
 * Obj files don't come with tangents so they have to be calculated for
 * normal maps to work correctly.
 *
 * For every triangle the tangent is the solution of
 *     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
 *     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
 * accumulated onto each of the triangle's vertices. A final pass makes the
 * tangent orthogonal to the vertex normal and unit length; the normalization
 * also absorbs the accumulation counts, so no averaging is needed.
 */
pub fn compute_tangents(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    for c in indices.chunks(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);

        let pos0: cgmath::Vector3<f32> = vertices[i0].position.into();
        let pos1: cgmath::Vector3<f32> = vertices[i1].position.into();
        let pos2: cgmath::Vector3<f32> = vertices[i2].position.into();

        let uv0: cgmath::Vector2<f32> = vertices[i0].tex_coords.into();
        let uv1: cgmath::Vector2<f32> = vertices[i1].tex_coords.into();
        let uv2: cgmath::Vector2<f32> = vertices[i2].tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Degenerate UV mapping (all three corners on a line in texture
        // space). Such a triangle has no well-defined tangent, so it
        // contributes nothing rather than an Inf/NaN.
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < UV_AREA_EPSILON {
            continue;
        }

        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;

        for &i in &[i0, i1, i2] {
            vertices[i].tangent =
                (cgmath::Vector3::from(vertices[i].tangent) + tangent).into();
        }
    }

    for v in vertices.iter_mut() {
        let normal: cgmath::Vector3<f32> = v.normal.into();
        let tangent: cgmath::Vector3<f32> = v.tangent.into();

        // Gram-Schmidt: remove the component along the normal, then
        // normalize. Vertices touched only by degenerate triangles keep a
        // zero tangent.
        let tangent = tangent - normal * normal.dot(tangent);
        let length = tangent.magnitude();
        v.tangent = if length > UV_AREA_EPSILON {
            (tangent / length).into()
        } else {
            [0.0; 3]
        };
    }
}

/// Upload vertex and index data and wrap the buffers in a [`model::Mesh`].
pub fn build_mesh(
    device: &wgpu::Device,
    name: &str,
    vertices: &[model::ModelVertex],
    indices: &[u32],
) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
    }
}
