use anyhow::Context as _;

use crate::data_structures::{model, texture::Texture};
use crate::resources::texture::{load_cubemap, load_string, load_texture};

/**
 * This module contains all logic for loading mesh/textures/etc. from external files.
 *
 * Loaders resolve file names relative to the `assets/` directory next to the
 * executable. A missing mesh is a hard error; a missing texture degrades to a
 * procedural substitute with a warning so the game stays playable while
 * assets are still being authored.
 */
pub mod mesh;
pub mod obj;
pub mod texture;

/// Load an .obj file, compute its tangents and upload it as a [`model::Mesh`].
pub async fn load_model(file_name: &str, device: &wgpu::Device) -> anyhow::Result<model::Mesh> {
    let obj_text = load_string(file_name)
        .await
        .with_context(|| format!("reading model {file_name}"))?;
    let (mut vertices, indices) =
        obj::parse_obj(&obj_text).with_context(|| format!("parsing {file_name}"))?;
    mesh::compute_tangents(&mut vertices, &indices);
    Ok(mesh::build_mesh(device, file_name, &vertices, &indices))
}

/// Load a scene material from a diffuse image and an optional normal map.
///
/// Missing files are substituted rather than propagated: the diffuse map falls
/// back to a grid pattern, the normal map to the flat default.
pub async fn load_material(
    name: &str,
    diffuse_file: &str,
    normal_file: Option<&str>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> model::Material {
    let diffuse_texture = match load_texture(diffuse_file, false, device, queue).await {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Could not load {diffuse_file} ({e}). Substituting a grid texture.");
            Texture::create_fallback_grid(64, 64, device, queue)
        }
    };

    let normal_texture = match normal_file {
        Some(file_name) => match load_texture(file_name, true, device, queue).await {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Could not load {file_name} ({e}). Substituting a flat normal map.");
                Texture::create_default_normal_map(1, 1, device, queue)
            }
        },
        None => Texture::create_default_normal_map(1, 1, device, queue),
    };

    model::Material::new(device, name, diffuse_texture, normal_texture, layout)
}

/// Load the skybox material from six face images in +X, -X, +Y, -Y, +Z, -Z
/// order, falling back to a gradient sky when any face is missing.
pub async fn load_sky_material(
    name: &str,
    face_files: &[&str; 6],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Material> {
    let sky_texture = match load_cubemap(face_files, device, queue).await {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Could not load sky faces ({e}). Substituting a gradient sky.");
            Texture::create_default_cubemap(device, queue)?
        }
    };
    Ok(model::Material::sky(device, name, sky_texture, layout))
}
