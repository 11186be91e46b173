use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::scene::mk_render_pipeline,
    resources::texture::sky_layout,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    pub proj_view: [[f32; 4]; 4],
}

/// Skybox pass state: the rotation-only camera matrix and the pipeline that
/// draws the cube from the inside at maximum depth.
pub struct SkyboxResources {
    pub uniform: SkyUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub render_pipeline: wgpu::RenderPipeline,
}

impl SkyboxResources {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        use cgmath::SquareMatrix;

        let uniform = SkyUniform {
            proj_view: cgmath::Matrix4::identity().into(),
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("Sky Bind Group Layout"),
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("Sky Bind Group"),
        });
        let render_pipeline = mk_skybox_pipeline(device, config, &bind_group_layout);

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            render_pipeline,
        }
    }

    /// Upload projection * rotation-only-view for this frame. Translation must
    /// already be stripped so the sky never parallaxes.
    pub fn write(&mut self, queue: &wgpu::Queue, proj_view: cgmath::Matrix4<f32>) {
        self.uniform.proj_view = proj_view.into();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// The cube is watched from the inside, so front faces are culled instead of
/// back faces, and the less-or-equal test lets the far-plane-pinned sky pass
/// where nothing was drawn.
fn mk_skybox_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sky_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[&sky_layout(device), sky_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        wgpu::CompareFunction::LessEqual,
        false,
        Some(wgpu::Face::Front),
        &[ModelVertex::desc()],
        shader,
    )
}
