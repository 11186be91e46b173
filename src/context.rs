//! Window and GPU context.
//!
//! [`Context`] owns everything tied to the window and the device: the surface,
//! its configuration and the two size-dependent render targets (depth buffer
//! and the offscreen color target the scene is drawn into before the blur
//! pass reads it back). Scene resources and pipelines live in
//! [`crate::renderer`]; the context is handed to them by reference.

use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::data_structures::texture::Texture;

#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_texture: Texture,
    pub scene_target: Texture,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are authored against an sRGB surface; a linear format would
        // come out too dark.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        log::info!(
            "Surface {}x{}, format {:?}",
            size.width,
            size.height,
            surface_format
        );
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let scene_target = Texture::create_render_target(&device, &config, "scene_target");

        // The surface is configured on the first `Resized` event, which winit
        // delivers once the window actually exists at its final size.
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            scene_target,
        })
    }

    /// Reconfigure the surface and recreate the size-dependent targets.
    /// Callers must not pass an empty size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.scene_target = Texture::create_render_target(&self.device, &self.config, "scene_target");
    }
}
