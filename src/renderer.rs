//! Frame rendering: scene setup and the fixed per-frame pass sequence.
//!
//! Each frame runs three passes in a strict order. The scene pass draws every
//! entity and then the skybox into the offscreen color target. The blur pass
//! samples that target and writes the blurred result to the back buffer. The
//! overlay pass draws the HUD on top of the blurred image. The blur pass is
//! the only scope where the offscreen target is bound as an input, and it
//! ends before the encoder is finished, so the target can be a render
//! attachment again on the next frame.

use std::iter;

use anyhow::Result;
use cgmath::{Deg, Point3};

use crate::camera::{Camera, CameraResources, Projection};
use crate::context::Context;
use crate::data_structures::entity::InstanceRaw;
use crate::data_structures::model::DrawScene;
use crate::data_structures::registry::SceneRegistry;
use crate::data_structures::texture::Texture;
use crate::game::{self, Game, SceneHandles};
use crate::pipelines::blur::BlurResources;
use crate::pipelines::lights::LightsResources;
use crate::pipelines::overlay::{self, OverlayContext};
use crate::pipelines::scene::mk_scene_pipeline;
use crate::pipelines::skybox::SkyboxResources;
use crate::resources;

/// Instance buffer capacity. The scene holds one player, at most two platform
/// segments and the fixed collectible pool, so this never fills up.
const MAX_INSTANCES: usize = 64;

const CLEAR_COLOUR: wgpu::Color = wgpu::Color {
    r: 0.4,
    g: 0.6,
    b: 0.75,
    a: 1.0,
};

/// Skybox cubemap faces in +X, -X, +Y, -Y, +Z, -Z order.
const SKY_FACES: [&str; 6] = [
    "sky_px.png",
    "sky_nx.png",
    "sky_py.png",
    "sky_ny.png",
    "sky_pz.png",
    "sky_nz.png",
];

pub struct Renderer {
    pub camera: CameraResources,
    pub projection: Projection,
    lights: LightsResources,
    scene_pipeline: wgpu::RenderPipeline,
    skybox: SkyboxResources,
    blur: BlurResources,
    overlay: OverlayContext,
    instance_buffer: wgpu::Buffer,
}

impl Renderer {
    /// Build all pipelines and load the scene's meshes and materials into the
    /// registry. Missing mesh files are fatal; missing textures degrade to
    /// procedural substitutes inside the loaders.
    pub async fn new(
        ctx: &Context,
        registry: &mut SceneRegistry,
    ) -> Result<(Self, SceneHandles)> {
        let device = &ctx.device;
        let queue = &ctx.queue;
        let config = &ctx.config;

        // Yaw 90 degrees looks down +z, the direction of travel.
        let camera = Camera::new((0.0, 0.0, -game::CAMERA_TRAIL), Deg(90.0), Deg(0.0));
        let projection = Projection::new(config.width, config.height, Deg(45.0), 0.1, 500.0);
        let camera = CameraResources::new(camera, &projection, device);

        let lights = LightsResources::new(device);

        let scene_pipeline = mk_scene_pipeline(
            device,
            config,
            &lights.bind_group_layout,
            &camera.bind_group_layout,
        );
        let skybox = SkyboxResources::new(device, config);
        let blur = BlurResources::new(device, config, &ctx.scene_target);

        let mut overlay = OverlayContext::new(device, queue, config).await?;
        let topbar = match resources::texture::load_texture("topbar.png", false, device, queue)
            .await
        {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Could not load topbar.png ({e}). Substituting a grid texture.");
                Texture::create_fallback_grid(256, 32, device, queue)
            }
        };
        overlay.add_image(device, "topbar", &topbar);

        let material_layout = resources::texture::diffuse_normal_layout(device);
        let sky_layout = resources::texture::sky_layout(device);

        let cube = registry.add_mesh(resources::load_model("cube.obj", device).await?);
        let sphere = registry.add_mesh(resources::load_model("sphere.obj", device).await?);

        let player_material = registry.add_material(
            resources::load_material(
                "player",
                "player_diffuse.png",
                Some("player_normal.png"),
                device,
                queue,
                &material_layout,
            )
            .await,
        );
        let platform_material = registry.add_material(
            resources::load_material(
                "platform",
                "platform_diffuse.png",
                Some("platform_normal.png"),
                device,
                queue,
                &material_layout,
            )
            .await,
        );
        let collectible_material = registry.add_material(
            resources::load_material(
                "collectible",
                "collectible_diffuse.png",
                None,
                device,
                queue,
                &material_layout,
            )
            .await,
        );
        let sky_material = registry
            .add_material(resources::load_sky_material("sky", &SKY_FACES, device, queue, &sky_layout).await?);

        let handles = SceneHandles {
            player_mesh: cube,
            player_material,
            platform_mesh: cube,
            platform_material,
            collectible_mesh: sphere,
            collectible_material,
            sky_mesh: cube,
            sky_material,
        };

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok((
            Self {
                camera,
                projection,
                lights,
                scene_pipeline,
                skybox,
                blur,
                overlay,
                instance_buffer,
            },
            handles,
        ))
    }

    pub fn render(
        &mut self,
        ctx: &Context,
        registry: &SceneRegistry,
        game: &Game,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Per-frame uniforms. The camera trails the player on the track axis;
        // the skybox gets the translation-stripped view so it never moves.
        let player_z = game.player.transform.position.z;
        self.camera.camera.position = Point3::new(0.0, 0.0, player_z - game::CAMERA_TRAIL);
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        ctx.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.lights.write(&ctx.queue);
        self.skybox.write(
            &ctx.queue,
            self.projection.calc_matrix() * self.camera.camera.rotation_matrix(),
        );

        // One instance buffer for the whole scene, grouped so each mesh is
        // drawn with a single instanced call.
        let mut instances: Vec<InstanceRaw> =
            Vec::with_capacity(1 + game.track.len() + game.collectibles.len());
        instances.push(game.player.to_raw());
        for segment in game.track.segments() {
            instances.push(segment.to_raw());
        }
        let platforms = 1..(1 + game.track.len() as u32);
        for collectible in game.collectibles.iter() {
            instances.push(collectible.to_raw());
        }
        let collectibles = platforms.end..(platforms.end + game.collectibles.len() as u32);
        ctx.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        self.overlay.begin();
        self.overlay
            .draw_image("topbar", 0.0, 0.0, overlay::VIRTUAL_WIDTH, 50.0);
        self.overlay
            .draw_string(&format!("SCORE {:06}", game.score), 20.0, 10.0, 20.0, 30.0);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &ctx.scene_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.scene_pipeline);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw_mesh_instanced(
                registry.mesh(game.player.mesh),
                registry.material(game.player.material),
                0..1,
                &self.camera.bind_group,
                &self.lights.bind_group,
            );
            if let Some(segment) = game.track.segments().next() {
                render_pass.draw_mesh_instanced(
                    registry.mesh(segment.mesh),
                    registry.material(segment.material),
                    platforms,
                    &self.camera.bind_group,
                    &self.lights.bind_group,
                );
            }
            if let Some(collectible) = game.collectibles.iter().next() {
                render_pass.draw_mesh_instanced(
                    registry.mesh(collectible.mesh),
                    registry.material(collectible.material),
                    collectibles,
                    &self.camera.bind_group,
                    &self.lights.bind_group,
                );
            }

            // The sky goes last in the same pass; its pipeline draws where the
            // depth buffer is still clear.
            let sky_mesh = registry.mesh(game.sky.mesh);
            let sky_material = registry.material(game.sky.material);
            render_pass.set_pipeline(&self.skybox.render_pipeline);
            render_pass.set_bind_group(0, &sky_material.bind_group, &[]);
            render_pass.set_bind_group(1, &self.skybox.bind_group, &[]);
            render_pass.set_vertex_buffer(0, sky_mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(sky_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..sky_mesh.num_elements, 0, 0..1);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blur Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.blur.draw(&mut render_pass);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.overlay.flush(&ctx.queue, &mut render_pass);
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Follow a surface resize: fix the projection's aspect ratio and point
    /// the blur pass at the recreated offscreen target.
    pub fn resize(&mut self, ctx: &Context) {
        self.projection.resize(ctx.config.width, ctx.config.height);
        self.blur
            .rebind_input(&ctx.device, &ctx.queue, &ctx.config, &ctx.scene_target);
    }
}
