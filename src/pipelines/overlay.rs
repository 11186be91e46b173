use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    pipelines::{blur::ScreenVertex, scene::mk_render_pipeline},
    resources::texture::load_texture,
};

/// HUD coordinates are authored against this virtual screen and mapped to NDC
/// at quad-generation time, so layouts survive window resizes untouched.
pub const VIRTUAL_WIDTH: f32 = 1000.0;
pub const VIRTUAL_HEIGHT: f32 = 750.0;

const MAX_QUADS: usize = 256;

/// The glyph atlas is a 16x6 grid covering ASCII 32..127 in row-major order.
const ATLAS_COLUMNS: u32 = 16;
const ATLAS_ROWS: u32 = 6;
const FIRST_GLYPH: u8 = b' ';

#[derive(Clone, PartialEq, Eq, Hash)]
enum BatchKey {
    Font,
    Image(String),
}

struct QuadBatch {
    key: BatchKey,
    first_quad: u32,
    quad_count: u32,
}

/// An explicitly owned 2D overlay: the caller constructs it, registers the
/// images it wants, then per frame calls [`begin`](Self::begin), queues
/// quads via [`draw_image`](Self::draw_image)/[`draw_string`](Self::draw_string)
/// and submits them with [`flush`](Self::flush) inside the HUD render pass.
///
/// Quads are collected CPU-side into one persistent vertex buffer and drawn
/// in submission order, batched by texture.
pub struct OverlayContext {
    render_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    font_bind_group: wgpu::BindGroup,
    image_bind_groups: HashMap<String, wgpu::BindGroup>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertices: Vec<ScreenVertex>,
    batches: Vec<QuadBatch>,
}

impl OverlayContext {
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
    ) -> anyhow::Result<Self> {
        let bind_group_layout = mk_bind_group_layout(device);
        let render_pipeline = mk_overlay_pipeline(device, config, &bind_group_layout);

        let font_texture = match load_texture("font.png", false, device, queue).await {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Could not load font.png ({e}). Substituting the built-in glyph atlas.");
                build_builtin_atlas(device, queue)?
            }
        };
        let font_bind_group = mk_bind_group(device, &bind_group_layout, &font_texture);

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Vertex Buffer"),
            size: (MAX_QUADS * 4 * std::mem::size_of::<ScreenVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // The index pattern never changes, only how much of it a frame uses.
        let mut indices: Vec<u32> = Vec::with_capacity(MAX_QUADS * 6);
        for q in 0..MAX_QUADS as u32 {
            for offset in [0, 1, 2, 0, 2, 3] {
                indices.push(q * 4 + offset);
            }
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            render_pipeline,
            bind_group_layout,
            font_bind_group,
            image_bind_groups: HashMap::new(),
            vertex_buffer,
            index_buffer,
            vertices: Vec::new(),
            batches: Vec::new(),
        })
    }

    /// Register a texture under a name usable with [`draw_image`](Self::draw_image).
    pub fn add_image(&mut self, device: &wgpu::Device, name: &str, texture: &Texture) {
        let bind_group = mk_bind_group(device, &self.bind_group_layout, texture);
        self.image_bind_groups.insert(name.to_string(), bind_group);
    }

    /// Start a fresh frame of quads.
    pub fn begin(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    /// Queue a registered image at virtual-screen coordinates.
    pub fn draw_image(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) {
        if !self.image_bind_groups.contains_key(name) {
            log::warn!("Overlay image {name:?} was never registered, skipping.");
            return;
        }
        self.push_quad(
            BatchKey::Image(name.to_string()),
            x,
            y,
            width,
            height,
            [0.0, 0.0, 1.0, 1.0],
        );
    }

    /// Queue a line of text; each glyph is one quad of the given cell size.
    pub fn draw_string(&mut self, text: &str, x: f32, y: f32, char_width: f32, char_height: f32) {
        let mut pen_x = x;
        for c in text.chars() {
            if c != ' ' {
                self.push_quad(
                    BatchKey::Font,
                    pen_x,
                    y,
                    char_width,
                    char_height,
                    glyph_uv(c),
                );
            }
            pen_x += char_width;
        }
    }

    /// Upload the frame's quads and issue one draw per texture batch. Must run
    /// inside a render pass targeting the back buffer with load (not clear).
    pub fn flush(&mut self, queue: &wgpu::Queue, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.batches.is_empty() {
            return;
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for batch in &self.batches {
            let bind_group = match &batch.key {
                BatchKey::Font => &self.font_bind_group,
                // Registration was checked at queue time.
                BatchKey::Image(name) => match self.image_bind_groups.get(name) {
                    Some(bind_group) => bind_group,
                    None => continue,
                },
            };
            render_pass.set_bind_group(0, bind_group, &[]);
            let first = batch.first_quad * 6;
            let last = (batch.first_quad + batch.quad_count) * 6;
            render_pass.draw_indexed(first..last, 0, 0..1);
        }
    }

    fn push_quad(&mut self, key: BatchKey, x: f32, y: f32, width: f32, height: f32, uv: [f32; 4]) {
        let quad_index = (self.vertices.len() / 4) as u32;
        if quad_index as usize >= MAX_QUADS {
            log::warn!("Overlay quad budget ({MAX_QUADS}) exhausted, dropping quad.");
            return;
        }

        let (left, top) = virtual_to_ndc(x, y);
        let (right, bottom) = virtual_to_ndc(x + width, y + height);
        let [u0, v0, u1, v1] = uv;
        self.vertices.extend_from_slice(&[
            ScreenVertex {
                position: [left, top, 0.0],
                tex_coords: [u0, v0],
            },
            ScreenVertex {
                position: [left, bottom, 0.0],
                tex_coords: [u0, v1],
            },
            ScreenVertex {
                position: [right, bottom, 0.0],
                tex_coords: [u1, v1],
            },
            ScreenVertex {
                position: [right, top, 0.0],
                tex_coords: [u1, v0],
            },
        ]);

        match self.batches.last_mut() {
            Some(batch) if batch.key == key => batch.quad_count += 1,
            _ => self.batches.push(QuadBatch {
                key,
                first_quad: quad_index,
                quad_count: 1,
            }),
        }
    }
}

/// Map a virtual-screen point to NDC. (0,0) is the top-left corner.
fn virtual_to_ndc(x: f32, y: f32) -> (f32, f32) {
    (
        x / VIRTUAL_WIDTH * 2.0 - 1.0,
        1.0 - y / VIRTUAL_HEIGHT * 2.0,
    )
}

/// UV rectangle of a character's cell in the atlas grid. Characters outside
/// printable ASCII fall back to '?'.
fn glyph_uv(c: char) -> [f32; 4] {
    let code = if c.is_ascii() && !c.is_ascii_control() {
        c as u32 as u8
    } else {
        b'?'
    };
    let index = (code - FIRST_GLYPH) as u32;
    let col = index % ATLAS_COLUMNS;
    let row = index / ATLAS_COLUMNS;
    [
        col as f32 / ATLAS_COLUMNS as f32,
        row as f32 / ATLAS_ROWS as f32,
        (col + 1) as f32 / ATLAS_COLUMNS as f32,
        (row + 1) as f32 / ATLAS_ROWS as f32,
    ]
}

fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Overlay texture_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
        label: Some("Overlay Bind Group"),
    })
}

fn mk_overlay_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Overlay Render Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Overlay Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            color: wgpu::BlendComponent::OVER,
            alpha: wgpu::BlendComponent::OVER,
        }),
        None,
        wgpu::CompareFunction::Less,
        false,
        Some(wgpu::Face::Back),
        &[ScreenVertex::desc()],
        shader,
    )
}

/// 5x7 glyph bitmaps for the characters the HUD actually uses, one byte per
/// row with the leftmost pixel in bit 4. Used when no font.png is shipped.
#[rustfmt::skip]
const BUILTIN_GLYPHS: &[(u8, [u8; 7])] = &[
    (b'0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    (b'1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    (b'2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    (b'3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    (b'4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    (b'5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    (b'6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    (b'7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    (b'8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    (b'9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    (b'A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    (b'B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    (b'C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    (b'D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    (b'E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    (b'F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    (b'G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    (b'H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    (b'I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    (b'J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    (b'K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    (b'L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    (b'M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    (b'N', [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
    (b'O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    (b'P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    (b'Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    (b'R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    (b'S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    (b'T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    (b'U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    (b'V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    (b'W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001]),
    (b'X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    (b'Y', [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
    (b'Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
];

/// Render the substitute glyph atlas: white glyphs on transparent cells in
/// the 16x6 layout described above. Characters without a bitmap (punctuation
/// mostly) come out as filled blocks; lowercase letters reuse the uppercase
/// shapes.
fn build_builtin_atlas(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Texture> {
    const CELL: u32 = 16;
    const SCALE: u32 = 2;
    let width = ATLAS_COLUMNS * CELL;
    let height = ATLAS_ROWS * CELL;
    let mut img = image::RgbaImage::new(width, height);

    let white = image::Rgba([255u8, 255, 255, 255]);
    for code in FIRST_GLYPH..127 {
        let index = (code - FIRST_GLYPH) as u32;
        let cell_x = (index % ATLAS_COLUMNS) * CELL;
        let cell_y = (index / ATLAS_COLUMNS) * CELL;

        if code == b' ' {
            continue;
        }
        let lookup = code.to_ascii_uppercase();
        match BUILTIN_GLYPHS.iter().find(|(c, _)| *c == lookup) {
            Some((_, rows)) => {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..5u32 {
                        if bits & (1 << (4 - col)) == 0 {
                            continue;
                        }
                        // 5x7 scaled by 2 and centered in the 16x16 cell.
                        for dy in 0..SCALE {
                            for dx in 0..SCALE {
                                img.put_pixel(
                                    cell_x + 3 + col * SCALE + dx,
                                    cell_y + 1 + row as u32 * SCALE + dy,
                                    white,
                                );
                            }
                        }
                    }
                }
            }
            None => {
                for dy in 2..(CELL - 2) {
                    for dx in 2..(CELL - 2) {
                        img.put_pixel(cell_x + dx, cell_y + dy, white);
                    }
                }
            }
        }
    }

    Texture::from_image(
        device,
        queue,
        &image::DynamicImage::ImageRgba8(img),
        Some("builtin glyph atlas"),
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_screen_corners_map_to_ndc_corners() {
        assert_eq!(virtual_to_ndc(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(virtual_to_ndc(VIRTUAL_WIDTH, VIRTUAL_HEIGHT), (1.0, -1.0));
        assert_eq!(virtual_to_ndc(500.0, 375.0), (0.0, 0.0));
    }

    #[test]
    fn glyph_cells_follow_ascii_order() {
        // ' ' is the first cell.
        assert_eq!(glyph_uv(' ')[0], 0.0);
        assert_eq!(glyph_uv(' ')[1], 0.0);
        // '0' is code 48, cell 16, so first cell of the second row.
        let uv = glyph_uv('0');
        assert_eq!(uv[0], 0.0);
        assert!((uv[1] - 1.0 / ATLAS_ROWS as f32).abs() < f32::EPSILON);
        // 'A' is code 65, cell 33, so second cell of the third row.
        let uv = glyph_uv('A');
        assert!((uv[0] - 1.0 / ATLAS_COLUMNS as f32).abs() < f32::EPSILON);
        assert!((uv[1] - 2.0 / ATLAS_ROWS as f32).abs() < f32::EPSILON);
    }

    #[test]
    fn non_ascii_falls_back_to_question_mark() {
        assert_eq!(glyph_uv('é'), glyph_uv('?'));
        assert_eq!(glyph_uv('\n'), glyph_uv('?'));
    }

    #[test]
    fn every_builtin_glyph_row_fits_five_bits() {
        for (c, rows) in BUILTIN_GLYPHS {
            for bits in rows {
                assert!(*bits < 0b100000, "glyph {:?} overflows its cell", *c as char);
            }
        }
    }
}
