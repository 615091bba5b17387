use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::gfx::{
    slot_components, BufferId, FrameStatus, GraphicsDevice, GraphicsError, RenderBackend,
    ShadingStage, TextureId, VertexArrayId, POSITION_COMPONENTS, POSITION_SLOT,
    TEX_COORD_COMPONENTS, TEX_COORD_SLOT,
};
use crate::resource::RawImage;
use crate::scene::{Camera, CameraConfig};

use super::gpu::{Gpu, GpuFrame, SurfaceErrorAction};

/// Initial number of per-entity uniform slots; grows by doubling.
const INITIAL_ENTITY_SLOTS: usize = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct EntityUniform {
    offset: [f32; 4],
}

/// Buffers bound to one vertex array.
#[derive(Debug, Default)]
struct VertexArrayRecord {
    index: Option<(BufferId, u32)>,
    position: Option<BufferId>,
    tex_coord: Option<BufferId>,
}

struct TextureEntry {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// One recorded draw, replayed at `present`.
#[derive(Debug, Copy, Clone)]
struct RecordedDraw {
    vao: VertexArrayId,
    texture: Option<TextureId>,
    index_count: u32,
    entity_slot: usize,
}

/// Pipeline and uniforms owned by the shading stage. Dropped by `release`.
struct StageResources {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    globals_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    camera_ubo: wgpu::Buffer,
    entity_ubo: wgpu::Buffer,
    entity_capacity: usize,
    globals: wgpu::BindGroup,
}

/// `RenderBackend` on top of wgpu.
///
/// Handles are indices into per-kind tables. Draw calls between `start` and `stop` are
/// recorded and replayed into a single render pass when the frame is presented, so the
/// pass never borrows the tables while they can still change.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    camera: CameraConfig,
    clear_color: wgpu::Color,

    next_handle: u32,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayRecord>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, TextureEntry>,

    stage: Option<StageResources>,
    entity_stride: u64,

    frame: Option<GpuFrame>,
    recording: bool,
    view_proj: Mat4,
    offsets: Vec<EntityUniform>,
    draws: Vec<RecordedDraw>,
    bound_vao: Option<VertexArrayId>,
    bound_texture: Option<TextureId>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>, camera: CameraConfig, clear_color: wgpu::Color) -> Self {
        let align = u64::from(gpu.device().limits().min_uniform_buffer_offset_alignment);
        let entity_stride = align_up(std::mem::size_of::<EntityUniform>() as u64, align);
        let stage = create_stage(&gpu, entity_stride);

        Self {
            gpu,
            camera,
            clear_color,
            next_handle: 1,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            stage: Some(stage),
            entity_stride,
            frame: None,
            recording: false,
            view_proj: Mat4::IDENTITY,
            offsets: Vec::new(),
            draws: Vec::new(),
            bound_vao: None,
            bound_texture: None,
        }
    }

    fn next_id(&mut self, resource: &'static str) -> Result<u32, GraphicsError> {
        let id = self.next_handle;
        self.next_handle = id
            .checked_add(1)
            .ok_or(GraphicsError::ResourceExhausted { resource })?;
        Ok(id)
    }

    fn check_buffer_size(&self, bytes: usize, resource: &'static str) -> Result<(), GraphicsError> {
        if bytes as u64 > self.gpu.device().limits().max_buffer_size {
            log::error!("{resource}: {bytes} bytes exceeds device limit");
            return Err(GraphicsError::ResourceExhausted { resource });
        }
        Ok(())
    }

    fn record_mut(&mut self, vao: VertexArrayId) -> Result<&mut VertexArrayRecord, GraphicsError> {
        self.vertex_arrays
            .get_mut(&vao)
            .ok_or(GraphicsError::UnknownHandle {
                kind: "vertex array",
                id: vao.0,
            })
    }

    /// Grows the entity uniform buffer to hold `needed` slots, rebuilding the globals bind group.
    fn ensure_entity_capacity(&mut self, needed: usize) {
        let stride = self.entity_stride;
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        if needed <= stage.entity_capacity {
            return;
        }

        let capacity = needed.next_power_of_two().max(INITIAL_ENTITY_SLOTS);
        let device = self.gpu.device();
        stage.entity_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ceres entity ubo"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        stage.globals = create_globals(
            device,
            &stage.globals_layout,
            &stage.camera_ubo,
            &stage.entity_ubo,
        );
        stage.entity_capacity = capacity;
        log::debug!("entity uniform buffer grown to {capacity} slots");
    }

    fn encode_draws(&mut self, frame: &mut GpuFrame) {
        self.ensure_entity_capacity(self.offsets.len());
        let Some(stage) = self.stage.as_ref() else {
            return;
        };
        let queue = self.gpu.queue();

        let aspect = self.gpu.aspect();
        let view_proj = self.camera.projection(aspect) * self.view_proj;
        queue.write_buffer(
            &stage.camera_ubo,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );

        let stride = self.entity_stride as usize;
        let mut staging = vec![0u8; stride * self.offsets.len()];
        for (i, offset) in self.offsets.iter().enumerate() {
            let at = i * stride;
            staging[at..at + std::mem::size_of::<EntityUniform>()]
                .copy_from_slice(bytemuck::bytes_of(offset));
        }
        if !staging.is_empty() {
            queue.write_buffer(&stage.entity_ubo, 0, &staging);
        }

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ceres entity pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&stage.pipeline);

        for draw in &self.draws {
            let Some(record) = self.vertex_arrays.get(&draw.vao) else {
                log::warn!("draw skipped: {} is not live", draw.vao);
                continue;
            };
            let (Some((index_id, _)), Some(pos_id), Some(uv_id)) =
                (record.index, record.position, record.tex_coord)
            else {
                log::warn!("draw skipped: {} is missing buffers", draw.vao);
                continue;
            };
            let (Some(index), Some(pos), Some(uv)) = (
                self.buffers.get(&index_id),
                self.buffers.get(&pos_id),
                self.buffers.get(&uv_id),
            ) else {
                log::warn!("draw skipped: {} references released buffers", draw.vao);
                continue;
            };
            let Some(texture) = draw.texture.and_then(|t| self.textures.get(&t)) else {
                log::warn!("draw skipped: no live texture bound for {}", draw.vao);
                continue;
            };

            let dynamic_offset = (draw.entity_slot * stride) as u32;
            rpass.set_bind_group(0, &stage.globals, &[dynamic_offset]);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.set_vertex_buffer(0, pos.slice(..));
            rpass.set_vertex_buffer(1, uv.slice(..));
            rpass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }
}

impl GraphicsDevice for WgpuBackend<'_> {
    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GraphicsError> {
        let id = VertexArrayId(self.next_id("vertex array")?);
        self.vertex_arrays.insert(id, VertexArrayRecord::default());
        Ok(id)
    }

    fn create_index_buffer(
        &mut self,
        vao: VertexArrayId,
        indices: &[u32],
    ) -> Result<BufferId, GraphicsError> {
        self.record_mut(vao)?;
        self.check_buffer_size(std::mem::size_of_val(indices), "index buffer")?;
        let id = BufferId(self.next_id("index buffer")?);

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ceres index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.buffers.insert(id, buffer);
        self.record_mut(vao)?.index = Some((id, indices.len() as u32));
        Ok(id)
    }

    fn create_attribute_buffer(
        &mut self,
        vao: VertexArrayId,
        slot: u32,
        components: u32,
        data: &[f32],
    ) -> Result<BufferId, GraphicsError> {
        self.record_mut(vao)?;
        match slot_components(slot) {
            Some(expected) if expected == components => {}
            expected => {
                return Err(GraphicsError::LayoutMismatch {
                    slot,
                    expected: expected.unwrap_or(0),
                    actual: components,
                });
            }
        }
        self.check_buffer_size(std::mem::size_of_val(data), "attribute buffer")?;
        let id = BufferId(self.next_id("attribute buffer")?);

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ceres attribute buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.buffers.insert(id, buffer);

        let record = self.record_mut(vao)?;
        if slot == POSITION_SLOT {
            record.position = Some(id);
        } else {
            record.tex_coord = Some(id);
        }
        Ok(id)
    }

    fn create_texture(&mut self, image: &RawImage) -> Result<TextureId, GraphicsError> {
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            log::error!(
                "texture {}x{} outside device limits (max {max})",
                image.width,
                image.height
            );
            return Err(GraphicsError::ResourceExhausted { resource: "texture" });
        }
        let Some(stage) = self.stage.as_ref() else {
            return Err(GraphicsError::ResourceExhausted { resource: "texture" });
        };

        let device = self.gpu.device();
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ceres entity texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ceres texture bind group"),
            layout: &stage.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&stage.sampler),
                },
            ],
        });

        let id = TextureId(self.next_id("texture")?);
        self.textures.insert(id, TextureEntry { texture, bind_group });
        Ok(id)
    }

    fn destroy_vertex_array(&mut self, id: VertexArrayId) {
        if self.vertex_arrays.remove(&id).is_none() {
            log::warn!("destroy of unknown {id} ignored");
        }
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        match self.buffers.remove(&id) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("destroy of unknown {id} ignored"),
        }
    }

    fn destroy_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id) {
            Some(entry) => entry.texture.destroy(),
            None => log::warn!("destroy of unknown {id} ignored"),
        }
    }
}

impl ShadingStage for WgpuBackend<'_> {
    fn start(&mut self) {
        self.recording = true;
        self.draws.clear();
        self.offsets.clear();
        self.offsets.push(EntityUniform { offset: [0.0; 4] });
        self.bound_vao = None;
        self.bound_texture = None;
    }

    fn stop(&mut self) {
        self.recording = false;
    }

    fn load_view_matrix(&mut self, camera: &Camera) {
        self.view_proj = camera.view_matrix();
    }

    fn load_entity_offset(&mut self, offset: [f32; 3]) {
        if !self.recording {
            return;
        }
        let [x, y, z] = offset;
        self.offsets.push(EntityUniform { offset: [x, y, z, 0.0] });
    }

    fn bind_vertex_array(&mut self, id: VertexArrayId) {
        self.bound_vao = Some(id);
    }

    fn bind_texture(&mut self, _unit: u32, id: TextureId) {
        self.bound_texture = Some(id);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        if !self.recording {
            log::warn!("draw outside start/stop ignored");
            return;
        }
        let Some(vao) = self.bound_vao else {
            log::warn!("draw with no vertex array bound ignored");
            return;
        };
        self.draws.push(RecordedDraw {
            vao,
            texture: self.bound_texture,
            index_count,
            entity_slot: self.offsets.len().saturating_sub(1),
        });
    }

    fn unbind(&mut self) {
        self.bound_vao = None;
        self.bound_texture = None;
    }

    fn release(&mut self) {
        if self.stage.take().is_some() {
            log::debug!("shading stage released");
        }
        self.draws.clear();
        self.offsets.clear();
    }
}

impl RenderBackend for WgpuBackend<'_> {
    fn prepare(&mut self) -> FrameStatus {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStatus::Fatal,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        FrameStatus::Skip
                    }
                };
            }
        };

        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ceres clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(frame);
        FrameStatus::Ready
    }

    fn present(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            log::warn!("present without a prepared frame");
            return;
        };
        if !self.draws.is_empty() {
            self.encode_draws(&mut frame);
        }
        self.gpu.submit(frame);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    let align = align.max(1);
    value.div_ceil(align) * align
}

fn create_stage(gpu: &Gpu<'_>, entity_stride: u64) -> StageResources {
    let device = gpu.device();

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("ceres textured quad shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/textured_quad.wgsl").into()),
    });

    let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ceres globals bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniform>() as u64,
                    ),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<EntityUniform>() as u64,
                    ),
                },
                count: None,
            },
        ],
    });

    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ceres texture bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
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
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("ceres textured quad pipeline layout"),
        bind_group_layouts: &[&globals_layout, &texture_layout],
        immediate_size: 0,
    });

    let position_attrs = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: POSITION_SLOT,
    }];
    let tex_coord_attrs = [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: TEX_COORD_SLOT,
    }];
    let vertex_buffers = [
        wgpu::VertexBufferLayout {
            array_stride: (POSITION_COMPONENTS as usize * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &position_attrs,
        },
        wgpu::VertexBufferLayout {
            array_stride: (TEX_COORD_COMPONENTS as usize * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &tex_coord_attrs,
        },
    ];

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("ceres textured quad pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &vertex_buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: gpu.surface_format(),
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Paint order is the only depth ordering.
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("ceres entity sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    });

    let camera_ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("ceres camera ubo"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let entity_ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("ceres entity ubo"),
        size: entity_stride * INITIAL_ENTITY_SLOTS as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let globals = create_globals(device, &globals_layout, &camera_ubo, &entity_ubo);

    StageResources {
        pipeline,
        texture_layout,
        globals_layout,
        sampler,
        camera_ubo,
        entity_ubo,
        entity_capacity: INITIAL_ENTITY_SLOTS,
        globals,
    }
}

fn create_globals(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    camera_ubo: &wgpu::Buffer,
    entity_ubo: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ceres globals bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: entity_ubo,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<EntityUniform>() as u64),
                }),
            },
        ],
    })
}
