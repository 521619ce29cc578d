// Terrain renderer: draws the displaced plane evaluated on the CPU.

use bytemuck::{Pod, Zeroable};
use eframe::egui_wgpu::wgpu;
use eframe::egui_wgpu::wgpu::util::DeviceExt;
use glam::Mat4;

use crate::terrain::color_map::ContourBands;
use crate::terrain::frame::{TerrainFrame, TerrainVertex};
use crate::terrain::grid::TerrainGrid;

/// Matches `Uniforms` in `terrain.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// x: 1.0 when the shader must linearize colors for an sRGB target.
    pub options: [f32; 4],
    /// rgb: contour line color, w: 1.0 while banding is on.
    pub line_color: [f32; 4],
    /// x: line height, y: line thickness.
    pub contour: [f32; 4],
}

impl TerrainUniforms {
    pub fn new(view_proj: Mat4, srgb_target: bool, contours: Option<ContourBands>) -> Self {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        let (line_color, contour) = match contours {
            Some(bands) => (
                bands.color.with_alpha(1.0),
                [bands.height, bands.thickness, 0.0, 0.0],
            ),
            None => ([0.0; 4], [0.0; 4]),
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            options: [flag(srgb_target), 0.0, 0.0, 0.0],
            line_color,
            contour,
        }
    }
}

impl TerrainVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position, y already displaced
        1 => Float32,
        2 => Float32x4
    ];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Lives in egui_wgpu's callback resources for the whole session.
pub struct TerrainRenderer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,

    vertex_capacity: usize,
    vertex_count: usize,
    index_count: u32,
    srgb_target: bool,
}

impl TerrainRenderer {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        grid: &TerrainGrid,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/terrain.wgsl").into(),
            ),
        });

        // Topology never changes; only the vertex contents do.
        let vertex_capacity = grid.vertices().len();
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Terrain Vertex Buffer"),
            size: (vertex_capacity * std::mem::size_of::<TerrainVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Index Buffer"),
            contents: bytemuck::cast_slice(grid.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let srgb_target = target_format.is_srgb();
        let uniforms = TerrainUniforms::new(Mat4::IDENTITY, srgb_target, None);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Uniforms Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Terrain Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Terrain Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Terrain Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // egui's pass has no depth attachment: rows are emitted far to near
        // so later triangles correctly overdraw earlier ones.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[TerrainVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::info!(
            "terrain renderer ready: {} vertices, {} indices, target {:?}",
            vertex_capacity,
            grid.indices().len(),
            target_format
        );

        Self {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            vertex_capacity,
            vertex_count: 0,
            index_count: grid.indices().len() as u32,
            srgb_target,
        }
    }

    /// Copy one evaluated frame, its contour settings and the camera
    /// matrix to the GPU.
    pub fn upload(&mut self, queue: &wgpu::Queue, frame: &TerrainFrame, view_proj: Mat4) {
        if frame.vertices.len() > self.vertex_capacity {
            log::warn!(
                "frame has {} vertices, buffer holds {}; skipping upload",
                frame.vertices.len(),
                self.vertex_capacity
            );
            self.vertex_count = 0;
            return;
        }
        queue.write_buffer(&self.vertex_buffer, 0, frame.as_bytes());
        self.vertex_count = frame.vertices.len();

        let uniforms = TerrainUniforms::new(view_proj, self.srgb_target, frame.contours);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'static>) {
        if self.vertex_count == 0 {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
