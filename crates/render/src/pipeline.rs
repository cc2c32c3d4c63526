//! Concrete bindables and renderable assembly.
//!
//! Each bindable owns the device resources it created and exposes the one
//! `bind` operation; the builders assemble them into a [`Renderable`] in
//! pipeline-valid order (pipeline first, constants before the draw).

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::binding::{Bind, PassOps};
use crate::entity::{LightConstants, ObjectConstants};
use crate::mesh::{Mesh, Vertex, sky_cube_mesh};
use crate::renderable::Renderable;
use crate::shaders;

/// Render pipeline state: shader module, vertex layout, depth config.
pub struct PipelineBinding {
    pipeline: wgpu::RenderPipeline,
}

impl PipelineBinding {
    pub fn new(pipeline: wgpu::RenderPipeline) -> Self {
        Self { pipeline }
    }

    pub fn bind_group_layout(&self, index: u32) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(index)
    }
}

impl Bind for PipelineBinding {
    fn bind(&self, pass: &mut dyn PassOps) {
        pass.set_pipeline(&self.pipeline);
    }
}

/// Vertex buffer at a fixed input slot.
pub struct VertexBufferBinding {
    buffer: wgpu::Buffer,
    slot: u32,
}

impl VertexBufferBinding {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], slot: u32) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vertex_buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer, slot }
    }
}

impl Bind for VertexBufferBinding {
    fn bind(&self, pass: &mut dyn PassOps) {
        pass.set_vertex_buffer(self.slot, &self.buffer);
    }
}

/// 16-bit index buffer.
pub struct IndexBufferBinding {
    buffer: wgpu::Buffer,
}

impl IndexBufferBinding {
    pub fn new(device: &wgpu::Device, indices: &[u16]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("index_buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { buffer }
    }
}

impl Bind for IndexBufferBinding {
    fn bind(&self, pass: &mut dyn PassOps) {
        pass.set_index_buffer(&self.buffer, wgpu::IndexFormat::Uint16);
    }
}

/// Uniform buffer plus its bind group at a fixed group index. `write`
/// replaces the buffer contents through the queue.
pub struct UniformBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    group: u32,
}

impl UniformBinding {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        contents: &[u8],
        group: u32,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            bind_group,
            group,
        }
    }
}

impl Bind for UniformBinding {
    fn bind(&self, pass: &mut dyn PassOps) {
        pass.set_bind_group(self.group, &self.bind_group);
    }

    fn write(&self, queue: &wgpu::Queue, data: &[u8]) {
        queue.write_buffer(&self.buffer, 0, data);
    }
}

/// Vertex-stage constants for the sky pass: projection times the
/// rotation-only view.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkyConstants {
    pub proj_view: [[f32; 4]; 4],
}

/// Horizon/zenith gradient colors for the sky shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkyPalette {
    pub horizon: [f32; 4],
    pub zenith: [f32; 4],
}

impl SkyPalette {
    pub const DAY: Self = Self {
        horizon: [0.75, 0.85, 0.95, 1.0],
        zenith: [0.15, 0.35, 0.75, 1.0],
    };
    pub const DUSK: Self = Self {
        horizon: [0.95, 0.55, 0.30, 1.0],
        zenith: [0.10, 0.08, 0.25, 1.0],
    };
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    visibility: wgpu::ShaderStages,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Pipeline for lit scene entities.
pub fn scene_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
    let object_layout = uniform_layout(device, wgpu::ShaderStages::VERTEX, "object_layout");
    let light_layout = uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "light_layout");
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[&object_layout, &light_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Pipeline for the skybox: depth test at the far plane, no depth write.
pub fn sky_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
    let sky_layout = uniform_layout(device, wgpu::ShaderStages::VERTEX, "sky_layout");
    let palette_layout = uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "palette_layout");
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("sky_pipeline_layout"),
        bind_group_layouts: &[&sky_layout, &palette_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("sky_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SKY_SHADER.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sky_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_sky"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_sky"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Assemble a lit entity renderable: pipeline, vertex buffer, index
/// buffer, then the two constant slots.
pub fn build_scene_renderable(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    mesh: &Mesh,
) -> Renderable {
    let pipeline = PipelineBinding::new(scene_pipeline(device, format));
    let object_layout = pipeline.bind_group_layout(0);
    let light_layout = pipeline.bind_group_layout(1);

    let object = UniformBinding::new(
        device,
        &object_layout,
        bytemuck::bytes_of(&ObjectConstants::zeroed()),
        0,
    );
    let light = UniformBinding::new(
        device,
        &light_layout,
        bytemuck::bytes_of(&LightConstants::zeroed()),
        1,
    );

    let mut renderable = Renderable::new();
    renderable.add(Box::new(pipeline));
    renderable.add(Box::new(VertexBufferBinding::new(device, &mesh.vertices, 0)));
    renderable.add_index_buffer(
        Box::new(IndexBufferBinding::new(device, &mesh.indices)),
        mesh.index_count(),
    );
    renderable.add_vertex_constants(Box::new(object));
    renderable.add_pixel_constants(Box::new(light));
    renderable
}

/// Assemble the skybox renderable with its own constant slots.
pub fn build_sky_renderable(device: &wgpu::Device, format: wgpu::TextureFormat) -> Renderable {
    let mesh = sky_cube_mesh();
    let pipeline = PipelineBinding::new(sky_pipeline(device, format));
    let sky_layout = pipeline.bind_group_layout(0);
    let palette_layout = pipeline.bind_group_layout(1);

    let constants = UniformBinding::new(
        device,
        &sky_layout,
        bytemuck::bytes_of(&SkyConstants::zeroed()),
        0,
    );
    let palette = UniformBinding::new(
        device,
        &palette_layout,
        bytemuck::bytes_of(&SkyPalette::DAY),
        1,
    );

    let mut renderable = Renderable::new();
    renderable.add(Box::new(pipeline));
    renderable.add(Box::new(VertexBufferBinding::new(device, &mesh.vertices, 0)));
    renderable.add_index_buffer(
        Box::new(IndexBufferBinding::new(device, &mesh.indices)),
        mesh.index_count(),
    );
    renderable.add_vertex_constants(Box::new(constants));
    renderable.add_pixel_constants(Box::new(palette));
    renderable
}
