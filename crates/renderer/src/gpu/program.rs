use hotswap::{EngineError, ShaderSource};

use crate::compile::{compile_stage, format_message, wrap_program, CompiledStage, Stage};
use crate::types::ShaderCompiler;

use super::context::{TargetFormat, DEPTH_FORMAT};
use super::primitives::Vertex;
use super::uniforms::SCENE_UNIFORMS_SIZE;

/// Layouts shared by every program so any of them can be bound against any target.
pub(crate) struct ProgramLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

impl ProgramLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(SCENE_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("program pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        Self {
            uniform_layout,
            pipeline_layout,
        }
    }
}

/// A linked vertex/fragment pair with its own uniform storage.
pub struct GpuProgram {
    pub id: u64,
    pub fill: wgpu::RenderPipeline,
    pub wire: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuProgram {
    pub fn pipeline(&self, wireframe: bool) -> &wgpu::RenderPipeline {
        if wireframe {
            &self.wire
        } else {
            &self.fill
        }
    }

    pub fn destroy(self) {
        self.uniform_buffer.destroy();
    }
}

/// Output of [`build_program`]: the program plus compiler messages that are errors
/// (`errors`) or only worth logging (`warnings`).
pub(crate) struct ProgramBuild {
    pub program: GpuProgram,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Wraps, compiles and links `source`.
///
/// Invalid modules still yield pipeline objects; the failure surfaces through the
/// device error scope and the returned `errors`, which the caller must inspect.
pub(crate) fn build_program(
    device: &wgpu::Device,
    layouts: &ProgramLayouts,
    format: TargetFormat,
    compiler: ShaderCompiler,
    id: u64,
    source: &ShaderSource,
) -> Result<ProgramBuild, EngineError> {
    let wrapped = wrap_program(source);
    let vertex = compile_stage(
        device,
        &format!("program {id} vertex"),
        &wrapped.vertex,
        Stage::Vertex,
        compiler,
    )?;
    let fragment = compile_stage(
        device,
        &format!("program {id} fragment"),
        &wrapped.fragment,
        Stage::Fragment,
        compiler,
    )?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    collect_messages(
        &vertex,
        Stage::Vertex,
        wrapped.vertex_offset,
        &mut errors,
        &mut warnings,
    );
    collect_messages(
        &fragment,
        Stage::Fragment,
        wrapped.fragment_offset,
        &mut errors,
        &mut warnings,
    );

    let fill = create_pipeline(
        device,
        layouts,
        format,
        &vertex.module,
        &fragment.module,
        wgpu::PrimitiveTopology::TriangleList,
    );
    let wire = create_pipeline(
        device,
        layouts,
        format,
        &vertex.module,
        &fragment.module,
        wgpu::PrimitiveTopology::LineList,
    );

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("program uniforms"),
        size: SCENE_UNIFORMS_SIZE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("program bind group"),
        layout: &layouts.uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    Ok(ProgramBuild {
        program: GpuProgram {
            id,
            fill,
            wire,
            uniform_buffer,
            bind_group,
        },
        errors,
        warnings,
    })
}

fn collect_messages(
    compiled: &CompiledStage,
    stage: Stage,
    offset: u32,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    warnings.extend(
        compiled
            .warnings
            .iter()
            .map(|warning| format!("{}: {}", stage.name(), warning.trim())),
    );

    let info = pollster::block_on(compiled.module.get_compilation_info());
    for message in info.messages {
        let location = message
            .location
            .map(|location| (location.line_number, location.line_position));
        let text = format_message(stage, location, offset, &message.message);
        match message.message_type {
            wgpu::CompilationMessageType::Error => errors.push(text),
            _ => warnings.push(text),
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layouts: &ProgramLayouts,
    format: TargetFormat,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let label = match topology {
        wgpu::PrimitiveTopology::LineList => "program wire pipeline",
        _ => "program fill pipeline",
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layouts.pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: format.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: format.color,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
