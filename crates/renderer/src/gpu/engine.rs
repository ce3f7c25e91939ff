use anyhow::{bail, Result};
use hotswap::{
    EngineError, FrameState, GeometryKind, RenderEngine, SceneState, ShaderSource, UniformSet,
};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{RendererConfig, ShaderCompiler};

use super::camera::OrbitCamera;
use super::context::{GpuContext, TargetFormat, DEPTH_FORMAT};
use super::mesh::GpuMesh;
use super::primitives::MeshData;
use super::program::{build_program, GpuProgram, ProgramLayouts};
use super::uniforms::{model_matrix, SceneUniforms};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.06,
    g: 0.06,
    b: 0.08,
    a: 1.0,
};

const PLACEHOLDER_SCALE: f32 = 1.15;

const PLACEHOLDER_VERTEX: &str = "varying vec3 vNormal;

void main() {
  vNormal = normalize(normalMatrix * normal);
  gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
";

const PLACEHOLDER_FRAGMENT: &str = "varying vec3 vNormal;

void main() {
  float pulse = 0.65 + 0.35 * sin(uTime * 3.0);
  float facing = abs(normalize(vNormal).z) * 0.3 + 0.7;
  gl_FragColor = vec4(vec3(1.0, 0.22, 0.18) * pulse * facing, 1.0);
}
";

/// Off-screen 1x1 attachments used to force shader compilation. Never presented.
pub struct ScratchTarget {
    id: u64,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

struct FrameAttachments {
    multisample: Option<(wgpu::Texture, wgpu::TextureView)>,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl FrameAttachments {
    fn new(device: &wgpu::Device, format: TargetFormat, size: PhysicalSize<u32>) -> Self {
        let multisample = (format.sample_count > 1).then(|| {
            let texture = attachment(
                device,
                "msaa color target",
                format.color,
                format.sample_count,
                size,
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });
        let depth = attachment(device, "depth target", DEPTH_FORMAT, format.sample_count, size);
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            multisample,
            depth,
            depth_view,
        }
    }

    fn destroy(&self) {
        if let Some((texture, _)) = &self.multisample {
            texture.destroy();
        }
        self.depth.destroy();
    }
}

fn attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    sample_count: u32,
    size: PhysicalSize<u32>,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

/// Diagnostics gathered between `begin_capture` and `end_capture`.
#[derive(Default)]
struct Capture {
    messages: Vec<String>,
}

/// wgpu-backed [`RenderEngine`] drawing into a window surface.
pub struct WgpuEngine {
    context: GpuContext,
    layouts: ProgramLayouts,
    compiler: ShaderCompiler,
    camera: OrbitCamera,
    frame: FrameAttachments,
    placeholder_program: GpuProgram,
    placeholder_mesh: GpuMesh,
    capture: Option<Capture>,
    next_id: u64,
}

impl WgpuEngine {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, config.antialiasing, config.vsync)?;
        let layouts = ProgramLayouts::new(&context.device);
        let format = context.target_format();
        tracing::info!(
            compiler = %config.shader_compiler,
            sample_count = format.sample_count,
            format = ?format.color,
            "renderer initialised"
        );

        context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let placeholder = build_program(
            &context.device,
            &layouts,
            format,
            config.shader_compiler,
            0,
            &ShaderSource::new(PLACEHOLDER_VERTEX, PLACEHOLDER_FRAGMENT),
        );
        let scope_error = pollster::block_on(context.device.pop_error_scope());
        let placeholder = match placeholder {
            Ok(build) if build.errors.is_empty() && scope_error.is_none() => build.program,
            Ok(build) => {
                let mut messages = build.errors;
                messages.extend(scope_error.map(|err| err.to_string()));
                bail!("placeholder program failed to build:\n{}", messages.join("\n"));
            }
            Err(err) => bail!("placeholder program failed to build: {err}"),
        };
        let placeholder_mesh = GpuMesh::upload(
            &context.device,
            0,
            GeometryKind::Icosahedron,
            &MeshData::for_kind(GeometryKind::Icosahedron),
        );
        let frame = FrameAttachments::new(&context.device, format, context.size);

        Ok(Self {
            context,
            layouts,
            compiler: config.shader_compiler,
            camera: OrbitCamera::default(),
            frame,
            placeholder_program: placeholder,
            placeholder_mesh,
            capture: None,
            next_id: 1,
        })
    }

    pub(crate) fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.context.resize(size) {
            self.frame.destroy();
            self.frame = FrameAttachments::new(
                &self.context.device,
                self.context.target_format(),
                self.context.size,
            );
        }
    }

    pub(crate) fn drag_camera(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.drag(delta_x, delta_y);
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn write_uniforms(
        &self,
        program: &GpuProgram,
        aspect: f32,
        model: glam::Mat4,
        values: &UniformSet,
    ) {
        let uniforms = SceneUniforms::compose(&self.camera, aspect, model, values);
        self.context
            .queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

impl RenderEngine for WgpuEngine {
    type Program = GpuProgram;
    type Geometry = GpuMesh;
    type Target = ScratchTarget;

    fn create_program(
        &mut self,
        source: &ShaderSource,
        uniforms: &UniformSet,
    ) -> Result<GpuProgram, EngineError> {
        let id = self.allocate_id();
        let build = build_program(
            &self.context.device,
            &self.layouts,
            self.context.target_format(),
            self.compiler,
            id,
            source,
        )?;
        for warning in &build.warnings {
            tracing::warn!(program = id, "{warning}");
        }
        match self.capture.as_mut() {
            Some(capture) => capture.messages.extend(build.errors),
            None if !build.errors.is_empty() => {
                build.program.destroy();
                return Err(EngineError::Compile(build.errors.join("\n")));
            }
            None => {}
        }
        self.write_uniforms(
            &build.program,
            self.context.aspect(),
            model_matrix(0.0, 1.0),
            uniforms,
        );
        tracing::debug!(program = id, "created program");
        Ok(build.program)
    }

    fn dispose_program(&mut self, program: GpuProgram) {
        tracing::debug!(program = program.id, "disposed program");
        program.destroy();
    }

    fn create_geometry(&mut self, kind: GeometryKind) -> Result<GpuMesh, EngineError> {
        let data = MeshData::for_kind(kind);
        if data.indices.is_empty() {
            return Err(EngineError::Resource(format!("{kind} produced no triangles")));
        }
        let id = self.allocate_id();
        tracing::debug!(
            geometry = id,
            %kind,
            triangles = data.triangle_count(),
            "created geometry"
        );
        Ok(GpuMesh::upload(&self.context.device, id, kind, &data))
    }

    fn dispose_geometry(&mut self, geometry: GpuMesh) {
        tracing::debug!(geometry = geometry.id, kind = %geometry.kind, "disposed geometry");
        geometry.destroy();
    }

    fn create_scratch_target(&mut self) -> Result<ScratchTarget, EngineError> {
        let format = self.context.target_format();
        let size = PhysicalSize::new(1, 1);
        let color = attachment(
            &self.context.device,
            "scratch color",
            format.color,
            format.sample_count,
            size,
        );
        let depth = attachment(
            &self.context.device,
            "scratch depth",
            DEPTH_FORMAT,
            format.sample_count,
            size,
        );
        Ok(ScratchTarget {
            id: self.allocate_id(),
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            depth,
        })
    }

    fn dispose_target(&mut self, target: ScratchTarget) {
        tracing::trace!(scratch = target.id, "disposed scratch target");
        target.color.destroy();
        target.depth.destroy();
    }

    fn begin_capture(&mut self) {
        if self.capture.is_some() {
            tracing::warn!("diagnostic capture already open; restarting it");
            let _ = self.end_capture();
        }
        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        self.capture = Some(Capture::default());
    }

    fn end_capture(&mut self) -> Vec<String> {
        let Some(capture) = self.capture.take() else {
            return Vec::new();
        };
        let scope_error = pollster::block_on(self.context.device.pop_error_scope());
        let mut messages = capture.messages;
        match scope_error {
            // Compiler messages already describe the failure with user line numbers.
            Some(err) if !messages.is_empty() => {
                tracing::debug!(error = %err, "suppressed validation error behind compiler messages");
            }
            Some(err) => messages.push(err.to_string()),
            None => {}
        }
        messages
    }

    fn draw_offscreen(
        &mut self,
        target: &ScratchTarget,
        program: &GpuProgram,
        geometry: &GpuMesh,
        uniforms: &UniformSet,
    ) -> Result<(), EngineError> {
        self.write_uniforms(program, 1.0, model_matrix(0.0, 1.0), uniforms);
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("validation encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("validation pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&program.fill);
            pass.set_bind_group(0, &program.bind_group, &[]);
            geometry.draw(&mut pass, false);
        }
        self.context.queue.submit(Some(encoder.finish()));
        self.context
            .device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| EngineError::Resource(format!("waiting for validation draw: {err}")))?;
        Ok(())
    }

    fn advance_camera(&mut self) {
        self.camera.advance();
    }

    fn draw_frame(&mut self, frame: FrameState<'_, Self>) -> Result<(), EngineError> {
        let surface_texture = match self.context.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(EngineError::Present(
                    "surface lost or outdated; reconfigured".into(),
                ));
            }
            Err(err) => return Err(EngineError::Present(err.to_string())),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let scene: &SceneState = frame.scene;
        let aspect = self.context.aspect();
        if scene.mesh_visible {
            self.write_uniforms(
                frame.program,
                aspect,
                model_matrix(scene.rotation, 1.0),
                frame.uniforms,
            );
        }
        if scene.placeholder_visible {
            self.write_uniforms(
                &self.placeholder_program,
                aspect,
                model_matrix(scene.rotation, PLACEHOLDER_SCALE),
                frame.uniforms,
            );
        }

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        {
            let (attachment_view, resolve_target) = match &self.frame.multisample {
                Some((_, msaa_view)) => (msaa_view, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.frame.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if scene.mesh_visible {
                pass.set_pipeline(frame.program.pipeline(scene.wireframe));
                pass.set_bind_group(0, &frame.program.bind_group, &[]);
                frame.geometry.draw(&mut pass, scene.wireframe);
            }
            if scene.placeholder_visible {
                pass.set_pipeline(&self.placeholder_program.wire);
                pass.set_bind_group(0, &self.placeholder_program.bind_group, &[]);
                self.placeholder_mesh.draw(&mut pass, true);
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

impl Drop for WgpuEngine {
    fn drop(&mut self) {
        if self.capture.is_some() {
            let _ = self.end_capture();
        }
        self.frame.destroy();
        tracing::debug!("renderer dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::wrap_program;

    #[test]
    fn placeholder_uses_only_provided_inputs() {
        let wrapped = wrap_program(&ShaderSource::new(PLACEHOLDER_VERTEX, PLACEHOLDER_FRAGMENT));
        let vertex: Vec<&str> = wrapped
            .vertex
            .lines()
            .skip(wrapped.vertex_offset as usize)
            .collect();
        let fragment: Vec<&str> = wrapped
            .fragment
            .lines()
            .skip(wrapped.fragment_offset as usize)
            .collect();

        assert_eq!(vertex[0], "layout(location = 0) out vec3 vNormal;");
        assert_eq!(fragment[0], "layout(location = 0) in vec3 vNormal;");
        assert!(!wrapped.fragment.contains("uniform float uTime;"));
    }
}
