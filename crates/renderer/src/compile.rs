use std::borrow::Cow;
use std::collections::BTreeSet;

use hotswap::{EngineError, ShaderSource};
use wgpu::naga::ShaderStage;

use crate::types::ShaderCompiler;

/// Uniforms supplied by the prelude. User declarations of these are blanked out.
const PROVIDED_UNIFORMS: &[&str] = &[
    "projectionMatrix",
    "modelViewMatrix",
    "modelMatrix",
    "viewMatrix",
    "normalMatrix",
    "cameraPosition",
    "uTime",
    "uPointer",
    "uPointerSpeed",
];

const PROVIDED_ATTRIBUTES: &[&str] = &["position", "normal", "uv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }
}

/// Vulkan-flavoured GLSL for both stages plus how many prelude lines precede user code.
#[derive(Debug, Clone)]
pub(crate) struct WrappedProgram {
    pub vertex: String,
    pub fragment: String,
    pub vertex_offset: u32,
    pub fragment_offset: u32,
}

/// Rewrites three.js-style shader text into GLSL 450 that wgpu accepts.
///
/// Provided uniforms and attributes are stripped, `varying` declarations get
/// explicit locations shared by both stages, and `gl_FragColor` is aliased to a
/// real output. Removed lines are left blank so diagnostics keep user line numbers.
pub(crate) fn wrap_program(source: &ShaderSource) -> WrappedProgram {
    let mut names = BTreeSet::new();
    for text in [source.vertex(), source.fragment()] {
        for line in text.lines() {
            if let Some(varying) = Varying::parse(line.trim_start()) {
                names.extend(varying.names);
            }
        }
    }
    let varyings: Vec<String> = names.into_iter().collect();

    let vertex_prelude = format!("{SHARED_PRELUDE}{VERTEX_PRELUDE}#line 1\n");
    let fragment_prelude = format!("{SHARED_PRELUDE}{FRAGMENT_PRELUDE}#line 1\n");
    WrappedProgram {
        vertex_offset: line_count(&vertex_prelude),
        fragment_offset: line_count(&fragment_prelude),
        vertex: vertex_prelude + &wrap_body(source.vertex(), Stage::Vertex, &varyings),
        fragment: fragment_prelude + &wrap_body(source.fragment(), Stage::Fragment, &varyings),
    }
}

fn line_count(text: &str) -> u32 {
    text.matches('\n').count() as u32
}

fn wrap_body(source: &str, stage: Stage, varyings: &[String]) -> String {
    let mut body = String::with_capacity(source.len() + 256);
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version")
            || trimmed.starts_with("precision ")
            || is_provided_declaration(trimmed)
        {
            body.push('\n');
            continue;
        }
        match Varying::parse(trimmed) {
            Some(varying) => body.push_str(&varying.render(stage, varyings)),
            None => body.push_str(line),
        }
        body.push('\n');
    }
    body
}

fn is_provided_declaration(trimmed: &str) -> bool {
    let (keyword, provided) = if let Some(rest) = trimmed.strip_prefix("uniform ") {
        (rest, PROVIDED_UNIFORMS)
    } else if let Some(rest) = trimmed.strip_prefix("attribute ") {
        (rest, PROVIDED_ATTRIBUTES)
    } else {
        return false;
    };
    let Some((declaration, _)) = keyword.split_once(';') else {
        return false;
    };
    declaration
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .last()
        .is_some_and(|name| provided.contains(&name))
}

#[derive(Debug, PartialEq)]
struct Varying {
    ty: String,
    names: Vec<String>,
    trailing: String,
}

impl Varying {
    fn parse(trimmed: &str) -> Option<Self> {
        let rest = trimmed.strip_prefix("varying ")?;
        let (declaration, trailing) = rest.split_once(';')?;
        let mut tokens = declaration
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .filter(|token| !matches!(*token, "highp" | "mediump" | "lowp" | "smooth" | "flat"));
        let ty = tokens.next()?.to_string();
        let names: Vec<String> = tokens.map(str::to_string).collect();
        if names.is_empty() {
            return None;
        }
        Some(Self {
            ty,
            names,
            trailing: trailing.to_string(),
        })
    }

    fn render(&self, stage: Stage, varyings: &[String]) -> String {
        let direction = match stage {
            Stage::Vertex => "out",
            Stage::Fragment => "in",
        };
        let flat = if self.ty.starts_with("int")
            || self.ty.starts_with("uint")
            || self.ty.starts_with("ivec")
            || self.ty.starts_with("uvec")
        {
            "flat "
        } else {
            ""
        };
        let mut declarations = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let location = varyings
                .iter()
                .position(|candidate| candidate == name)
                .unwrap_or(0);
            declarations.push(format!(
                "layout(location = {location}) {flat}{direction} {ty} {name};",
                ty = self.ty
            ));
        }
        let mut rendered = declarations.join(" ");
        rendered.push_str(&self.trailing);
        rendered
    }
}

/// A compiled stage plus any warnings the compiler emitted on the way.
pub(crate) struct CompiledStage {
    pub module: wgpu::ShaderModule,
    pub warnings: Vec<String>,
}

/// Turns wrapped GLSL into a shader module.
///
/// With naga, parse errors are reported through the device error scope and the
/// module's compilation info rather than through the returned `Result`.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    wrapped: &str,
    stage: Stage,
    compiler: ShaderCompiler,
) -> Result<CompiledStage, EngineError> {
    match compiler {
        ShaderCompiler::NagaGlsl => Ok(CompiledStage {
            module: compile_with_naga(device, label, wrapped, stage),
            warnings: Vec::new(),
        }),
        ShaderCompiler::Shaderc => compile_with_shaderc(device, label, wrapped, stage),
    }
}

fn compile_with_naga(
    device: &wgpu::Device,
    label: &str,
    wrapped: &str,
    stage: Stage,
) -> wgpu::ShaderModule {
    let stage = match stage {
        Stage::Vertex => ShaderStage::Vertex,
        Stage::Fragment => ShaderStage::Fragment,
    };
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped.to_string()),
            stage,
            defines: &[],
        },
    })
}

#[cfg(feature = "shaderc")]
fn compile_with_shaderc(
    device: &wgpu::Device,
    label: &str,
    wrapped: &str,
    stage: Stage,
) -> Result<CompiledStage, EngineError> {
    let compiler = shaderc::Compiler::new()
        .map_err(|err| EngineError::Compile(format!("shaderc is unavailable: {err}")))?;
    let mut options = shaderc::CompileOptions::new()
        .map_err(|err| EngineError::Compile(format!("shaderc options: {err}")))?;
    options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    let kind = match stage {
        Stage::Vertex => shaderc::ShaderKind::Vertex,
        Stage::Fragment => shaderc::ShaderKind::Fragment,
    };
    let artifact = compiler
        .compile_into_spirv(wrapped, kind, stage.name(), "main", Some(&options))
        .map_err(|err| EngineError::Compile(err.to_string()))?;
    let warnings = if artifact.get_num_warnings() > 0 {
        artifact
            .get_warning_messages()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::SpirV(Cow::Borrowed(artifact.as_binary())),
    });
    Ok(CompiledStage { module, warnings })
}

#[cfg(not(feature = "shaderc"))]
fn compile_with_shaderc(
    _device: &wgpu::Device,
    _label: &str,
    _wrapped: &str,
    _stage: Stage,
) -> Result<CompiledStage, EngineError> {
    Err(EngineError::Compile(
        "shaderc support is not enabled in this build".into(),
    ))
}

/// Formats one compiler message, mapping wrapped line numbers back onto user lines.
pub(crate) fn format_message(
    stage: Stage,
    location: Option<(u32, u32)>,
    offset: u32,
    message: &str,
) -> String {
    match location {
        Some((line, column)) if line > offset => {
            format!("{}:{}:{}: {}", stage.name(), line - offset, column, message.trim())
        }
        _ => format!("{}: {}", stage.name(), message.trim()),
    }
}

/// Declarations shared by both stages. The block layout must match `SceneUniforms`.
const SHARED_PRELUDE: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform SpectraScene {
    mat4 spectra_projectionMatrix;
    mat4 spectra_modelViewMatrix;
    mat4 spectra_modelMatrix;
    mat4 spectra_viewMatrix;
    mat4 spectra_normalMatrix;
    vec4 spectra_cameraPosition;
    float spectra_time;
    float spectra_pointerSpeed;
    vec2 spectra_pointer;
} spectra_scene;

#define projectionMatrix spectra_scene.spectra_projectionMatrix
#define modelViewMatrix spectra_scene.spectra_modelViewMatrix
#define modelMatrix spectra_scene.spectra_modelMatrix
#define viewMatrix spectra_scene.spectra_viewMatrix
#define normalMatrix mat3(spectra_scene.spectra_normalMatrix)
#define cameraPosition spectra_scene.spectra_cameraPosition.xyz
#define uTime spectra_scene.spectra_time
#define uPointerSpeed spectra_scene.spectra_pointerSpeed
#define uPointer spectra_scene.spectra_pointer
";

const VERTEX_PRELUDE: &str = r"layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 uv;
";

const FRAGMENT_PRELUDE: &str = r"layout(location = 0) out vec4 spectra_FragColor;
#define gl_FragColor spectra_FragColor
";
