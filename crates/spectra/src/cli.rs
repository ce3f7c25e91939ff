use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use hotswap::GeometryKind;
use liveconfig::AntialiasSetting;
use renderer::ShaderCompiler;

#[derive(Parser, Debug)]
#[command(
    name = "spectra",
    author,
    version,
    about = "Live GLSL shader editor with hot program swaps"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `spectra.toml` in the config directory.
    #[arg(long, value_name = "PATH", env = "SPECTRA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Preset to start from (see `spectra presets`).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Vertex shader file to watch; seeded from the preset when missing.
    #[arg(long, value_name = "FILE")]
    pub vertex: Option<PathBuf>,

    /// Fragment shader file to watch; seeded from the preset when missing.
    #[arg(long, value_name = "FILE")]
    pub fragment: Option<PathBuf>,

    /// Initial geometry: sphere, cube, dodecahedron, icosahedron, plane or torus-knot.
    #[arg(long, value_name = "KIND", value_parser = parse_geometry)]
    pub geometry: Option<GeometryKind>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = liveconfig::parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Quiet period after the last edit before validation runs (e.g. `300ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub quiet_period: Option<Duration>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Start in wireframe mode.
    #[arg(long)]
    pub wireframe: bool,

    /// Start with auto-rotation disabled.
    #[arg(long)]
    pub no_auto_rotate: bool,

    /// Keep the last good mesh visible next to the error placeholder.
    #[arg(long)]
    pub keep_mesh_on_error: bool,

    /// Shader compiler backend: `naga` (default) or `shaderc`.
    #[arg(
        long,
        value_name = "COMPILER",
        value_parser = parse_shader_compiler,
        default_value_t = ShaderCompiler::default()
    )]
    pub shader_compiler: ShaderCompiler,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in presets.
    Presets,
    /// Write a preset's vertex.glsl and fragment.glsl into a directory.
    Export(ExportArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Preset name.
    pub preset: String,
    /// Target directory (created when missing).
    pub dir: PathBuf,
    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_geometry(value: &str) -> Result<GeometryKind, String> {
    value.parse()
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_finite() && seconds > 0.0 {
            return Ok(Duration::from_secs_f64(seconds));
        }
        return Err(format!("duration must be positive, got '{trimmed}'"));
    }
    let duration = humantime::parse_duration(trimmed)
        .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?;
    if duration.is_zero() {
        return Err("duration must be positive".to_string());
    }
    Ok(duration)
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let normalized = value.trim().to_ascii_lowercase();
    let (width, height) = normalized
        .split_once('x')
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_shader_compiler(value: &str) -> Result<ShaderCompiler, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("shader compiler must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "shaderc" => {
            if cfg!(feature = "shaderc") {
                Ok(ShaderCompiler::Shaderc)
            } else {
                Err("shaderc support is not enabled in this build".to_string())
            }
        }
        "naga" | "naga-glsl" => Ok(ShaderCompiler::NagaGlsl),
        _ => Err("unknown shader compiler (expected shaderc or naga)".to_string()),
    }
}
