use hotswap::{SessionConfig, ShaderSource};
use liveconfig::{AntialiasSetting, LiveConfig};

/// Shader compilation backend requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCompiler {
    /// Compile wrapped GLSL through shaderc into SPIR-V.
    Shaderc,
    /// Hand GLSL to naga's built-in frontend.
    NagaGlsl,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        if cfg!(feature = "shaderc") {
            ShaderCompiler::Shaderc
        } else {
            ShaderCompiler::NagaGlsl
        }
    }
}

impl std::fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl From<AntialiasSetting> for Antialiasing {
    fn from(setting: AntialiasSetting) -> Self {
        match setting.samples() {
            None => Antialiasing::Auto,
            Some(1) => Antialiasing::Off,
            Some(samples) => Antialiasing::Samples(samples),
        }
    }
}

/// A named vertex/fragment pair the window can cycle through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub source: ShaderSource,
}

impl Preset {
    pub fn new(name: impl Into<String>, source: ShaderSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Start-up configuration for the preview window.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub antialiasing: Antialiasing,
    pub vsync: bool,
    pub shader_compiler: ShaderCompiler,
    pub title: String,
    /// Source the session validates at start-up and restores on reset.
    pub default_source: ShaderSource,
    /// Source shown first when it differs from the default (for example a watched file).
    pub initial_source: Option<ShaderSource>,
    pub presets: Vec<Preset>,
    pub session: SessionConfig,
}

impl RendererConfig {
    pub fn from_config(config: &LiveConfig, default_source: ShaderSource) -> Self {
        Self {
            surface_size: (config.window.width, config.window.height),
            antialiasing: config.window.antialias.into(),
            vsync: config.window.vsync,
            shader_compiler: ShaderCompiler::default(),
            title: "Spectra".to_string(),
            default_source,
            initial_source: None,
            presets: Vec::new(),
            session: SessionConfig::from_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antialias_setting_maps_to_policy() {
        assert_eq!(Antialiasing::from(AntialiasSetting::Auto), Antialiasing::Auto);
        assert_eq!(Antialiasing::from(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(
            Antialiasing::from(AntialiasSetting::Samples4),
            Antialiasing::Samples(4)
        );
    }

    #[test]
    fn renderer_config_follows_live_config() {
        let mut live = LiveConfig::default();
        live.window.width = 640;
        live.window.height = 480;
        live.window.vsync = false;
        let config = RendererConfig::from_config(&live, ShaderSource::default());

        assert_eq!(config.surface_size, (640, 480));
        assert!(!config.vsync);
        assert_eq!(config.session.quiet_period, live.pipeline.quiet_period);
    }
}
