use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hotswap::ShaderSource;
use liveconfig::LiveConfig;
use renderer::{RendererConfig, WindowRuntime};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExportArgs, RunArgs};
use crate::paths::{self, ConfigOrigin};
use crate::presets::{self, DEFAULT_PRESET};
use crate::watch::{self, StageFile, WatchedFile};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command {
        Some(Command::Presets) => {
            list_presets();
            Ok(())
        }
        Some(Command::Export(args)) => export_preset(&args),
        Some(Command::Config) => print_config(&cli.run),
        None => run_editor(cli.run),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn effective_config(args: &RunArgs) -> Result<(LiveConfig, ConfigOrigin)> {
    let (mut config, origin) = paths::load_config(args.config.as_deref())?;
    apply_overrides(args, &mut config);
    config
        .validate()
        .context("invalid configuration after applying command-line overrides")?;
    Ok((config, origin))
}

fn apply_overrides(args: &RunArgs, config: &mut LiveConfig) {
    if let Some(preset) = &args.preset {
        config.view.preset = Some(preset.clone());
    }
    if let Some(kind) = args.geometry {
        config.view.geometry = kind.into();
    }
    if let Some(antialias) = args.antialias {
        config.window.antialias = antialias;
    }
    if let Some(quiet_period) = args.quiet_period {
        config.pipeline.quiet_period = quiet_period;
    }
    if let Some((width, height)) = args.size {
        config.window.width = width;
        config.window.height = height;
    }
    if args.no_vsync {
        config.window.vsync = false;
    }
    if args.wireframe {
        config.view.wireframe = true;
    }
    if args.no_auto_rotate {
        config.view.auto_rotate = false;
    }
    if args.keep_mesh_on_error {
        config.view.keep_mesh_on_error = true;
    }
}

fn run_editor(args: RunArgs) -> Result<()> {
    let (config, origin) = effective_config(&args)?;
    match &origin {
        ConfigOrigin::File(path) => tracing::info!(path = %path.display(), "loaded config"),
        ConfigOrigin::Defaults(path) => {
            tracing::debug!(path = %path.display(), "using default config")
        }
    }

    let preset_name = config.view.preset.as_deref().unwrap_or(DEFAULT_PRESET);
    let preset = presets::require(preset_name)?;
    tracing::info!(preset = %preset.name, "starting spectra");

    let (initial_source, watched) = prepare_source_files(&args, &preset.source)?;

    let mut renderer_config = RendererConfig::from_config(&config, preset.source.clone());
    renderer_config.shader_compiler = args.shader_compiler;
    renderer_config.initial_source = initial_source;
    renderer_config.presets = presets::all();

    let runtime = WindowRuntime::spawn(renderer_config)?;
    let _watcher = if watched.is_empty() {
        None
    } else {
        match watch::watch_sources(watched, runtime.sender()) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                runtime.shutdown()?;
                return Err(err);
            }
        }
    };
    tracing::info!(
        "keys: 1-6 geometry, R auto-rotate, W wireframe, Tab next preset, Backspace reset, E error log"
    );
    runtime.wait()
}

/// Reads the `--vertex`/`--fragment` files, seeding missing ones from `seed`.
fn prepare_source_files(
    args: &RunArgs,
    seed: &ShaderSource,
) -> Result<(Option<ShaderSource>, Vec<WatchedFile>)> {
    let mut watched = Vec::new();
    let mut vertex = seed.vertex().to_string();
    let mut fragment = seed.fragment().to_string();

    if let Some(path) = &args.vertex {
        vertex = load_or_seed(path, seed.vertex())?;
        watched.push(WatchedFile::new(StageFile::Vertex, path));
    }
    if let Some(path) = &args.fragment {
        fragment = load_or_seed(path, seed.fragment())?;
        watched.push(WatchedFile::new(StageFile::Fragment, path));
    }

    if watched.is_empty() {
        Ok((None, watched))
    } else {
        Ok((Some(ShaderSource::new(vertex, fragment)), watched))
    }
}

fn load_or_seed(path: &Path, seed: &str) -> Result<String> {
    if path.exists() {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read shader at {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, seed)
        .with_context(|| format!("failed to seed shader at {}", path.display()))?;
    tracing::info!(path = %path.display(), "seeded shader file from preset");
    Ok(seed.to_string())
}

fn list_presets() {
    for (name, summary) in presets::summaries() {
        let marker = if name == DEFAULT_PRESET {
            " (default)"
        } else {
            ""
        };
        println!("{name:<8} {summary}{marker}");
    }
}

fn export_preset(args: &ExportArgs) -> Result<()> {
    let preset = presets::require(&args.preset)?;
    fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create directory {}", args.dir.display()))?;

    let files = [
        ("vertex.glsl", preset.source.vertex()),
        ("fragment.glsl", preset.source.fragment()),
    ];
    for (name, _) in &files {
        let path = args.dir.join(name);
        if path.exists() && !args.force {
            bail!(
                "{} already exists; pass --force to overwrite",
                path.display()
            );
        }
    }
    for (name, text) in files {
        let path = args.dir.join(name);
        fs::write(&path, text)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}

fn print_config(args: &RunArgs) -> Result<()> {
    let (config, origin) = effective_config(args)?;
    match origin {
        ConfigOrigin::File(path) => println!("# loaded from {}", path.display()),
        ConfigOrigin::Defaults(path) => {
            println!("# defaults (no file at {})", path.display())
        }
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}
