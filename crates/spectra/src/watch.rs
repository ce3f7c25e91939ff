//! Turns saves of the `--vertex`/`--fragment` files into session edits.
//!
//! Parent directories are watched rather than the files themselves so editors that
//! save by renaming a temporary file over the original keep being tracked.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use renderer::SourceSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageFile {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone)]
pub struct WatchedFile {
    pub stage: StageFile,
    pub path: PathBuf,
}

impl WatchedFile {
    pub fn new(stage: StageFile, path: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            path: path.into(),
        }
    }
}

/// Keeps the underlying watcher alive; dropping it unsubscribes.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
}

/// Resolved identity of a watched file: canonical parent directory plus file name.
#[derive(Debug, Clone)]
struct Target {
    stage: StageFile,
    dir: PathBuf,
    name: std::ffi::OsString,
}

fn resolve_targets(files: &[WatchedFile]) -> Result<Vec<Target>> {
    files
        .iter()
        .map(|file| {
            let name = file
                .path
                .file_name()
                .with_context(|| format!("{} does not name a file", file.path.display()))?
                .to_os_string();
            let parent = match file.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let dir = parent
                .canonicalize()
                .with_context(|| format!("failed to resolve {}", parent.display()))?;
            Ok(Target {
                stage: file.stage,
                dir,
                name,
            })
        })
        .collect()
}

fn matching_stage(targets: &[Target], path: &Path) -> Option<StageFile> {
    let name = path.file_name()?;
    let dir = path.parent()?;
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    targets
        .iter()
        .find(|target| target.name == name && target.dir == dir)
        .map(|target| target.stage)
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    )
}

/// Reads the current text of every watched file touched by `event`.
///
/// Unchanged text is forwarded too, so a re-save restores the file after a preset switch.
fn edits_for_event(targets: &[Target], event: &Event) -> Vec<(StageFile, String)> {
    if !is_content_event(&event.kind) {
        return Vec::new();
    }
    let mut edits = Vec::new();
    for path in &event.paths {
        let Some(stage) = matching_stage(targets, path) else {
            continue;
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), ?stage, "shader file changed");
                edits.push((stage, text));
            }
            // Editors briefly remove the file while saving; the follow-up event carries it.
            Err(err) => {
                tracing::debug!(path = %path.display(), "skipping unreadable file: {err}");
            }
        }
    }
    edits
}

/// Starts watching `files`, forwarding their new contents to the window.
pub fn watch_sources(files: Vec<WatchedFile>, sender: SourceSender) -> Result<SourceWatcher> {
    let targets = resolve_targets(&files)?;
    let directories: BTreeSet<PathBuf> = targets.iter().map(|target| target.dir.clone()).collect();

    let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("file watch error: {err}");
                return;
            }
        };
        for (stage, text) in edits_for_event(&targets, &event) {
            let sent = match stage {
                StageFile::Vertex => sender.set_vertex_source(text),
                StageFile::Fragment => sender.set_fragment_source(text),
            };
            if let Err(err) = sent {
                tracing::debug!("dropping file edit: {err}");
            }
        }
    })
    .context("failed to create file watcher")?;

    for dir in &directories {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), "watching shader files");
    }

    Ok(SourceWatcher { _watcher: watcher })
}
