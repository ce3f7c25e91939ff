use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use hotswap::{ApplyOutcome, GeometryKind, Session, TickOutcome};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::gpu::WgpuEngine;
use crate::types::{Preset, RendererConfig};

#[derive(Debug, Clone)]
enum WindowCommand {
    SetVertexSource(String),
    SetFragmentSource(String),
    Shutdown,
}

/// Cloneable handle for feeding source edits into a running window from any thread.
#[derive(Clone)]
pub struct SourceSender {
    proxy: EventLoopProxy<WindowCommand>,
}

impl SourceSender {
    pub fn set_vertex_source(&self, text: impl Into<String>) -> Result<()> {
        self.send(WindowCommand::SetVertexSource(text.into()))
    }

    pub fn set_fragment_source(&self, text: impl Into<String>) -> Result<()> {
        self.send(WindowCommand::SetFragmentSource(text.into()))
    }

    fn send(&self, command: WindowCommand) -> Result<()> {
        self.proxy
            .send_event(command)
            .map_err(|_| anyhow!("preview window has closed"))
    }
}

/// Preview window running on its own thread, owning the GPU engine and the session.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("spectra-window".into())
            .spawn(move || run_window_thread(config, ready_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = match ready_rx.recv() {
            Ok(ready) => ready?,
            Err(_) => {
                return match handle.join() {
                    Ok(Err(err)) => Err(err),
                    _ => Err(anyhow!("window thread exited before initialising")),
                };
            }
        };

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    pub fn sender(&self) -> SourceSender {
        SourceSender {
            proxy: self.proxy.clone(),
        }
    }

    /// Blocks until the user closes the window.
    pub fn wait(mut self) -> Result<()> {
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))?,
            None => Ok(()),
        }
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    SelectGeometry(GeometryKind),
    ToggleAutoRotate,
    ToggleWireframe,
    ResetSource,
    NextPreset,
    PrintErrorLog,
}

fn key_action(key: Key<&str>) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Backspace) => Some(KeyAction::ResetSource),
        Key::Named(NamedKey::Tab) => Some(KeyAction::NextPreset),
        Key::Character(value) => match value.to_ascii_lowercase().as_str() {
            "r" => Some(KeyAction::ToggleAutoRotate),
            "w" => Some(KeyAction::ToggleWireframe),
            "e" => Some(KeyAction::PrintErrorLog),
            digit => {
                let index: usize = digit.parse().ok()?;
                let kind = GeometryKind::ALL.get(index.checked_sub(1)?)?;
                Some(KeyAction::SelectGeometry(*kind))
            }
        },
        _ => None,
    }
}

struct WindowState {
    session: Option<Session<WgpuEngine>>,
    window: Arc<Window>,
    mouse: MouseState,
    presets: Vec<Preset>,
    preset_index: Option<usize>,
    title: String,
    showing_error: bool,
}

impl WindowState {
    fn new(window: Arc<Window>, config: RendererConfig) -> Result<Self> {
        let engine = WgpuEngine::new(window.as_ref(), window.inner_size(), &config)?;
        let mut session = Session::new(engine, config.default_source.clone(), config.session)
            .map_err(|err| anyhow!("failed to start shader session: {err}"))?;

        if let Some(initial) = config.initial_source {
            if initial != config.default_source {
                let now = Instant::now();
                session.set_source(initial, now);
                let due = session.next_deadline().unwrap_or(now);
                if let Some(ApplyOutcome::Failed { .. }) = session.pump(due) {
                    warn!("initial shader source failed to validate; showing placeholder");
                }
            }
        }

        let preset_index = config
            .presets
            .iter()
            .position(|preset| &preset.source == session.source());
        let mut state = Self {
            session: Some(session),
            window,
            mouse: MouseState::default(),
            presets: config.presets,
            preset_index,
            title: config.title,
            showing_error: false,
        };
        state.refresh_title(true);
        Ok(state)
    }

    fn session(&mut self) -> Option<&mut Session<WgpuEngine>> {
        self.session.as_mut()
    }

    fn pump(&mut self) -> Option<Instant> {
        let session = self.session.as_mut()?;
        if let Some(outcome) = session.pump(Instant::now()) {
            tracing::debug!(?outcome, "validation applied");
            self.refresh_title(false);
        }
        self.session.as_ref()?.next_deadline()
    }

    fn redraw(&mut self) {
        let Some(session) = self.session() else {
            return;
        };
        if session.tick() == TickOutcome::DrawFailed {
            tracing::trace!("frame skipped");
        }
    }

    fn handle_command(&mut self, command: WindowCommand) {
        let now = Instant::now();
        let Some(session) = self.session() else {
            return;
        };
        match command {
            WindowCommand::SetVertexSource(text) => {
                session.set_vertex_source(text, now);
            }
            WindowCommand::SetFragmentSource(text) => {
                session.set_fragment_source(text, now);
            }
            WindowCommand::Shutdown => {}
        }
        self.preset_index = None;
    }

    fn handle_key(&mut self, action: KeyAction) {
        let now = Instant::now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            KeyAction::SelectGeometry(kind) => {
                session.set_geometry(kind, now);
                info!(geometry = %kind, "geometry selected");
            }
            KeyAction::ToggleAutoRotate => {
                let enabled = !session.auto_rotate();
                session.set_auto_rotate(enabled);
                info!(enabled, "auto-rotate toggled");
            }
            KeyAction::ToggleWireframe => {
                let enabled = !session.scene().wireframe;
                session.set_wireframe(enabled);
                info!(enabled, "wireframe toggled");
            }
            KeyAction::ResetSource => {
                session.reset_to_default(now);
                self.preset_index = None;
                info!("shader source reset to default");
            }
            KeyAction::NextPreset => {
                if self.presets.is_empty() {
                    return;
                }
                let next = self
                    .preset_index
                    .map_or(0, |index| (index + 1) % self.presets.len());
                let preset = &self.presets[next];
                session.set_source(preset.source.clone(), now);
                self.preset_index = Some(next);
                info!(preset = %preset.name, "preset selected");
            }
            KeyAction::PrintErrorLog => {
                let log = session.error_log();
                if log.is_empty() {
                    info!("error log is empty");
                }
                for (index, entry) in log.iter().enumerate() {
                    info!("error log [{}]:\n{entry}", index + 1);
                }
            }
        }
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let size = self.window.inner_size();
        let drag = self.mouse.handle_cursor_moved(position);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (x, y) = normalized_pointer(position, size);
        session.record_pointer(x, y);
        if let Some((dx, dy)) = drag {
            session.engine_mut().drag_camera(dx, dy);
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(session) = self.session.as_mut() {
            session.engine_mut().resize(size);
        }
    }

    fn refresh_title(&mut self, force: bool) {
        let has_error = self.session.as_ref().is_some_and(|session| session.has_error());
        if !force && has_error == self.showing_error {
            return;
        }
        self.showing_error = has_error;
        let title = if has_error {
            format!("{} - shader error (press E for the log)", self.title)
        } else {
            self.title.clone()
        };
        self.window.set_title(&title);
    }

    /// Cancels pending work and releases GPU resources while the window still exists.
    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            drop(session.teardown());
        }
    }
}

fn normalized_pointer(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> (f32, f32) {
    let width = f64::from(size.width.max(1));
    let height = f64::from(size.height.max(1));
    let x = (position.x / width).clamp(0.0, 1.0);
    let y = 1.0 - (position.y / height).clamp(0.0, 1.0);
    (x as f32, y as f32)
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let _ = ready_tx.send(Err(anyhow!("failed to create event loop: {err}")));
            return Ok(());
        }
    };
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = match WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let _ = ready_tx.send(Err(anyhow!("failed to create preview window: {err}")));
            return Ok(());
        }
    };

    let mut state = match WindowState::new(window, config) {
        Ok(state) => state,
        Err(err) => {
            let _ = ready_tx.send(Err(err.context("failed to initialise preview renderer")));
            return Ok(());
        }
    };
    state.window.request_redraw();

    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(WindowCommand::Shutdown) => elwt.exit(),
        Event::UserEvent(command) => state.handle_command(command),
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let Some(action) = key_action(event.logical_key.as_ref()) {
                        state.handle_key(action);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => state.handle_cursor_moved(position),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => state.mouse.handle_button(button_state),
            WindowEvent::Resized(new_size) => state.resize(new_size),
            WindowEvent::RedrawRequested => state.redraw(),
            _ => {}
        },
        Event::AboutToWait => {
            let deadline = state.pump();
            state.window.request_redraw();
            match deadline {
                Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                None => elwt.set_control_flow(ControlFlow::Wait),
            }
        }
        Event::LoopExiting => state.teardown(),
        _ => {}
    });

    run_result.map_err(|err| {
        error!("window event loop error: {err}");
        anyhow!("window event loop error: {err}")
    })
}

/// Left-button drag tracking for camera orbit.
#[derive(Default)]
struct MouseState {
    position: Option<PhysicalPosition<f64>>,
    is_pressed: bool,
}

impl MouseState {
    /// Records the new position and returns the drag delta while the button is held.
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        let previous = self.position.replace(position);
        if !self.is_pressed {
            return None;
        }
        let previous = previous?;
        Some((
            (position.x - previous.x) as f32,
            (position.y - previous.y) as f32,
        ))
    }

    fn handle_button(&mut self, state: ElementState) {
        self.is_pressed = state == ElementState::Pressed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_select_geometry_in_order() {
        assert_eq!(
            key_action(Key::Character("1")),
            Some(KeyAction::SelectGeometry(GeometryKind::Sphere))
        );
        assert_eq!(
            key_action(Key::Character("6")),
            Some(KeyAction::SelectGeometry(GeometryKind::TorusKnot))
        );
        assert_eq!(key_action(Key::Character("0")), None);
        assert_eq!(key_action(Key::Character("7")), None);
    }

    #[test]
    fn letters_ignore_case() {
        assert_eq!(key_action(Key::Character("W")), Some(KeyAction::ToggleWireframe));
        assert_eq!(key_action(Key::Character("r")), Some(KeyAction::ToggleAutoRotate));
        assert_eq!(key_action(Key::Character("e")), Some(KeyAction::PrintErrorLog));
        assert_eq!(key_action(Key::Character("q")), None);
    }

    #[test]
    fn named_keys_drive_source_actions() {
        assert_eq!(
            key_action(Key::Named(NamedKey::Backspace)),
            Some(KeyAction::ResetSource)
        );
        assert_eq!(key_action(Key::Named(NamedKey::Tab)), Some(KeyAction::NextPreset));
        assert_eq!(key_action(Key::Named(NamedKey::Space)), None);
    }

    #[test]
    fn drag_only_while_pressed() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.handle_cursor_moved(PhysicalPosition::new(10.0, 10.0)), None);
        mouse.handle_button(ElementState::Pressed);
        assert_eq!(
            mouse.handle_cursor_moved(PhysicalPosition::new(14.0, 7.0)),
            Some((4.0, -3.0))
        );
        mouse.handle_button(ElementState::Released);
        assert_eq!(mouse.handle_cursor_moved(PhysicalPosition::new(20.0, 20.0)), None);
    }

    #[test]
    fn pointer_is_normalized_with_y_up() {
        let size = PhysicalSize::new(200, 100);
        assert_eq!(normalized_pointer(PhysicalPosition::new(50.0, 25.0), size), (0.25, 0.75));
        assert_eq!(normalized_pointer(PhysicalPosition::new(-5.0, 500.0), size), (0.0, 0.0));
    }
}
