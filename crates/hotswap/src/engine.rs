use crate::geometry::GeometryKind;
use crate::source::ShaderSource;
use crate::uniforms::UniformSet;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("shader program could not be built: {0}")]
    Compile(String),
    #[error("render resource could not be created: {0}")]
    Resource(String),
    #[error("frame could not be presented: {0}")]
    Present(String),
}

/// Visible scene flags mutated by the swap manager and the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneState {
    pub mesh_visible: bool,
    pub placeholder_visible: bool,
    /// Rotation of the active mesh about the up axis, in radians.
    pub rotation: f32,
    pub wireframe: bool,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            mesh_visible: true,
            placeholder_visible: false,
            rotation: 0.0,
            wireframe: false,
        }
    }
}

/// Everything needed to draw one visible frame.
pub struct FrameState<'a, E: RenderEngine + ?Sized> {
    pub program: &'a E::Program,
    pub geometry: &'a E::Geometry,
    pub uniforms: &'a UniformSet,
    pub scene: &'a SceneState,
}

/// Capabilities the pipeline needs from a rendering backend.
///
/// Disposal takes resources by value, so every instance is released at most once.
/// Implementations are driven from a single thread and must not block on anything
/// other than the GPU work they were asked to do.
pub trait RenderEngine {
    type Program;
    type Geometry;
    type Target;

    fn create_program(
        &mut self,
        source: &ShaderSource,
        uniforms: &UniformSet,
    ) -> Result<Self::Program, EngineError>;
    fn dispose_program(&mut self, program: Self::Program);

    fn create_geometry(&mut self, kind: GeometryKind) -> Result<Self::Geometry, EngineError>;
    fn dispose_geometry(&mut self, geometry: Self::Geometry);

    /// Minimal off-screen target used to force compilation away from the visible surface.
    fn create_scratch_target(&mut self) -> Result<Self::Target, EngineError>;
    fn dispose_target(&mut self, target: Self::Target);

    /// Starts collecting every diagnostic the backend emits until [`end_capture`].
    ///
    /// [`end_capture`]: RenderEngine::end_capture
    fn begin_capture(&mut self);
    /// Stops collecting and returns what was emitted, oldest first. Returns nothing
    /// when no capture is open.
    fn end_capture(&mut self) -> Vec<String>;

    fn draw_offscreen(
        &mut self,
        target: &Self::Target,
        program: &Self::Program,
        geometry: &Self::Geometry,
        uniforms: &UniformSet,
    ) -> Result<(), EngineError>;

    /// Steps camera damping and inertia by one frame.
    fn advance_camera(&mut self);

    fn draw_frame(&mut self, frame: FrameState<'_, Self>) -> Result<(), EngineError>;
}
