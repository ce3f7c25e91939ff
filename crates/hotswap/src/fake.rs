//! Recording engine used by the pipeline tests.

use std::collections::{HashMap, HashSet};

use crate::engine::{EngineError, FrameState, RenderEngine};
use crate::geometry::GeometryKind;
use crate::source::ShaderSource;
use crate::uniforms::UniformSet;

pub const DEFAULT_VERTEX: &str = "varying vec3 vNormal;\n\
void main() {\n\
  vNormal = normal;\n\
  gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);\n\
}\n";

pub const DEFAULT_FRAGMENT: &str = "varying vec3 vNormal;\n\
void main() {\n\
  gl_FragColor = vec4(vNormal * 0.5 + 0.5, 1.0);\n\
}\n";

#[derive(Debug, Clone, PartialEq)]
pub struct FakeProgram {
    pub id: u64,
    pub source: ShaderSource,
    pub seeded_time: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeGeometry {
    pub id: u64,
    pub kind: GeometryKind,
}

#[derive(Debug)]
pub struct FakeTarget {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub program: u64,
    pub geometry: GeometryKind,
    pub time: f32,
    pub mesh_visible: bool,
    pub placeholder_visible: bool,
    pub wireframe: bool,
}

/// Tracks every resource it hands out and panics on a double dispose.
///
/// Sources are "compiled" by scanning for identifiers prefixed with `missing_`
/// (reported as undeclared during the off-screen draw), `#error` lines (rejected
/// at build time), `#panic` (panics while building) and `#draw-panic` (panics
/// during the off-screen draw).
#[derive(Debug, Default)]
pub struct FakeEngine {
    next_id: u64,
    capturing: bool,
    captured: Vec<String>,
    programs: HashSet<u64>,
    geometries: HashMap<u64, GeometryKind>,
    targets: HashSet<u64>,
    pub programs_created: usize,
    pub sources_built: Vec<ShaderSource>,
    pub disposed_programs: Vec<u64>,
    pub disposed_geometries: Vec<u64>,
    pub created_geometries: Vec<GeometryKind>,
    pub offscreen_draws: usize,
    pub camera_steps: usize,
    pub frames: Vec<FrameRecord>,
    pub uncaptured: Vec<String>,
    pub fail_geometry: bool,
    pub fail_target: bool,
    pub fail_frames: bool,
}

impl FakeEngine {
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn emit(&mut self, message: String) {
        if self.capturing {
            self.captured.push(message);
        } else {
            self.uncaptured.push(message);
        }
    }
}

fn undeclared(stage: &str, text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for (index, line) in text.lines().enumerate() {
        for token in line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
            if token.starts_with("missing_") {
                found.push(format!(
                    "ERROR: {stage}:{}: '{token}' : undeclared identifier",
                    index + 1
                ));
            }
        }
    }
    found
}

fn directive(text: &str, name: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(name))
        .map(|rest| rest.trim().to_string())
}

impl RenderEngine for FakeEngine {
    type Program = FakeProgram;
    type Geometry = FakeGeometry;
    type Target = FakeTarget;

    fn create_program(
        &mut self,
        source: &ShaderSource,
        uniforms: &UniformSet,
    ) -> Result<FakeProgram, EngineError> {
        self.sources_built.push(source.clone());
        for text in [source.vertex(), source.fragment()] {
            if let Some(reason) = directive(text, "#panic") {
                panic!("fake compiler crashed: {reason}");
            }
            if let Some(reason) = directive(text, "#error") {
                return Err(EngineError::Compile(format!("#error {reason}")));
            }
        }
        let id = self.allocate();
        self.programs.insert(id);
        self.programs_created += 1;
        Ok(FakeProgram {
            id,
            source: source.clone(),
            seeded_time: uniforms.time,
        })
    }

    fn dispose_program(&mut self, program: FakeProgram) {
        assert!(
            self.programs.remove(&program.id),
            "program {} disposed twice",
            program.id
        );
        self.disposed_programs.push(program.id);
    }

    fn create_geometry(&mut self, kind: GeometryKind) -> Result<FakeGeometry, EngineError> {
        if self.fail_geometry {
            return Err(EngineError::Resource(format!("no buffers for {kind}")));
        }
        let id = self.allocate();
        self.geometries.insert(id, kind);
        self.created_geometries.push(kind);
        Ok(FakeGeometry { id, kind })
    }

    fn dispose_geometry(&mut self, geometry: FakeGeometry) {
        assert!(
            self.geometries.remove(&geometry.id).is_some(),
            "geometry {} disposed twice",
            geometry.id
        );
        self.disposed_geometries.push(geometry.id);
    }

    fn create_scratch_target(&mut self) -> Result<FakeTarget, EngineError> {
        if self.fail_target {
            return Err(EngineError::Resource("scratch target unavailable".into()));
        }
        let id = self.allocate();
        self.targets.insert(id);
        Ok(FakeTarget { id })
    }

    fn dispose_target(&mut self, target: FakeTarget) {
        assert!(self.targets.remove(&target.id), "target {} disposed twice", target.id);
    }

    fn begin_capture(&mut self) {
        self.capturing = true;
        self.captured.clear();
    }

    fn end_capture(&mut self) -> Vec<String> {
        self.capturing = false;
        std::mem::take(&mut self.captured)
    }

    fn draw_offscreen(
        &mut self,
        target: &FakeTarget,
        program: &FakeProgram,
        geometry: &FakeGeometry,
        _uniforms: &UniformSet,
    ) -> Result<(), EngineError> {
        assert!(self.targets.contains(&target.id));
        assert!(self.geometries.contains_key(&geometry.id));
        self.offscreen_draws += 1;
        for text in [program.source.vertex(), program.source.fragment()] {
            if let Some(reason) = directive(text, "#draw-panic") {
                panic!("fake driver crashed: {reason}");
            }
        }
        let mut messages = undeclared("0", program.source.vertex());
        messages.extend(undeclared("1", program.source.fragment()));
        for message in messages {
            self.emit(message);
        }
        Ok(())
    }

    fn advance_camera(&mut self) {
        self.camera_steps += 1;
    }

    fn draw_frame(&mut self, frame: FrameState<'_, Self>) -> Result<(), EngineError> {
        assert!(self.programs.contains(&frame.program.id), "drew a disposed program");
        assert!(
            self.geometries.contains_key(&frame.geometry.id),
            "drew a disposed geometry"
        );
        if self.fail_frames {
            return Err(EngineError::Present("surface lost".into()));
        }
        self.frames.push(FrameRecord {
            program: frame.program.id,
            geometry: frame.geometry.kind,
            time: frame.uniforms.time,
            mesh_visible: frame.scene.mesh_visible,
            placeholder_visible: frame.scene.placeholder_visible,
            wireframe: frame.scene.wireframe,
        });
        Ok(())
    }
}
