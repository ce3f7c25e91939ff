use std::fmt;
use std::mem;
use std::str::FromStr;

use liveconfig::GeometrySetting;

use crate::engine::{EngineError, RenderEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Sphere,
    Cube,
    Dodecahedron,
    Icosahedron,
    Plane,
    TorusKnot,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 6] = [
        GeometryKind::Sphere,
        GeometryKind::Cube,
        GeometryKind::Dodecahedron,
        GeometryKind::Icosahedron,
        GeometryKind::Plane,
        GeometryKind::TorusKnot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Sphere => "sphere",
            GeometryKind::Cube => "cube",
            GeometryKind::Dodecahedron => "dodecahedron",
            GeometryKind::Icosahedron => "icosahedron",
            GeometryKind::Plane => "plane",
            GeometryKind::TorusKnot => "torus-knot",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sphere" => Ok(GeometryKind::Sphere),
            "cube" | "box" => Ok(GeometryKind::Cube),
            "dodecahedron" => Ok(GeometryKind::Dodecahedron),
            "icosahedron" => Ok(GeometryKind::Icosahedron),
            "plane" => Ok(GeometryKind::Plane),
            "torus-knot" | "torusknot" | "knot" => Ok(GeometryKind::TorusKnot),
            other => Err(format!(
                "unknown geometry '{other}'; expected sphere, cube, dodecahedron, icosahedron, plane or torus-knot"
            )),
        }
    }
}

impl From<GeometrySetting> for GeometryKind {
    fn from(setting: GeometrySetting) -> Self {
        match setting {
            GeometrySetting::Sphere => GeometryKind::Sphere,
            GeometrySetting::Cube => GeometryKind::Cube,
            GeometrySetting::Dodecahedron => GeometryKind::Dodecahedron,
            GeometrySetting::Icosahedron => GeometryKind::Icosahedron,
            GeometrySetting::Plane => GeometryKind::Plane,
            GeometrySetting::TorusKnot => GeometryKind::TorusKnot,
        }
    }
}

impl From<GeometryKind> for GeometrySetting {
    fn from(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Sphere => GeometrySetting::Sphere,
            GeometryKind::Cube => GeometrySetting::Cube,
            GeometryKind::Dodecahedron => GeometrySetting::Dodecahedron,
            GeometryKind::Icosahedron => GeometrySetting::Icosahedron,
            GeometryKind::Plane => GeometrySetting::Plane,
            GeometryKind::TorusKnot => GeometrySetting::TorusKnot,
        }
    }
}

/// Holds the single geometry bound to the visible mesh.
#[derive(Debug)]
pub struct GeometrySlot<G> {
    kind: GeometryKind,
    handle: G,
}

impl<G> GeometrySlot<G> {
    pub fn create<E>(engine: &mut E, kind: GeometryKind) -> Result<Self, EngineError>
    where
        E: RenderEngine<Geometry = G>,
    {
        let handle = engine.create_geometry(kind)?;
        Ok(Self { kind, handle })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn handle(&self) -> &G {
        &self.handle
    }

    /// Builds the new shape first; the previous handle is disposed only once the
    /// replacement exists, so a failed build leaves the slot untouched.
    pub fn replace<E>(&mut self, engine: &mut E, kind: GeometryKind) -> Result<(), EngineError>
    where
        E: RenderEngine<Geometry = G>,
    {
        let fresh = engine.create_geometry(kind)?;
        let previous = mem::replace(&mut self.handle, fresh);
        engine.dispose_geometry(previous);
        self.kind = kind;
        Ok(())
    }

    pub fn into_handle(self) -> G {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeEngine;

    #[test]
    fn parses_names_and_aliases() {
        for kind in GeometryKind::ALL {
            assert_eq!(kind.name().parse::<GeometryKind>().unwrap(), kind);
        }
        assert_eq!("Box".parse::<GeometryKind>().unwrap(), GeometryKind::Cube);
        assert_eq!("knot".parse::<GeometryKind>().unwrap(), GeometryKind::TorusKnot);
        assert!("teapot".parse::<GeometryKind>().is_err());
    }

    #[test]
    fn converts_to_and_from_config_setting() {
        for kind in GeometryKind::ALL {
            assert_eq!(GeometryKind::from(GeometrySetting::from(kind)), kind);
        }
    }

    #[test]
    fn replace_disposes_previous_handle_once() {
        let mut engine = FakeEngine::default();
        let mut slot = GeometrySlot::create(&mut engine, GeometryKind::Icosahedron).unwrap();
        let original = slot.handle().id;

        slot.replace(&mut engine, GeometryKind::Cube).unwrap();

        assert_eq!(slot.kind(), GeometryKind::Cube);
        assert_eq!(engine.disposed_geometries, vec![original]);
        assert_eq!(engine.live_geometries(), 1);
    }

    #[test]
    fn failed_replace_keeps_current_geometry() {
        let mut engine = FakeEngine::default();
        let mut slot = GeometrySlot::create(&mut engine, GeometryKind::Sphere).unwrap();
        engine.fail_geometry = true;

        assert!(slot.replace(&mut engine, GeometryKind::Plane).is_err());
        assert_eq!(slot.kind(), GeometryKind::Sphere);
        assert!(engine.disposed_geometries.is_empty());
    }
}
