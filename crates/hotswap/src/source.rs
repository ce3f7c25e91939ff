/// Vertex and fragment text as last typed by the user.
///
/// The pair is mutated freely by edits and only ever compiled as a snapshot
/// once the debouncer decides the user has stopped typing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}
