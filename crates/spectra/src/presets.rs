//! Built-in vertex/fragment pairs.

use hotswap::ShaderSource;
use renderer::Preset;

pub const DEFAULT_PRESET: &str = "twist";

struct BuiltinPreset {
    name: &'static str,
    summary: &'static str,
    vertex: &'static str,
    fragment: &'static str,
}

const BUILTINS: &[BuiltinPreset] = &[
    BuiltinPreset {
        name: "plain",
        summary: "white with basic lighting",
        vertex: PLAIN_VERTEX,
        fragment: PLAIN_FRAGMENT,
    },
    BuiltinPreset {
        name: "twist",
        summary: "oscillating twist along the Z axis",
        vertex: TWIST_VERTEX,
        fragment: TWIST_FRAGMENT,
    },
    BuiltinPreset {
        name: "pulse",
        summary: "breathing scale with a two-colour blend",
        vertex: PULSE_VERTEX,
        fragment: PULSE_FRAGMENT,
    },
    BuiltinPreset {
        name: "wave",
        summary: "travelling wave displacement, normal colours",
        vertex: WAVE_VERTEX,
        fragment: WAVE_FRAGMENT,
    },
    BuiltinPreset {
        name: "jitter",
        summary: "spiky displacement along normals with rim light",
        vertex: JITTER_VERTEX,
        fragment: JITTER_FRAGMENT,
    },
];

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|preset| preset.name)
}

pub fn summaries() -> impl Iterator<Item = (&'static str, &'static str)> {
    BUILTINS.iter().map(|preset| (preset.name, preset.summary))
}

pub fn find(name: &str) -> Option<Preset> {
    let wanted = name.trim();
    BUILTINS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(wanted))
        .map(to_preset)
}

pub fn all() -> Vec<Preset> {
    BUILTINS.iter().map(to_preset).collect()
}

/// Looks up `name`, reporting the available names when it is unknown.
pub fn require(name: &str) -> anyhow::Result<Preset> {
    find(name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown preset '{name}'; available presets: {}",
            names().collect::<Vec<_>>().join(", ")
        )
    })
}

fn to_preset(preset: &BuiltinPreset) -> Preset {
    Preset::new(
        preset.name,
        ShaderSource::new(preset.vertex, preset.fragment),
    )
}

const PLAIN_VERTEX: &str = "// Welcome to Spectra! Have fun!
uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vNormal = normal;
  vPosition = position;

  gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}";

const PLAIN_FRAGMENT: &str = "varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vec3 lightDir = normalize(vec3(0.0, 0.0, 1.0));
  float brightness = dot(normalize(vNormal), lightDir) * 0.5 + 0.5;

  vec3 color = vec3(1.0, 1.0, 1.0) * brightness;
  gl_FragColor = vec4(color, 1.0);
}";

const TWIST_VERTEX: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vNormal = normal;
  vPosition = position;

  float twistAmount = sin(uTime) * 2.0;
  float angle = position.z * twistAmount;
  float c = cos(angle) / 1.5;
  float s = sin(angle);

  vec3 newPosition = position;
  newPosition.x = position.x * c - position.y * s;
  newPosition.y = position.x * s + position.y * c;

  gl_Position = projectionMatrix * modelViewMatrix * vec4(newPosition, 1.0);
}";

const TWIST_FRAGMENT: &str = "varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vec3 baseColor = vec3(0.2, 0.6, 0.9);

  vec3 lightDir = normalize(vec3(0.5, 0.5, 1.0));
  float brightness = dot(normalize(vNormal), lightDir) * 0.5 + 0.5;

  vec3 color = baseColor * brightness;
  gl_FragColor = vec4(color, 1.0);
}";

const PULSE_VERTEX: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vNormal = normal;
  vPosition = position;

  float pulse = sin(uTime * 2.0) * 0.2 + 1.0;
  vec3 newPosition = position * pulse;

  gl_Position = projectionMatrix * modelViewMatrix * vec4(newPosition, 1.0);
}";

const PULSE_FRAGMENT: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  float pulse = sin(uTime * 2.0) * 0.5 + 0.5;

  vec3 color1 = vec3(0.5, 0.3, 0.8);
  vec3 color2 = vec3(0.2, 0.8, 0.9);
  vec3 color = mix(color1, color2, pulse);

  float brightness = dot(normalize(vNormal), vec3(0.0, 0.0, 1.0)) * 0.3 + 0.7;
  color *= brightness;

  gl_FragColor = vec4(color, 1.0);
}";

const WAVE_VERTEX: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vNormal = normal;
  vPosition = position;

  vec3 newPosition = position;
  float wave = sin(position.x * 2.0 + uTime * log(uTime)) * 0.3;
  newPosition.z += wave;

  gl_Position = projectionMatrix * modelViewMatrix * vec4(newPosition, 1.0);
}";

const WAVE_FRAGMENT: &str = "varying vec3 vNormal;
varying vec3 vPosition;

void main() {
  vec3 color = normalize(vNormal) * 0.5 + 0.5;
  gl_FragColor = vec4(color, 1.0);
}";

const JITTER_VERTEX: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;
varying float vPattern;

void main() {
  vNormal = normal;
  vPosition = position;

  vPattern = sin(position.x * 5.0 + uTime * 2.0) *
             sin(position.y * 5.0 + uTime * 2.0) *
             sin(position.z * 5.0 + uTime * 2.0);
  vec3 newPosition = position + normal * vPattern * 0.3;

  gl_Position = projectionMatrix * modelViewMatrix * vec4(newPosition, 1.0);
}";

const JITTER_FRAGMENT: &str = "uniform float uTime;
varying vec3 vNormal;
varying vec3 vPosition;
varying float vPattern;

void main() {
  vec3 color1 = vec3(0.9, 0.2, 0.4);
  vec3 color2 = vec3(0.4, 0.1, 0.6);
  float mixFactor = vPattern * 0.5 + 0.5;
  vec3 color = mix(color1, color2, mixFactor);

  vec3 lightDir = normalize(vec3(0.5, 0.5, 1.0));
  float brightness = dot(normalize(vNormal), lightDir) * 0.4 + 0.6;

  vec3 viewDir = normalize(vec3(0.0, 0.0, 1.0));
  float rim = 1.0 - max(dot(viewDir, normalize(vNormal)), 0.0);
  rim = pow(rim, 3.0);

  color = color * brightness + vec3(1.0, 0.5, 0.7) * rim * 0.3;

  gl_FragColor = vec4(color, 1.0);
}";
