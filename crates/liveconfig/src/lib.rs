use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for a live editing session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LiveConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

/// Debounce and validation knobs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(
        default = "default_quiet_period",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub quiet_period: Duration,
    /// Soft budget for a single validation attempt; exceeding it is logged, never enforced.
    #[serde(
        default = "default_validation_budget",
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_budget: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClockConfig {
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_pointer_decay")]
    pub pointer_decay: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub geometry: GeometrySetting,
    #[serde(default = "default_true")]
    pub auto_rotate: bool,
    #[serde(default = "default_rotation_step")]
    pub rotation_step: f32,
    #[serde(default)]
    pub wireframe: bool,
    #[serde(default)]
    pub keep_mesh_on_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(
        default,
        deserialize_with = "deserialize_antialias",
        serialize_with = "serialize_antialias"
    )]
    pub antialias: AntialiasSetting,
    #[serde(default = "default_true")]
    pub vsync: bool,
}

/// Primitive shapes selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometrySetting {
    Sphere,
    #[serde(alias = "box")]
    Cube,
    Dodecahedron,
    #[default]
    Icosahedron,
    Plane,
    #[serde(alias = "knot", alias = "torusknot")]
    TorusKnot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AntialiasSetting {
    #[default]
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.samples() {
            None => f.write_str("auto"),
            Some(1) => f.write_str("off"),
            Some(samples) => write!(f, "{samples}"),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            pipeline: PipelineConfig::default(),
            clock: ClockConfig::default(),
            view: ViewConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quiet_period: default_quiet_period(),
            validation_budget: default_validation_budget(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            speed: default_speed(),
            pointer_decay: default_pointer_decay(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            geometry: GeometrySetting::default(),
            auto_rotate: true,
            rotation_step: default_rotation_step(),
            wireframe: false,
            keep_mesh_on_error: false,
            preset: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            antialias: AntialiasSetting::default(),
            vsync: true,
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_quiet_period() -> Duration {
    Duration::from_millis(500)
}

fn default_validation_budget() -> Option<Duration> {
    Some(Duration::from_secs(2))
}

fn default_time_step() -> f32 {
    0.016
}

fn default_speed() -> f32 {
    1.0
}

fn default_pointer_decay() -> f32 {
    0.95
}

fn default_rotation_step() -> f32 {
    0.01
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_true() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or_else(default_quiet_period))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serialize_duration(duration, serializer),
        None => serializer.serialize_none(),
    }
}

fn deserialize_antialias<'de, D>(deserializer: D) -> Result<AntialiasSetting, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Str(raw) => parse_antialias(&raw).map_err(de::Error::custom),
        Helper::Num(value) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            parse_antialias(&value.to_string()).map_err(de::Error::custom)
        }
    }
}

fn serialize_antialias<S>(value: &AntialiasSetting, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Parses `auto`, `off`, or an MSAA sample count.
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" => Ok(AntialiasSetting::Off),
        other => other
            .parse::<u32>()
            .ok()
            .and_then(AntialiasSetting::from_samples)
            .ok_or_else(|| format!("invalid antialias setting '{other}'")),
    }
}

impl LiveConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: LiveConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.pipeline.quiet_period.is_zero() {
            return Err(ConfigError::Invalid(
                "pipeline.quiet_period must be greater than zero".into(),
            ));
        }

        if let Some(budget) = self.pipeline.validation_budget {
            if budget.is_zero() {
                return Err(ConfigError::Invalid(
                    "pipeline.validation_budget must be greater than zero".into(),
                ));
            }
        }

        if !(self.clock.time_step.is_finite() && self.clock.time_step > 0.0) {
            return Err(ConfigError::Invalid(
                "clock.time_step must be a positive number".into(),
            ));
        }

        // Time has to stay strictly increasing, so a zero or negative multiplier is rejected.
        if !(self.clock.speed.is_finite() && self.clock.speed > 0.0) {
            return Err(ConfigError::Invalid(
                "clock.speed must be a positive number".into(),
            ));
        }

        let decay = self.clock.pointer_decay;
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "clock.pointer_decay must lie strictly between 0 and 1 (got {decay})"
            )));
        }

        if !self.view.rotation_step.is_finite() {
            return Err(ConfigError::Invalid(
                "view.rotation_step must be finite".into(),
            ));
        }

        if let Some(preset) = &self.view.preset {
            if preset.trim().is_empty() {
                return Err(ConfigError::Invalid("view.preset may not be empty".into()));
            }
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window dimensions must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[pipeline]
quiet_period = "250ms"
validation_budget = 3

[clock]
time_step = 0.02
speed = 2.0

[view]
geometry = "torus-knot"
auto_rotate = false
wireframe = true
preset = "pulse"

[window]
width = 800
height = 600
antialias = 4
"#;

    #[test]
    fn parses_sample_config() {
        let config = LiveConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.pipeline.quiet_period, Duration::from_millis(250));
        assert_eq!(
            config.pipeline.validation_budget,
            Some(Duration::from_secs(3))
        );
        assert_eq!(config.clock.speed, 2.0);
        assert!((config.clock.pointer_decay - 0.95).abs() < f32::EPSILON);
        assert_eq!(config.view.geometry, GeometrySetting::TorusKnot);
        assert!(!config.view.auto_rotate);
        assert_eq!(config.view.preset.as_deref(), Some("pulse"));
        assert_eq!(config.window.antialias, AntialiasSetting::Samples4);
        assert!(config.window.vsync);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = LiveConfig::from_toml_str("").expect("defaults");
        assert_eq!(config, LiveConfig::default());
        assert_eq!(config.pipeline.quiet_period, Duration::from_millis(500));
        assert_eq!(config.view.geometry, GeometrySetting::Icosahedron);
    }

    #[test]
    fn geometry_aliases_are_accepted() {
        let config = LiveConfig::from_toml_str("[view]\ngeometry = \"box\"\n").unwrap();
        assert_eq!(config.view.geometry, GeometrySetting::Cube);
        let config = LiveConfig::from_toml_str("[view]\ngeometry = \"knot\"\n").unwrap();
        assert_eq!(config.view.geometry, GeometrySetting::TorusKnot);
    }

    #[test]
    fn rejects_zero_quiet_period() {
        let err = LiveConfig::from_toml_str("[pipeline]\nquiet_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_positive_speed() {
        let err = LiveConfig::from_toml_str("[clock]\nspeed = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_decay_outside_unit_interval() {
        let err = LiveConfig::from_toml_str("[clock]\npointer_decay = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_antialias() {
        let err = LiveConfig::from_toml_str("[window]\nantialias = \"3\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn printed_config_parses_back() {
        let config = LiveConfig::from_toml_str(SAMPLE).unwrap();
        let printed = config.to_toml_string().expect("serialize");
        assert!(printed.contains("quiet_period = \"250ms\""));
        let reparsed = LiveConfig::from_toml_str(&printed).expect("reparse");
        assert_eq!(reparsed, config);
    }
}
