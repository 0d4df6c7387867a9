//! Declarative project configuration.
//!
//! A `sable.toml` names the language level, the ordered input locations, the view cache
//! policy and the logging setup:
//!
//! ```toml
//! [language]
//! kind = "java"
//! version = 17
//!
//! [[inputs]]
//! kind = "class_dir"
//! path = "build/classes"
//!
//! [[inputs]]
//! kind = "system_modules"
//!
//! [cache]
//! policy = "lru"
//! capacity = 4096
//! ```

mod diagnostics;
mod logging;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use sable_core::{
    CachePolicy, Language, LanguageKind, LocationError, Project, ProjectBuilder, ProjectError,
    SourceType, ViewOptions,
};
use sable_inputs::{ArchiveLocation, ClassDirLocation, ModuleLocation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use diagnostics::ConfigDiagnostics;
pub use logging::{init_tracing, LoggingConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub language: LanguageConfig,

    /// Input locations in lookup order; earlier entries shadow later ones.
    #[serde(default)]
    pub inputs: Vec<InputConfig>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory relative input paths resolve against. Set by [`ProjectConfig::load_from_path`].
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "LanguageConfig::default_kind")]
    pub kind: LanguageKind,

    /// Java release; ignored for text IR.
    #[serde(default = "LanguageConfig::default_version")]
    pub version: u16,

    /// Use module-qualified identifiers even without a module input.
    #[serde(default)]
    pub modules: bool,
}

impl LanguageConfig {
    fn default_kind() -> LanguageKind {
        LanguageKind::Java
    }

    fn default_version() -> u16 {
        8
    }

    pub fn language(&self) -> Language {
        match self.kind {
            LanguageKind::Java => Language::java(self.version),
            LanguageKind::TextIr => Language::text_ir(),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            kind: Self::default_kind(),
            version: Self::default_version(),
            modules: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    ClassDir,
    Jar,
    TextIr,
    /// An exploded module image (`modules/`).
    Modules,
    /// A JDK home with a `jmods/` directory.
    Jmods,
    /// The platform modules of the JDK found on this machine.
    SystemModules,
}

impl InputKind {
    fn takes_path(self) -> bool {
        !matches!(self, InputKind::SystemModules)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub kind: InputKind,

    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Overrides the location's default classification.
    #[serde(default)]
    pub source_type: Option<SourceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicyKind {
    #[default]
    Full,
    Lru,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicyKind,

    /// Maximum number of cached classes; required for `lru`.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl CacheConfig {
    pub fn cache_policy(&self) -> Result<CachePolicy, ConfigError> {
        match self.policy {
            CachePolicyKind::Full => Ok(CachePolicy::Full),
            CachePolicyKind::Lru => {
                let capacity = self
                    .capacity
                    .and_then(NonZeroUsize::new)
                    .ok_or_else(|| ConfigError::Invalid {
                        toml_path: "cache.capacity".to_owned(),
                        message: "lru cache needs a capacity of at least 1".to_owned(),
                    })?;
                Ok(CachePolicy::Lru { capacity })
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse toml config: {0}")]
    Toml(String),

    #[error("invalid value for `{toml_path}`: {message}")]
    Invalid { toml_path: String, message: String },

    #[error("failed to open input `{toml_path}`: {source}")]
    Location {
        toml_path: String,
        #[source]
        source: LocationError,
    },

    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes a snippet of the input; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ProjectConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let (config, _) = Self::load_from_path_with_diagnostics(path)?;
        Ok(config)
    }

    /// Like [`Self::load_from_path`] but also reports unrecognised keys.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (mut config, diagnostics) = Self::load_from_str_with_diagnostics(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok((config, diagnostics))
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<ProjectConfig>(text)?;
        for key in &unknown_keys {
            tracing::warn!(target: "sable.config", key = %key, "unknown config key");
        }
        Ok((config, ConfigDiagnostics { unknown_keys }))
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// A project builder with every configured input registered in order.
    ///
    /// Module filesystems are opened here, so a bad module root fails before the project is
    /// built.
    pub fn to_builder(&self) -> Result<ProjectBuilder, ConfigError> {
        let mut builder = Project::builder(self.language.language());
        if self.language.modules {
            builder = builder.enable_modules();
        }

        for (idx, input) in self.inputs.iter().enumerate() {
            let toml_path = format!("inputs[{idx}]");
            let path = self.input_path(input, &toml_path)?;

            builder = match (input.kind, path) {
                (InputKind::ClassDir, Some(path)) => {
                    let mut location = ClassDirLocation::new(path);
                    if let Some(source_type) = input.source_type {
                        location = location.with_source_type(source_type);
                    }
                    builder.input_location(location)
                }
                (InputKind::TextIr, Some(path)) => {
                    let mut location = ClassDirLocation::text_ir(path);
                    if let Some(source_type) = input.source_type {
                        location = location.with_source_type(source_type);
                    }
                    builder.input_location(location)
                }
                (InputKind::Jar, Some(path)) => {
                    let mut location = ArchiveLocation::new(path);
                    if let Some(source_type) = input.source_type {
                        location = location.with_source_type(source_type);
                    }
                    builder.input_location(location)
                }
                (InputKind::Modules | InputKind::Jmods, Some(path)) => {
                    let location = ModuleLocation::open(path).map_err(|source| {
                        ConfigError::Location {
                            toml_path: toml_path.clone(),
                            source,
                        }
                    })?;
                    builder.module_input_location(with_source_type(location, input.source_type))
                }
                (InputKind::SystemModules, _) => {
                    let location =
                        ModuleLocation::system().map_err(|source| ConfigError::Location {
                            toml_path: toml_path.clone(),
                            source,
                        })?;
                    builder.module_input_location(with_source_type(location, input.source_type))
                }
                (_, None) => {
                    return Err(ConfigError::Invalid {
                        toml_path: format!("{toml_path}.path"),
                        message: "this input kind needs a path".to_owned(),
                    })
                }
            };
            tracing::debug!(
                target: "sable.config",
                input = %toml_path,
                kind = ?input.kind,
                "registered input location"
            );
        }

        Ok(builder)
    }

    pub fn build_project(&self) -> Result<Project, ConfigError> {
        Ok(self.to_builder()?.build()?)
    }

    pub fn view_options(&self) -> Result<ViewOptions, ConfigError> {
        Ok(ViewOptions {
            cache: self.cache.cache_policy()?,
            ..ViewOptions::default()
        })
    }

    fn input_path(
        &self,
        input: &InputConfig,
        toml_path: &str,
    ) -> Result<Option<PathBuf>, ConfigError> {
        match (&input.path, input.kind.takes_path()) {
            (Some(_), false) => Err(ConfigError::Invalid {
                toml_path: format!("{toml_path}.path"),
                message: "system_modules is discovered and takes no path".to_owned(),
            }),
            (Some(path), true) if path.is_relative() => Ok(Some(match &self.base_dir {
                Some(base) => base.join(path),
                None => path.clone(),
            })),
            (path, _) => Ok(path.clone()),
        }
    }
}

fn with_source_type(location: ModuleLocation, source_type: Option<SourceType>) -> ModuleLocation {
    match source_type {
        Some(source_type) => location.with_source_type(source_type),
        None => location,
    }
}
