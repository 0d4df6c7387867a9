use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::ProjectError;
use crate::ids::IdentifierFactory;
use crate::input::{InputLocation, ModuleInputLocation};
use crate::interceptor::{no_interceptors, InterceptorSelector};
use crate::source::{DefaultSourceTypeSpecifier, SourceTypeSpecifier};
use crate::view::View;

/// First Java feature release with the module system.
pub const MODULE_SYSTEM_MIN_VERSION: u16 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageKind {
    Java,
    TextIr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    pub kind: LanguageKind,
    pub version: u16,
}

impl Language {
    pub fn java(version: u16) -> Self {
        Self {
            kind: LanguageKind::Java,
            version,
        }
    }

    /// The textual IR is unversioned and cannot host module locations.
    pub fn text_ir() -> Self {
        Self {
            kind: LanguageKind::TextIr,
            version: 0,
        }
    }

    pub fn supports_modules(&self) -> bool {
        self.kind == LanguageKind::Java && self.version >= MODULE_SYSTEM_MIN_VERSION
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LanguageKind::Java => write!(f, "Java {}", self.version),
            LanguageKind::TextIr => f.write_str("text IR"),
        }
    }
}

/// Immutable analysis configuration; the factory for [`View`]s.
pub struct Project {
    language: Language,
    input_locations: Vec<Arc<dyn InputLocation>>,
    identifiers: IdentifierFactory,
    source_type_specifier: Arc<dyn SourceTypeSpecifier>,
    module_aware: bool,
}

impl Project {
    pub fn builder(language: Language) -> ProjectBuilder {
        ProjectBuilder::new(language)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Input locations in lookup order.
    pub fn input_locations(&self) -> &[Arc<dyn InputLocation>] {
        &self.input_locations
    }

    pub fn identifier_factory(&self) -> &IdentifierFactory {
        &self.identifiers
    }

    pub fn source_type_specifier(&self) -> &dyn SourceTypeSpecifier {
        self.source_type_specifier.as_ref()
    }

    pub fn is_module_aware(&self) -> bool {
        self.module_aware
    }

    pub fn create_view(self: &Arc<Self>) -> View {
        self.create_view_with(ViewOptions::default())
    }

    pub fn create_view_with_cache(self: &Arc<Self>, cache: CachePolicy) -> View {
        self.create_view_with(ViewOptions {
            cache,
            ..ViewOptions::default()
        })
    }

    pub fn create_view_with_interceptors(self: &Arc<Self>, interceptors: InterceptorSelector) -> View {
        self.create_view_with(ViewOptions {
            interceptors,
            ..ViewOptions::default()
        })
    }

    pub fn create_view_with(self: &Arc<Self>, options: ViewOptions) -> View {
        View::new(self.clone(), options)
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("language", &self.language)
            .field("input_locations", &self.input_locations)
            .field("module_aware", &self.module_aware)
            .finish_non_exhaustive()
    }
}

/// Per-view settings.
#[derive(Clone)]
pub struct ViewOptions {
    pub cache: CachePolicy,
    pub interceptors: InterceptorSelector,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            cache: CachePolicy::Full,
            interceptors: no_interceptors(),
        }
    }
}

impl fmt::Debug for ViewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewOptions")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

pub struct ProjectBuilder {
    language: Language,
    /// Each location with whether it was registered as module-organised.
    input_locations: Vec<(Arc<dyn InputLocation>, bool)>,
    source_type_specifier: Arc<dyn SourceTypeSpecifier>,
    use_modules: bool,
}

impl ProjectBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            input_locations: Vec::new(),
            source_type_specifier: Arc::new(DefaultSourceTypeSpecifier),
            use_modules: false,
        }
    }

    pub fn source_type_specifier(mut self, specifier: impl SourceTypeSpecifier + 'static) -> Self {
        self.source_type_specifier = Arc::new(specifier);
        self
    }

    /// Append a location; earlier locations shadow later ones.
    pub fn input_location(self, location: impl InputLocation + 'static) -> Self {
        self.shared_input_location(Arc::new(location))
    }

    pub fn shared_input_location(mut self, location: Arc<dyn InputLocation>) -> Self {
        self.input_locations.push((location, false));
        self
    }

    /// Append a module-organised location. The project becomes module-aware; the language
    /// version is checked by [`Self::build`].
    pub fn module_input_location(mut self, location: impl ModuleInputLocation + 'static) -> Self {
        self.input_locations.push((Arc::new(location), true));
        self
    }

    /// Resolve with module-qualified identifiers even without a module location.
    pub fn enable_modules(mut self) -> Self {
        self.use_modules = true;
        self
    }

    pub fn build(self) -> Result<Project, ProjectError> {
        let mut module_aware = self.use_modules;
        for (location, registered_as_module) in &self.input_locations {
            if !registered_as_module && location.as_module_location().is_none() {
                continue;
            }
            if !self.language.supports_modules() {
                return Err(ProjectError::ModulesUnsupported {
                    location: location.describe(),
                    language: self.language,
                    required: MODULE_SYSTEM_MIN_VERSION,
                });
            }
            module_aware = true;
        }

        let identifiers = if module_aware {
            IdentifierFactory::module_aware()
        } else {
            IdentifierFactory::plain()
        };

        tracing::debug!(
            target: "sable.project",
            language = %self.language,
            locations = self.input_locations.len(),
            module_aware,
            "built project"
        );

        Ok(Project {
            language: self.language,
            input_locations: self
                .input_locations
                .into_iter()
                .map(|(location, _)| location)
                .collect(),
            identifiers,
            source_type_specifier: self.source_type_specifier,
            module_aware,
        })
    }
}

impl fmt::Debug for ProjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectBuilder")
            .field("language", &self.language)
            .field("input_locations", &self.input_locations)
            .field("use_modules", &self.use_modules)
            .finish_non_exhaustive()
    }
}
