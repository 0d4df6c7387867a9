//! Class resolution and caching for bytecode analysis.
//!
//! A [`Project`] names the language level and an ordered list of [`InputLocation`]s. Each
//! [`View`] created from it resolves classes on demand (or all at once), caches the built
//! [`ClassDef`]s, and exposes a [`ViewTypeHierarchy`] over them.
//!
//! Concrete input locations and class-file frontends live in `sable-inputs`.

pub mod cache;
pub mod error;
pub mod hierarchy;
pub mod ids;
pub mod input;
pub mod interceptor;
pub mod model;
pub mod project;
pub mod source;
pub mod view;

pub use cache::{Cache, CachePolicy, FullCache, LruClassCache};
pub use error::{BuildError, CacheError, HierarchyError, LocationError, ProjectError, ResolveError};
pub use hierarchy::ViewTypeHierarchy;
pub use ids::{is_descriptor_class, ClassType, IdentifierFactory, ModuleName, JAVA_BASE};
pub use input::{ClassSourceIter, InputLocation, ModuleInputLocation};
pub use interceptor::{no_interceptors, uniform_interceptors, BodyInterceptor, InterceptorSelector};
pub use model::{
    AnnotationUsage, AnnotationValue, Body, ClassDef, ClassKind, ConstValue, ElementValue,
    FieldDef, MethodDef, SourceType,
};
pub use project::{
    Language, LanguageKind, Project, ProjectBuilder, ViewOptions, MODULE_SYSTEM_MIN_VERSION,
};
pub use source::{
    BuildContext, ClassSource, DefaultSourceTypeSpecifier, SourceLoader, SourceTypeSpecifier,
};
pub use view::View;
