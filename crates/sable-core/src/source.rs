use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;
use crate::ids::{ClassType, IdentifierFactory};
use crate::interceptor::BodyInterceptor;
use crate::model::{ClassDef, SourceType};

/// Everything a frontend needs while materializing one class.
pub struct BuildContext<'a> {
    pub source_type: SourceType,
    pub interceptors: &'a [Arc<dyn BodyInterceptor>],
    pub identifiers: &'a IdentifierFactory,
}

impl BuildContext<'_> {
    /// Run the interceptor pipeline over a freshly constructed body.
    pub fn intercept(
        &self,
        class_type: &ClassType,
        method: &str,
        body: &mut crate::model::Body,
    ) {
        for interceptor in self.interceptors {
            interceptor.intercept(class_type, method, body);
        }
    }
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("source_type", &self.source_type)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// The deferred half of a [`ClassSource`]: reads and parses the class when asked.
pub trait SourceLoader: Send {
    fn load(self: Box<Self>, class_type: &ClassType, ctx: &BuildContext<'_>)
        -> Result<ClassDef, BuildError>;
}

impl<F> SourceLoader for F
where
    F: FnOnce(&ClassType, &BuildContext<'_>) -> Result<ClassDef, BuildError> + Send,
{
    fn load(
        self: Box<Self>,
        class_type: &ClassType,
        ctx: &BuildContext<'_>,
    ) -> Result<ClassDef, BuildError> {
        (*self)(class_type, ctx)
    }
}

/// A located but not yet built class.
pub struct ClassSource {
    class_type: ClassType,
    origin: String,
    location_source_type: SourceType,
    loader: Box<dyn SourceLoader>,
}

impl ClassSource {
    pub fn new(
        class_type: ClassType,
        origin: impl Into<String>,
        location_source_type: SourceType,
        loader: impl SourceLoader + 'static,
    ) -> Self {
        Self {
            class_type,
            origin: origin.into(),
            location_source_type,
            loader: Box::new(loader),
        }
    }

    pub fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The classification the producing location assigns by default.
    pub fn location_source_type(&self) -> SourceType {
        self.location_source_type
    }

    /// Materialize the class.
    ///
    /// The built definition always carries this source's identifier (including its module
    /// qualifier), origin and `ctx.source_type`. A class file declaring a different name than
    /// the one it was located under is rejected.
    pub fn build(self, ctx: &BuildContext<'_>) -> Result<ClassDef, BuildError> {
        let Self {
            class_type,
            origin,
            loader,
            ..
        } = self;

        let mut class = loader.load(&class_type, ctx)?;
        if class.class_type.name() != class_type.name() {
            return Err(BuildError::TypeMismatch {
                origin,
                expected: class_type.name().to_owned(),
                found: class.class_type.name().to_owned(),
            });
        }

        class.class_type = class_type;
        class.source_type = ctx.source_type;
        class.origin = origin;
        Ok(class)
    }
}

impl fmt::Debug for ClassSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSource")
            .field("class_type", &self.class_type)
            .field("origin", &self.origin)
            .field("location_source_type", &self.location_source_type)
            .finish_non_exhaustive()
    }
}

/// Decides whether a class is application code, library code or a phantom.
pub trait SourceTypeSpecifier: Send + Sync {
    fn source_type_for(&self, source: &ClassSource) -> SourceType;
}

/// Uses the classification of the location that produced the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSourceTypeSpecifier;

impl SourceTypeSpecifier for DefaultSourceTypeSpecifier {
    fn source_type_for(&self, source: &ClassSource) -> SourceType {
        source.location_source_type()
    }
}

impl<F> SourceTypeSpecifier for F
where
    F: Fn(&ClassSource) -> SourceType + Send + Sync,
{
    fn source_type_for(&self, source: &ClassSource) -> SourceType {
        self(source)
    }
}
