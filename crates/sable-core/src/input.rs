//! The input-location capability shared by every backing store.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::LocationError;
use crate::ids::{ClassType, IdentifierFactory, ModuleName};
use crate::model::SourceType;
use crate::source::ClassSource;

/// A lazily produced stream of class sources. Nothing is built while iterating.
pub type ClassSourceIter<'a> = Box<dyn Iterator<Item = Result<ClassSource, LocationError>> + 'a>;

pub trait InputLocation: Send + Sync + fmt::Debug {
    /// The source for exactly `class_type`, or `Ok(None)` when this location does not have it.
    ///
    /// Errors are reserved for failures of the backing store itself.
    fn class_source(
        &self,
        class_type: &ClassType,
        identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError>;

    /// Every class source reachable from this location.
    fn class_sources(
        &self,
        identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError>;

    fn source_type(&self) -> SourceType {
        SourceType::Application
    }

    /// Short description used in logs and error messages.
    fn describe(&self) -> String;

    fn as_module_location(&self) -> Option<&dyn ModuleInputLocation> {
        None
    }
}

/// A location organised as named module subtrees.
pub trait ModuleInputLocation: InputLocation {
    fn discover_modules(&self) -> Result<BTreeSet<ModuleName>, LocationError>;
}
